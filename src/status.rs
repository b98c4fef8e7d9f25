//! Runtime status fed to the face: battery, bluetooth and accelerometer samples

/// Latest battery and connection state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RuntimeStatus {
    /// Battery charge, 0..=100
    pub battery_percent: u8,
    /// Watch sits on the charger
    pub charging: bool,
    pub bluetooth_connected: bool,
}

impl Default for RuntimeStatus {
    fn default() -> Self {
        Self {
            battery_percent: 100,
            charging: false,
            bluetooth_connected: false,
        }
    }
}

/// One accelerometer reading in milli-g, in the plane of the display: x to the right,
/// y toward 12 o'clock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AccelSample {
    pub x: i16,
    pub y: i16,
    pub z: i16,
    /// The vibration motor was running while the sample was taken
    pub did_vibrate: bool,
}

/// Source of accelerometer samples
pub trait Accelerometer {
    type Error;

    fn sample(&mut self) -> Result<AccelSample, Self::Error>;
}

pub const TAP_THRESHOLD_MG: i32 = 1200;
pub const TAP_COOLDOWN_SAMPLES: u8 = 10;

/// Detects taps as sharp jumps between consecutive samples.
#[derive(Clone, Copy, Debug)]
pub struct TapDetector {
    last: Option<AccelSample>,
    threshold: i32,
    cooldown: u8,
    remaining: u8,
}

impl Default for TapDetector {
    fn default() -> Self {
        Self::new(TAP_THRESHOLD_MG, TAP_COOLDOWN_SAMPLES)
    }
}

impl TapDetector {
    pub fn new(threshold: i32, cooldown: u8) -> Self {
        Self {
            last: None,
            threshold,
            cooldown,
            remaining: 0,
        }
    }

    /// Feed the next sample, returns `true` when it completes a tap.
    pub fn update(&mut self, sample: AccelSample) -> bool {
        let previous = self.last.replace(sample);
        self.remaining = self.remaining.saturating_sub(1);

        let Some(previous) = previous else {
            return false;
        };
        if sample.did_vibrate || previous.did_vibrate || self.remaining > 0 {
            return false;
        }

        let jerk = (i32::from(sample.x) - i32::from(previous.x)).abs()
            + (i32::from(sample.y) - i32::from(previous.y)).abs()
            + (i32::from(sample.z) - i32::from(previous.z)).abs();
        if jerk > self.threshold {
            self.remaining = self.cooldown;
            true
        } else {
            false
        }
    }
}
