//! Control the vibration motor
//!
//! Implementation based upon https://github.com/tstellanova/cst816s/blob/master/examples/touchpad.rs
//! and https://wiki.pine64.org/wiki/PineTime.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_nrf::{gpio::Output, peripherals::P0_16};
use embassy_time::Timer;

/// Controller for the internal vibration motor
pub struct VibrationMotor<'a> {
    /// Pin P0.16: High = off, Low = on
    control_pin: Output<'a, P0_16>,
    /// Mirrors the motor state for the accelerometer
    running: &'a AtomicBool,
}

impl<'a> VibrationMotor<'a> {
    /// Initialize vibration controller
    pub fn init(control_pin: Output<'a, P0_16>, running: &'a AtomicBool) -> Self {
        let mut motor = Self {
            control_pin,
            running,
        };
        motor.off();
        motor
    }

    /// Pulse the vibration motor once for the specified time in ms.
    ///
    /// The default pulse duration is 100ms.
    pub async fn pulse_once(&mut self, duration_ms: Option<u32>) {
        self.on();
        wait(duration_ms).await;
        self.off();
    }

    /// Pulse the vibration motor a specified amount of times for
    /// the specified time in ms.
    ///
    /// The default pulse duration is 100ms.
    pub async fn pulse_times(&mut self, duration_ms: Option<u32>, times: u8) {
        for _ in 0..times {
            self.pulse_once(duration_ms).await;
            wait(duration_ms).await;
        }
    }

    fn on(&mut self) {
        self.running.store(true, Ordering::Relaxed);
        self.control_pin.set_low();
    }

    fn off(&mut self) {
        self.control_pin.set_high();
        self.running.store(false, Ordering::Relaxed);
    }
}

async fn wait(duration_ms: Option<u32>) {
    Timer::after_millis(u64::from(duration_ms.unwrap_or(100))).await;
}
