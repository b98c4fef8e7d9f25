//! Battery status check
//!
//! Implementation based upon https://github.com/dbrgn/pinetime-rtic/blob/master/pinetime-rtic/src/battery.rs
//! and https://wiki.pine64.org/wiki/PineTime.

use embassy_nrf::{gpio::Input, peripherals::P0_12, saadc::Saadc};

/// Snapshot of the battery state
#[derive(Clone, Copy, Debug, PartialEq, Eq, defmt::Format)]
pub struct BatteryInfo {
    pub percent: u8,
    pub charging: bool,
}

/// Battery API
pub struct Battery<'a> {
    /// ADC instance for battery voltage measurement
    adc: Saadc<'a, 1>,
    /// Charge indication pin:
    /// high = battery, low = charging
    pin_charge_indication: Input<'a, P0_12>,
    /// Last reported state
    info: Option<BatteryInfo>,
}

impl<'a> Battery<'a> {
    /// Configure battery settings on boot
    pub fn init(adc: Saadc<'a, 1>, charge_pin: Input<'a, P0_12>) -> Self {
        Self {
            adc,
            pin_charge_indication: charge_pin,
            info: None,
        }
    }

    /// Carging state of the battery
    pub fn is_charging(&self) -> bool {
        self.pin_charge_indication.is_low()
    }

    /// Battery capacity in percent
    pub async fn get_percent(&mut self) -> u8 {
        percent_from_millivolts(self.get_voltage().await)
    }

    /// Read the hardware, returns the new state if it differs from the last one.
    pub async fn update(&mut self) -> Option<BatteryInfo> {
        let info = BatteryInfo {
            percent: self.get_percent().await,
            charging: self.is_charging(),
        };
        if self.info == Some(info) {
            return None;
        }
        self.info = Some(info);
        Some(info)
    }

    /// Battery voltage in millivolts
    async fn get_voltage(&mut self) -> u16 {
        let mut buf = [0; 1];
        self.adc.sample(&mut buf).await;
        // For detailed explanation of formula check https://wiki.pine64.org/wiki/PineTime
        // Use u32 during calculation to prevent overflow
        (buf[0].max(0) as u32 * 2000 / 1241) as u16
    }
}

/// Use fixed data points and linear interpolation in between
/// to estimate battery capacity.
pub fn percent_from_millivolts(voltage: u16) -> u8 {
    (match voltage {
        0..=3449 => 0,
        3450..=3699 => (voltage - 3450) / 5,
        3700..=4199 => 50 + (voltage - 3700) / 10,
        _ => 100,
    }) as u8
}
