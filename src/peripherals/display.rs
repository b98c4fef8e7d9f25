//! Display control module for PineTime

use embassy_embedded_hal::shared_bus::blocking::spi::SpiDevice;
use embassy_nrf::{
    gpio::Output,
    peripherals::{P0_14, P0_18, P0_22, P0_23, P0_25, P0_26, SPI2},
    spim::Spim,
};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_time::Delay;

use crazy_eyes::face::Frame;
use display_interface_spi::SPIInterfaceNoCS;
use embedded_graphics::prelude::*;
use mipidsi::{models::ST7789, Builder, Orientation};

const LCD_W: u16 = 240;
const LCD_H: u16 = 240;

/// LCD on the SPI bus shared with the flash, chip select P0.25
pub type LcdSpi = SpiDevice<'static, NoopRawMutex, Spim<'static, SPI2>, Output<'static, P0_25>>;

type Lcd = mipidsi::Display<SPIInterfaceNoCS<LcdSpi, Output<'static, P0_18>>, ST7789, Output<'static, P0_26>>;

/// Active-low backlight pins. Combinations give 7 brightness levels.
pub struct BacklightPins<'a> {
    low: Output<'a, P0_14>,
    mid: Output<'a, P0_22>,
    high: Output<'a, P0_23>,
}

impl<'a> BacklightPins<'a> {
    /// Configure backlight pins on boot
    pub fn init(low: Output<'a, P0_14>, mid: Output<'a, P0_22>, high: Output<'a, P0_23>) -> Self {
        Self { low, mid, high }
    }

    /// Set the brightness level between 0 (off) and 7 (max brightness).
    pub fn set(&mut self, level: u8) {
        let level = level.min(7);
        defmt::debug!("Setting backlight brightness to {}", level);
        self.low.set_level((level & 0x01 == 0).into());
        self.mid.set_level((level & 0x02 == 0).into());
        self.high.set_level((level & 0x04 == 0).into());
    }
}

#[derive(Debug, defmt::Format)]
pub enum Error {
    /// The controller did not accept the init sequence
    Init,
    /// Writing pixels failed
    Bus,
}

pub struct Display {
    lcd: Lcd,
    backlight: BacklightPins<'static>,
}

impl Display {
    /// Configure display settings on boot
    pub fn init(
        spi: LcdSpi,
        dc_pin: Output<'static, P0_18>,
        rst_pin: Output<'static, P0_26>,
        mut backlight: BacklightPins<'static>,
        brightness: u8,
    ) -> Result<Self, Error> {
        let lcd = Builder::st7789(SPIInterfaceNoCS::new(spi, dc_pin))
            .with_display_size(LCD_W, LCD_H)
            .with_orientation(Orientation::Portrait(false))
            .init(&mut Delay, Some(rst_pin))
            .map_err(|_| Error::Init)?;
        backlight.set(brightness);
        Ok(Self { lcd, backlight })
    }

    /// Paint a whole face frame.
    pub fn show(&mut self, frame: &Frame) -> Result<(), Error> {
        frame.draw(&mut self.lcd).map_err(|_| Error::Bus)
    }

    pub fn set_brightness(&mut self, level: u8) {
        self.backlight.set(level);
    }
}
