//! Accelerometer module for PineTime
//!
//! Minimal BMA421 driver: raw acceleration only, no step counter or feature engine.

use core::sync::atomic::{AtomicBool, Ordering};

use crazy_eyes::status::{AccelSample, Accelerometer};
use embedded_hal::i2c::I2c;

pub const BMA421_ADDRESS: u8 = 0x18;

const REG_CHIP_ID: u8 = 0x00;
const REG_ACC_X_LSB: u8 = 0x12;
const REG_ACC_CONF: u8 = 0x40;
const REG_ACC_RANGE: u8 = 0x41;
const REG_PWR_CONF: u8 = 0x7c;
const REG_PWR_CTRL: u8 = 0x7d;

const CHIP_ID_EXPECTED: u8 = 0x11;

// 100 Hz, averaging over 4 samples, continuous filter mode
const ACC_CONF_100HZ: u8 = 0xa8;
const ACC_RANGE_2G: u8 = 0x00;
const PWR_CTRL_ACC_EN: u8 = 0x04;

// 12 bit samples over +-2 g
const LSB_PER_G: i32 = 1024;

#[derive(Debug)]
pub enum Error<E> {
    I2c(E),
    InvalidChipId(u8),
}

impl<E> From<E> for Error<E> {
    fn from(value: E) -> Self {
        Self::I2c(value)
    }
}

impl<E> defmt::Format for Error<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::I2c(_) => defmt::write!(f, "i2c bus error"),
            Error::InvalidChipId(id) => defmt::write!(f, "unexpected chip id {=u8:#x}", id),
        }
    }
}

pub struct Bma421<'a, I> {
    i2c: I,
    /// Raised while the vibration motor runs
    vibrating: &'a AtomicBool,
}

impl<'a, I, E> Bma421<'a, I>
where
    I: I2c<Error = E>,
{
    pub fn new(i2c: I, vibrating: &'a AtomicBool) -> Self {
        Self { i2c, vibrating }
    }

    /// Check the chip id and start continuous sampling.
    pub fn init(&mut self) -> Result<(), Error<E>> {
        let mut id = [0u8; 1];
        self.i2c
            .write_read(BMA421_ADDRESS, &[REG_CHIP_ID], &mut id)?;
        if id[0] != CHIP_ID_EXPECTED {
            return Err(Error::InvalidChipId(id[0]));
        }

        // Advanced power save off, otherwise register writes get lost
        self.i2c.write(BMA421_ADDRESS, &[REG_PWR_CONF, 0x00])?;
        self.i2c
            .write(BMA421_ADDRESS, &[REG_ACC_CONF, ACC_CONF_100HZ])?;
        self.i2c
            .write(BMA421_ADDRESS, &[REG_ACC_RANGE, ACC_RANGE_2G])?;
        self.i2c
            .write(BMA421_ADDRESS, &[REG_PWR_CTRL, PWR_CTRL_ACC_EN])?;

        defmt::info!("BMA421 ready");
        Ok(())
    }

    /// Acceleration in milli-g as (x, y, z)
    pub fn read_milli_g(&mut self) -> Result<(i16, i16, i16), Error<E>> {
        let mut data = [0u8; 6];
        self.i2c
            .write_read(BMA421_ADDRESS, &[REG_ACC_X_LSB], &mut data)?;

        // Left aligned 12 bit values
        let axis = |lsb: u8, msb: u8| {
            let raw = i32::from(i16::from_le_bytes([lsb, msb]) >> 4);
            (raw * 1000 / LSB_PER_G) as i16
        };
        Ok((
            axis(data[0], data[1]),
            axis(data[2], data[3]),
            axis(data[4], data[5]),
        ))
    }
}

impl<I, E> Accelerometer for Bma421<'_, I>
where
    I: I2c<Error = E>,
{
    type Error = Error<E>;

    fn sample(&mut self) -> Result<AccelSample, Self::Error> {
        // The motor may switch on during the read
        let did_vibrate = self.vibrating.load(Ordering::Relaxed);
        let (x, y, z) = self.read_milli_g()?;
        Ok(AccelSample {
            x,
            y,
            z,
            did_vibrate: did_vibrate || self.vibrating.load(Ordering::Relaxed),
        })
    }
}
