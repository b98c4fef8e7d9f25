//! SPI NOR flash module
//!
//! XT25F32 on the shared SPI bus. Only the first sector is used, it holds the settings record.

use crazy_eyes::settings::{Settings, SETTINGS_RECORD_LEN};
use embassy_time::Timer;
use embedded_hal::spi::{Operation, SpiDevice};

const CMD_PAGE_PROGRAM: u8 = 0x02;
const CMD_READ: u8 = 0x03;
const CMD_READ_STATUS: u8 = 0x05;
const CMD_WRITE_ENABLE: u8 = 0x06;
const CMD_SECTOR_ERASE: u8 = 0x20;
const CMD_WAKE: u8 = 0xab;

/// Write in progress
const STATUS_WIP: u8 = 0x01;

const SETTINGS_ADDRESS: u32 = 0x0000_0000;

#[derive(Debug, defmt::Format)]
pub enum Error {
    Spi,
}

fn bus<T, E>(result: Result<T, E>) -> Result<T, Error> {
    result.map_err(|_| Error::Spi)
}

pub struct Flash<SPI> {
    spi: SPI,
}

impl<SPI> Flash<SPI>
where
    SPI: SpiDevice,
{
    /// Wake the chip from deep power down
    pub async fn init(spi: SPI) -> Result<Self, Error> {
        let mut flash = Self { spi };
        flash.wake().await?;
        Ok(flash)
    }

    /// Wake from deep power down state
    pub async fn wake(&mut self) -> Result<(), Error> {
        bus(self.spi.write(&[CMD_WAKE]))?;
        Timer::after_micros(20).await;
        Ok(())
    }

    pub fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<(), Error> {
        let [_, a2, a1, a0] = address.to_be_bytes();
        bus(self.spi.transaction(&mut [
            Operation::Write(&[CMD_READ, a2, a1, a0]),
            Operation::Read(buf),
        ]))
    }

    /// Erase the 4 KiB sector containing `address`
    pub async fn erase_sector(&mut self, address: u32) -> Result<(), Error> {
        let [_, a2, a1, a0] = address.to_be_bytes();
        bus(self.spi.write(&[CMD_WRITE_ENABLE]))?;
        bus(self.spi.write(&[CMD_SECTOR_ERASE, a2, a1, a0]))?;
        self.wait_idle().await
    }

    /// Program up to one page. The data must not cross a page boundary.
    pub async fn program(&mut self, address: u32, data: &[u8]) -> Result<(), Error> {
        let [_, a2, a1, a0] = address.to_be_bytes();
        bus(self.spi.write(&[CMD_WRITE_ENABLE]))?;
        bus(self.spi.transaction(&mut [
            Operation::Write(&[CMD_PAGE_PROGRAM, a2, a1, a0]),
            Operation::Write(data),
        ]))?;
        self.wait_idle().await
    }

    async fn wait_idle(&mut self) -> Result<(), Error> {
        loop {
            let mut status = [0u8; 1];
            bus(self.spi.transaction(&mut [
                Operation::Write(&[CMD_READ_STATUS]),
                Operation::Read(&mut status),
            ]))?;
            if status[0] & STATUS_WIP == 0 {
                return Ok(());
            }
            Timer::after_micros(500).await;
        }
    }

    /// Stored settings, or the defaults if nothing valid was stored.
    pub fn load_settings(&mut self) -> Settings {
        let mut record = [0u8; SETTINGS_RECORD_LEN];
        match self.read(SETTINGS_ADDRESS, &mut record) {
            Ok(()) => Settings::load(&record),
            Err(_) => {
                defmt::warn!("flash read failed, using default settings");
                Settings::default()
            }
        }
    }

    pub async fn store_settings(&mut self, settings: &Settings) -> Result<(), Error> {
        self.erase_sector(SETTINGS_ADDRESS).await?;
        self.program(SETTINGS_ADDRESS, &settings.to_record()).await?;
        defmt::info!("settings written to flash");
        Ok(())
    }
}
