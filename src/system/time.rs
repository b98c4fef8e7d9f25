//! Time keeping module for PineTime

use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, NaiveDateTime};
use embassy_time::Instant;

/// Length of a Current Time Service value
pub const CTS_LEN: usize = 10;

/// Wall clock time pinned to a system instant
#[derive(Clone, Copy)]
pub struct TimeReference {
    /// Clock time
    time: NaiveDateTime,
    /// Related system time
    instant: Instant,
}

impl TimeReference {
    /// Create new time reference from NaiveDateTime
    pub fn from_datetime(time: NaiveDateTime) -> Self {
        Self {
            time,
            instant: Instant::now(),
        }
    }

    /// Reference from seconds since the unix epoch, `None` when out of range
    pub fn from_timestamp(secs: i64) -> Option<Self> {
        DateTime::from_timestamp(secs, 0).map(|utc| Self::from_datetime(utc.naive_utc()))
    }

    /// Create new time reference from Current Time Service data.
    ///
    /// Layout: year (u16 LE), month, day, hours, minutes, seconds, day of week,
    /// fractions of 1/256 s, adjust reason. Returns `None` for impossible dates.
    pub fn from_cts_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < CTS_LEN - 1 {
            return None;
        }
        let year = i32::from(u16::from_le_bytes([bytes[0], bytes[1]]));
        let milli = u32::from(bytes[8]) * 1000 / 256;

        let time = NaiveDate::from_ymd_opt(year, bytes[2].into(), bytes[3].into())?
            .and_hms_milli_opt(bytes[4].into(), bytes[5].into(), bytes[6].into(), milli)?;
        Some(Self::from_datetime(time))
    }
}

pub struct TimeManager {
    reference: TimeReference,
}

impl TimeManager {
    /// Initialize time measurement on boot
    pub fn init(reference: TimeReference) -> Self {
        Self { reference }
    }

    /// Get current time
    pub fn get_time(&self) -> NaiveDateTime {
        let elapsed = Instant::now().duration_since(self.reference.instant);
        self.reference.time + ChronoDuration::microseconds(elapsed.as_micros() as i64)
    }

    /// Update time reference
    pub fn set_time(&mut self, reference: TimeReference) {
        defmt::info!("clock set");
        self.reference = reference;
    }
}
