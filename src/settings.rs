//! User settings, their configuration keys and their persisted form

use heapless::Vec;

/// Highest accepted angryness, also the level that hands the eyebrows over to the battery
pub const ANGRYNESS_MAX: u8 = 11;

/// Mood level of the eyebrows.
///
/// Levels 0..=10 give a fixed slant, level 11 derives it from the battery charge. Values
/// outside 0..=11 are clamped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Angryness(u8);

impl Angryness {
    pub const BATTERY: Self = Self(ANGRYNESS_MAX);

    pub fn new(level: i32) -> Self {
        let clamped = level.clamp(0, ANGRYNESS_MAX as i32);
        if clamped != level {
            warn!("angryness {} out of range, using {}", level, clamped);
        }
        Self(clamped as u8)
    }

    pub fn level(self) -> u8 {
        self.0
    }

    pub fn follows_battery(self) -> bool {
        self == Self::BATTERY
    }

    /// Slant of the outer eyebrow ends in pixels, positive raises them.
    pub fn charge_diff(self, battery_percent: u8) -> i32 {
        if self.follows_battery() {
            i32::from(battery_percent.min(100)) / 5 - 10
        } else {
            i32::from(self.0) * 2 - 10
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    pub show_eyebrows: bool,
    pub show_mouth: bool,
    /// Skew the eyebrows while bluetooth is disconnected
    pub bluetooth_alert: bool,
    pub vibrate_on_disconnect: bool,
    /// Blink once every minute
    pub minute_blink: bool,
    pub week_starts_monday: bool,
    /// Calm face while on the charger
    pub nightstand_mode: bool,
    /// Taps toggle googly eyes
    pub googly_eyes: bool,
    pub angryness: Angryness,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            show_eyebrows: true,
            show_mouth: true,
            bluetooth_alert: true,
            vibrate_on_disconnect: true,
            minute_blink: true,
            week_starts_monday: false,
            nightstand_mode: false,
            googly_eyes: true,
            angryness: Angryness::BATTERY,
        }
    }
}

/// Keys of the configuration channel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ConfigKey {
    Eyebrows = 0,
    Bluetooth = 1,
    Blinking = 2,
    Googly = 3,
    Nightstand = 4,
    Mouth = 5,
    Vibrate = 6,
    Angryness = 7,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 8] = [
        ConfigKey::Eyebrows,
        ConfigKey::Bluetooth,
        ConfigKey::Blinking,
        ConfigKey::Googly,
        ConfigKey::Nightstand,
        ConfigKey::Mouth,
        ConfigKey::Vibrate,
        ConfigKey::Angryness,
    ];

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(usize::from(id)).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            ConfigKey::Eyebrows => "eyebrows",
            ConfigKey::Bluetooth => "bluetooth",
            ConfigKey::Blinking => "blinking",
            ConfigKey::Googly => "googly",
            ConfigKey::Nightstand => "nightstand",
            ConfigKey::Mouth => "mouth",
            ConfigKey::Vibrate => "vibrate",
            ConfigKey::Angryness => "angryness",
        }
    }
}

/// A partial settings change. Keys that are absent keep their current value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigUpdate {
    entries: Vec<(ConfigKey, i32), 8>,
}

impl ConfigUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, replacing an earlier value for the same key.
    pub fn set(&mut self, key: ConfigKey, value: i32) -> &mut Self {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            // One slot per key, never full
            None => {
                let _ = self.entries.push((key, value));
            }
        }
        self
    }

    /// Decode the `(key id, signed value)` byte pairs sent over the configuration channel.
    ///
    /// Unknown key ids and a dangling last byte are skipped.
    pub fn parse(bytes: &[u8]) -> Self {
        let mut update = Self::new();
        for pair in bytes.chunks_exact(2) {
            match ConfigKey::from_id(pair[0]) {
                Some(key) => {
                    update.set(key, i32::from(pair[1] as i8));
                }
                None => debug!("ignoring unknown config key {}", pair[0]),
            }
        }
        update
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ConfigKey, i32)> + '_ {
        self.entries.iter().copied()
    }
}

impl Settings {
    /// Apply a partial update, returns whether any key was accepted.
    pub fn apply(&mut self, update: &ConfigUpdate) -> bool {
        for (key, value) in update.iter() {
            debug!("config {} = {}", key.name(), value);
            let enabled = value != 0;
            match key {
                ConfigKey::Eyebrows => self.show_eyebrows = enabled,
                ConfigKey::Bluetooth => self.bluetooth_alert = enabled,
                ConfigKey::Blinking => self.minute_blink = enabled,
                ConfigKey::Googly => self.googly_eyes = enabled,
                ConfigKey::Nightstand => self.nightstand_mode = enabled,
                ConfigKey::Mouth => self.show_mouth = enabled,
                ConfigKey::Vibrate => self.vibrate_on_disconnect = enabled,
                ConfigKey::Angryness => self.angryness = Angryness::new(value),
            }
        }
        !update.is_empty()
    }
}

// ====================================
// Persisted record
// ====================================

/// Size of the persisted settings record
pub const SETTINGS_RECORD_LEN: usize = 6;

const RECORD_MAGIC: u8 = 0xce;
const RECORD_VERSION: u8 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    TooShort,
    /// Nothing was ever written, or something else owns the storage
    BadMagic,
    UnsupportedVersion(u8),
    Checksum,
}

impl Settings {
    fn flags(&self) -> [bool; 8] {
        [
            self.show_eyebrows,
            self.show_mouth,
            self.bluetooth_alert,
            self.vibrate_on_disconnect,
            self.minute_blink,
            self.week_starts_monday,
            self.nightstand_mode,
            self.googly_eyes,
        ]
    }

    /// Fixed layout record: magic, version, flag bits, angryness, reserved, checksum.
    pub fn to_record(&self) -> [u8; SETTINGS_RECORD_LEN] {
        let flags = self
            .flags()
            .iter()
            .enumerate()
            .fold(0u8, |bits, (i, &set)| bits | (u8::from(set) << i));
        let mut record = [
            RECORD_MAGIC,
            RECORD_VERSION,
            flags,
            self.angryness.level(),
            0,
            0,
        ];
        record[SETTINGS_RECORD_LEN - 1] = checksum(&record[..SETTINGS_RECORD_LEN - 1]);
        record
    }

    pub fn from_record(record: &[u8]) -> Result<Self, Error> {
        if record.len() < SETTINGS_RECORD_LEN {
            return Err(Error::TooShort);
        }
        let record = &record[..SETTINGS_RECORD_LEN];
        if record[0] != RECORD_MAGIC {
            return Err(Error::BadMagic);
        }
        if record[1] != RECORD_VERSION {
            return Err(Error::UnsupportedVersion(record[1]));
        }
        if checksum(&record[..SETTINGS_RECORD_LEN - 1]) != record[SETTINGS_RECORD_LEN - 1] {
            return Err(Error::Checksum);
        }

        let bit = |i: u8| record[2] & (1 << i) != 0;
        Ok(Self {
            show_eyebrows: bit(0),
            show_mouth: bit(1),
            bluetooth_alert: bit(2),
            vibrate_on_disconnect: bit(3),
            minute_blink: bit(4),
            week_starts_monday: bit(5),
            nightstand_mode: bit(6),
            googly_eyes: bit(7),
            angryness: Angryness::new(i32::from(record[3])),
        })
    }

    /// Settings from storage, or the defaults when the record is missing or damaged.
    pub fn load(record: &[u8]) -> Self {
        match Self::from_record(record) {
            Ok(settings) => {
                info!("settings loaded");
                settings
            }
            Err(e) => {
                warn!("no usable settings record ({}), using defaults", e);
                Self::default()
            }
        }
    }
}

fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, b| sum.wrapping_add(*b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charge_diff_follows_level_or_battery() {
        assert_eq!(Angryness::new(0).charge_diff(80), -10);
        assert_eq!(Angryness::new(5).charge_diff(80), 0);
        assert_eq!(Angryness::new(10).charge_diff(80), 10);
        assert_eq!(Angryness::BATTERY.charge_diff(50), 0);
        assert_eq!(Angryness::BATTERY.charge_diff(100), 10);
        assert_eq!(Angryness::BATTERY.charge_diff(0), -10);
        assert_eq!(Angryness::BATTERY.charge_diff(250), 10);
    }

    #[test]
    fn angryness_is_clamped() {
        assert_eq!(Angryness::new(-4).level(), 0);
        assert_eq!(Angryness::new(40), Angryness::BATTERY);
    }

    #[test]
    fn partial_update_leaves_other_keys_alone() {
        let mut settings = Settings::default();
        let mut update = ConfigUpdate::new();
        update.set(ConfigKey::Mouth, 0).set(ConfigKey::Angryness, 3);

        assert!(settings.apply(&update));
        assert!(!settings.show_mouth);
        assert_eq!(settings.angryness.level(), 3);
        assert_eq!(
            settings,
            Settings {
                show_mouth: false,
                angryness: Angryness::new(3),
                ..Settings::default()
            }
        );
    }

    #[test]
    fn empty_update_is_not_accepted() {
        let mut settings = Settings::default();
        assert!(!settings.apply(&ConfigUpdate::new()));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn parse_skips_unknown_keys_and_dangling_byte() {
        let update = ConfigUpdate::parse(&[2, 0, 42, 1, 7, 9, 3]);
        let entries: Vec<(ConfigKey, i32), 8> = update.iter().collect();
        assert_eq!(
            entries.as_slice(),
            &[(ConfigKey::Blinking, 0), (ConfigKey::Angryness, 9)]
        );
    }

    #[test]
    fn parse_keeps_last_value_of_repeated_key() {
        let update = ConfigUpdate::parse(&[0, 1, 0, 0, 7, 0xff]);
        let entries: Vec<(ConfigKey, i32), 8> = update.iter().collect();
        assert_eq!(
            entries.as_slice(),
            &[(ConfigKey::Eyebrows, 0), (ConfigKey::Angryness, -1)]
        );

        let mut settings = Settings::default();
        settings.apply(&update);
        assert!(!settings.show_eyebrows);
        assert_eq!(settings.angryness.level(), 0);
    }

    #[test]
    fn record_keeps_every_field() {
        let settings = Settings {
            show_eyebrows: false,
            week_starts_monday: true,
            nightstand_mode: true,
            angryness: Angryness::new(7),
            ..Settings::default()
        };
        let record = settings.to_record();
        assert_eq!(record[0], RECORD_MAGIC);
        assert_eq!(record[2], 0b1111_1110);
        assert_eq!(Settings::from_record(&record), Ok(settings));
    }

    #[test]
    fn damaged_records_fall_back_to_defaults() {
        let erased = [0xff; SETTINGS_RECORD_LEN];
        assert_eq!(Settings::from_record(&erased), Err(Error::BadMagic));
        assert_eq!(Settings::load(&erased), Settings::default());

        let mut flipped = Settings::default().to_record();
        flipped[2] ^= 0b0000_0100;
        assert_eq!(Settings::from_record(&flipped), Err(Error::Checksum));

        let mut future = Settings::default().to_record();
        future[1] = 9;
        assert_eq!(
            Settings::from_record(&future),
            Err(Error::UnsupportedVersion(9))
        );

        assert_eq!(Settings::from_record(&[RECORD_MAGIC]), Err(Error::TooShort));
    }
}
