//! Crazy eyes watch face
//!
//! Two eyes tell the time: the left pupil points at the hour, the right one at the minute.
//! The eyes blink every minute, roll with gravity after a tap, and the brows and mouth show
//! mood, battery, bluetooth and the day of the month.
//!
//! The crate is hardware independent. [`app::AppContext`] takes events and timer expiries
//! and produces [`face::Frame`]s that draw on any `embedded-graphics` target.

#![cfg_attr(not(test), no_std)]

// Must come first so the logging macros are visible to the other modules.
#[macro_use]
mod fmt;

pub mod animation;
pub mod app;
pub mod device;
pub mod face;
pub mod geometry;
pub mod settings;
pub mod status;

pub use app::{AppContext, Effects, Event, Timer};
pub use device::{DeviceProfile, FaceLayout};
pub use settings::Settings;
pub use status::{AccelSample, RuntimeStatus};
