//! Animation state of the face
//!
//! Each animation is a small state machine advanced by [`tick`](blink::Blink::tick)-style
//! transition functions that return the next state together with a [`Schedule`]. The
//! functions never touch a timer: whoever runs the event loop decides how to re-arm.

pub mod background;
pub mod blink;
pub mod googly;

pub use self::background::BackgroundCycle;
pub use self::blink::{Blink, BlinkPhase};
pub use self::googly::Googly;

use crate::device::DeviceProfile;

/// Period of the blink and googly timers
pub const FRAME_INTERVAL_MS: u64 = 33;

/// What the owner of the timer should do after a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Schedule {
    /// Fire again after [`FRAME_INTERVAL_MS`]
    Rearm,
    /// The animation is finished, let the timer lapse
    Stop,
}

impl Schedule {
    pub fn is_rearm(self) -> bool {
        self == Schedule::Rearm
    }
}

/// All animation state the renderer needs besides time, settings and status.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AnimationState {
    pub blink: Blink,
    pub googly: Googly,
    pub background: BackgroundCycle,
}

impl AnimationState {
    /// Eyes open, pupils telling the time.
    pub fn new(eye_radius: i32, supports_color: bool) -> Self {
        Self {
            blink: Blink::new(eye_radius),
            googly: Googly::default(),
            background: BackgroundCycle::new(supports_color),
        }
    }

    pub fn for_profile(profile: &DeviceProfile) -> Self {
        Self {
            blink: Blink::with_step(profile.layout.eye_radius, profile.layout.blink_step),
            ..Self::new(profile.layout.eye_radius, profile.supports_color)
        }
    }
}
