//! Eyelid sweep

use super::Schedule;

/// Default lid travel per frame
pub const BLINK_STEP: i32 = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BlinkPhase {
    Idle,
    ClosingDown,
    OpeningUp,
}

/// Lid position and direction.
///
/// `offset` runs from 0 (lid above the eye) to twice the eye radius (eye covered).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Blink {
    phase: BlinkPhase,
    offset: i32,
    max_offset: i32,
    step: i32,
}

impl Blink {
    pub fn new(eye_radius: i32) -> Self {
        Self::with_step(eye_radius, BLINK_STEP)
    }

    pub fn with_step(eye_radius: i32, step: i32) -> Self {
        Self {
            phase: BlinkPhase::Idle,
            offset: 0,
            max_offset: 2 * eye_radius,
            step: step.max(1),
        }
    }

    pub fn phase(&self) -> BlinkPhase {
        self.phase
    }

    pub fn offset(&self) -> i32 {
        self.offset
    }

    pub fn max_offset(&self) -> i32 {
        self.max_offset
    }

    pub fn is_idle(&self) -> bool {
        self.phase == BlinkPhase::Idle
    }

    /// Begin a blink. A blink already in flight is left alone.
    #[must_use]
    pub fn start(self) -> (Self, Schedule) {
        if !self.is_idle() {
            return (self, Schedule::Stop);
        }
        debug!("blink start");
        (
            Self {
                phase: BlinkPhase::ClosingDown,
                ..self
            },
            Schedule::Rearm,
        )
    }

    /// Advance the lid by one frame.
    #[must_use]
    pub fn tick(self) -> (Self, Schedule) {
        match self.phase {
            BlinkPhase::Idle => (self, Schedule::Stop),
            BlinkPhase::ClosingDown => {
                let offset = self.offset + self.step;
                let phase = if offset >= self.max_offset {
                    BlinkPhase::OpeningUp
                } else {
                    BlinkPhase::ClosingDown
                };
                (Self { phase, offset, ..self }, Schedule::Rearm)
            }
            BlinkPhase::OpeningUp => {
                let offset = self.offset - self.step;
                if offset <= 0 {
                    debug!("blink done");
                    (
                        Self {
                            phase: BlinkPhase::Idle,
                            offset: 0,
                            ..self
                        },
                        Schedule::Stop,
                    )
                } else {
                    (Self { offset, ..self }, Schedule::Rearm)
                }
            }
        }
    }
}
