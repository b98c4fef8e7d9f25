//! Googly eyes
//!
//! While active, both pupils are pulled toward the direction of gravity by a damped spring
//! instead of telling the time. A tap toggles the mode.

use super::Schedule;
use crate::geometry::{gravity_angle, Angle, TRIG_MAX_ANGLE};
use crate::status::AccelSample;

/// One degree. Largest velocity change per frame, and the settle tolerance for both angle
/// and velocity.
pub const GOOGLY_STEP: i32 = TRIG_MAX_ANGLE / 360;

/// Spring stiffness: the push toward the goal is `error / GOOGLY_STIFFNESS`, capped at
/// [`GOOGLY_STEP`].
const GOOGLY_STIFFNESS: i32 = 8;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Googly {
    active: bool,
    angle: Angle,
    velocity: i32,
}

impl Googly {
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Shared angle of both pupils while active. Frozen while inactive.
    pub fn angle(&self) -> Angle {
        self.angle
    }

    pub fn velocity(&self) -> i32 {
        self.velocity
    }

    /// Flip the mode. Turning on needs the timer armed; turning off keeps the last angle.
    #[must_use]
    pub fn toggle(self) -> (Self, Schedule) {
        let active = !self.active;
        info!("googly eyes {}", if active { "on" } else { "off" });
        let schedule = if active {
            Schedule::Rearm
        } else {
            Schedule::Stop
        };
        (Self { active, ..self }, schedule)
    }

    /// Leave googly mode without touching angle or velocity.
    #[must_use]
    pub fn stopped(self) -> Self {
        Self {
            active: false,
            ..self
        }
    }

    /// One physics frame.
    ///
    /// `None` means the accelerometer could not be read: the pupils hold still and the timer
    /// keeps running. A sample taken while the motor vibrated ends the session.
    #[must_use]
    pub fn tick(self, sample: Option<AccelSample>) -> (Self, Schedule) {
        if !self.active {
            return (self, Schedule::Stop);
        }
        match sample {
            None => {
                warn!("accelerometer sample missing, holding googly state");
                (self, Schedule::Rearm)
            }
            Some(sample) if sample.did_vibrate => {
                info!("vibration detected, googly eyes off");
                (self.stopped(), Schedule::Stop)
            }
            Some(sample) => (
                self.step_toward(gravity_angle(sample.x.into(), sample.y.into())),
                Schedule::Rearm,
            ),
        }
    }

    /// Spring update toward `goal`, settling once within one step of it.
    ///
    /// The velocity never points away from the goal and covers at most half the remaining
    /// error, so the pupils close in without swinging past it.
    #[must_use]
    pub fn step_toward(self, goal: Angle) -> Self {
        let error = self.angle.delta_to(goal);
        let velocity = if error.abs() <= GOOGLY_STEP && self.velocity.abs() <= GOOGLY_STEP {
            0
        } else {
            let push = (error / GOOGLY_STIFFNESS).clamp(-GOOGLY_STEP, GOOGLY_STEP);
            let brake = error / 2;
            ((self.velocity + push) * 9 / 10).clamp(brake.min(0), brake.max(0))
        };
        Self {
            angle: Angle(self.angle.0 + velocity).normalized(),
            velocity,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(x: i16, y: i16) -> Option<AccelSample> {
        Some(AccelSample {
            x,
            y,
            z: 0,
            did_vibrate: false,
        })
    }

    fn converge(goal_sample: (i16, i16), ticks: usize) -> Vec<Googly> {
        let (mut googly, _) = Googly::default().toggle();
        let mut trace = Vec::new();
        for _ in 0..ticks {
            let (next, schedule) = googly.tick(sample(goal_sample.0, goal_sample.1));
            assert_eq!(schedule, Schedule::Rearm);
            googly = next;
            trace.push(googly);
        }
        trace
    }

    #[test]
    fn toggle_arms_and_disarms() {
        let (on, schedule) = Googly::default().toggle();
        assert!(on.is_active());
        assert_eq!(schedule, Schedule::Rearm);

        let (moved, _) = on.tick(sample(1000, 0));
        let (off, schedule) = moved.toggle();
        assert!(!off.is_active());
        assert_eq!(schedule, Schedule::Stop);
        assert_eq!(off.angle(), moved.angle());

        let (still, schedule) = off.tick(sample(-1000, 0));
        assert_eq!(still, off);
        assert_eq!(schedule, Schedule::Stop);
    }

    #[test]
    fn settles_on_constant_gravity() {
        let cases: [(i16, i16); 5] = [(1000, 0), (0, -1000), (700, 700), (-300, -950), (-1000, 10)];
        for (x, y) in cases {
            let goal = gravity_angle(x.into(), y.into());
            let trace = converge((x, y), 150);

            let settled_at = trace
                .iter()
                .position(|g| g.velocity() == 0 && g.angle().delta_to(goal).abs() <= GOOGLY_STEP)
                .expect("never settled");
            assert!(settled_at < 120);
            for g in &trace[settled_at..] {
                assert_eq!(g.velocity(), 0);
                assert!(g.angle().delta_to(goal).abs() <= GOOGLY_STEP);
            }

            let errors: Vec<i32> = trace.iter().map(|g| g.angle().delta_to(goal)).collect();
            for pair in errors.windows(2) {
                assert!(pair[1].abs() <= pair[0].abs(), "{:?}", errors);
                assert!(pair[0].signum() * pair[1].signum() >= 0, "{:?}", errors);
            }
        }
    }

    #[test]
    fn reversed_goal_brakes_first() {
        let trace = converge((1000, 0), 10);
        let moving = *trace.last().unwrap();
        assert!(moving.velocity() > 0);

        let goal = gravity_angle(-1000, 0);
        let next = moving.step_toward(goal);
        assert!(next.angle().delta_to(goal).abs() <= moving.angle().delta_to(goal).abs());
    }

    #[test]
    fn missing_sample_holds_state() {
        let trace = converge((1000, 0), 5);
        let moving = *trace.last().unwrap();
        assert_ne!(moving.velocity(), 0);

        let (held, schedule) = moving.tick(None);
        assert_eq!(held, moving);
        assert_eq!(schedule, Schedule::Rearm);
        assert!(held.is_active());
    }

    #[test]
    fn vibration_ends_the_session() {
        let trace = converge((1000, 0), 5);
        let moving = *trace.last().unwrap();
        let (after, schedule) = moving.tick(Some(AccelSample {
            x: 1000,
            y: 0,
            z: 0,
            did_vibrate: true,
        }));
        assert!(!after.is_active());
        assert_eq!(after.angle(), moving.angle());
        assert_eq!(schedule, Schedule::Stop);
    }
}
