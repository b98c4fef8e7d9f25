//! Angle and point math for the face
//!
//! Angles use a fixed-point turn: [`TRIG_MAX_ANGLE`] units make a full circle, and the
//! sine/cosine lookups return ratios scaled by [`TRIG_MAX_RATIO`]. 0 points up and angles
//! grow clockwise, like the hands of a clock.

use core::f32::consts::PI;

use embedded_graphics::geometry::Point;

/// Units per full turn
pub const TRIG_MAX_ANGLE: i32 = 0x1_0000;
/// Scale of the values returned by [`Angle::sin_lookup`] and [`Angle::cos_lookup`]
pub const TRIG_MAX_RATIO: i32 = 0xffff;

const HALF_TURN: i32 = TRIG_MAX_ANGLE / 2;

/// Fixed-point angle, see the module documentation for the convention.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Angle(pub i32);

impl Angle {
    pub const ZERO: Self = Self(0);

    /// `num / den` of a full turn, truncated.
    pub const fn of_turn(num: i32, den: i32) -> Self {
        Self(TRIG_MAX_ANGLE * num / den)
    }

    pub fn from_radians(rad: f32) -> Self {
        Self(libm::roundf(rad * TRIG_MAX_ANGLE as f32 / (2.0 * PI)) as i32)
    }

    pub fn to_radians(self) -> f32 {
        self.0 as f32 * 2.0 * PI / TRIG_MAX_ANGLE as f32
    }

    /// Sine scaled by [`TRIG_MAX_RATIO`]
    pub fn sin_lookup(self) -> i32 {
        libm::roundf(libm::sinf(self.to_radians()) * TRIG_MAX_RATIO as f32) as i32
    }

    /// Cosine scaled by [`TRIG_MAX_RATIO`]
    pub fn cos_lookup(self) -> i32 {
        libm::roundf(libm::cosf(self.to_radians()) * TRIG_MAX_RATIO as f32) as i32
    }

    /// Same direction, mapped into `[-TRIG_MAX_ANGLE / 2, TRIG_MAX_ANGLE / 2)`.
    pub fn normalized(self) -> Self {
        Self(wrap(self.0))
    }

    /// Signed shortest rotation from `self` to `target`.
    pub fn delta_to(self, target: Angle) -> i32 {
        wrap(target.0.wrapping_sub(self.0))
    }
}

fn wrap(units: i32) -> i32 {
    (units + HALF_TURN).rem_euclid(TRIG_MAX_ANGLE) - HALF_TURN
}

/// Angle of the minute pupil.
pub fn minute_angle(minute: u32) -> Angle {
    Angle::of_turn(minute as i32, 60)
}

/// Angle of the hour pupil.
///
/// Twelve hours of six steps each, one step per ten minutes. The pupil jumps from step to
/// step instead of moving continuously.
pub fn hour_angle(hour: u32, minute: u32) -> Angle {
    Angle::of_turn(((hour % 12) * 6 + minute / 10) as i32, 12 * 6)
}

/// Point at `radius` from `center` in the direction of `angle`.
pub fn orbit_point(center: Point, radius: i32, angle: Angle) -> Point {
    Point::new(
        center.x + angle.sin_lookup() * radius / TRIG_MAX_RATIO,
        center.y - angle.cos_lookup() * radius / TRIG_MAX_RATIO,
    )
}

/// Direction the gravity vector pulls in, for an accelerometer sample in the face plane.
pub fn gravity_angle(x: i32, y: i32) -> Angle {
    Angle::from_radians(libm::atan2f(x as f32, y as f32))
}
