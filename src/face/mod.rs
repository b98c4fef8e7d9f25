//! Procedural face renderer
//!
//! [`render`] turns time, settings, status and animation state into a [`Frame`]. It keeps no
//! state of its own: the same inputs always give the same frame.

use chrono::{Datelike, NaiveDateTime, Timelike};
use embedded_graphics::{
    pixelcolor::{Rgb565, RgbColor},
    prelude::*,
    primitives::Rectangle,
};

use crate::animation::AnimationState;
use crate::device::{DeviceProfile, FaceLayout};
use crate::geometry::{hour_angle, minute_angle, orbit_point};
use crate::settings::Settings;
use crate::status::RuntimeStatus;

mod frame;

pub use self::frame::{Frame, Shape, FRAME_CAPACITY};

/// Width of the eye outline and mouth outline on color screens
const BORDER_WIDTH: u32 = 2;
/// Space the eyelid leaves above the eye outline when open
const LID_CLEARANCE: i32 = 3;
const HIGHLIGHT_RADIUS: u32 = 2;
const HIGHLIGHT_OFFSET: Point = Point::new(2, -2);
const BROW_GAP: i32 = 10;
const BROW_WIDTH: u32 = 4;
pub const TOOTH_COUNT: usize = 8;

/// Eye centers, left then right.
pub fn eye_centers(profile: &DeviceProfile) -> (Point, Point) {
    let layout = &profile.layout;
    let center = profile.bounds.center() + Point::new(0, profile.bezel_vertical_offset);
    let shift = Point::new(layout.eye_radius + layout.eye_distance, 0);
    (center - shift, center + shift)
}

/// Eyebrow lines as `(inner, outer)` end points, left then right.
pub fn eyebrows(
    layout: &FaceLayout,
    eyes: (Point, Point),
    settings: &Settings,
    status: &RuntimeStatus,
) -> [(Point, Point); 2] {
    let r = layout.eye_radius;
    let charge_diff = settings.angryness.charge_diff(status.battery_percent);
    let (alarm_x, alarm_y) = if settings.bluetooth_alert && !status.bluetooth_connected {
        (r, charge_diff / 2)
    } else {
        (0, 0)
    };

    let (left, right) = eyes;
    let outer_y = |eye: Point| eye.y - r - BROW_GAP - charge_diff - alarm_y;
    [
        (
            Point::new(left.x + r, left.y - r - BROW_GAP),
            Point::new(left.x - r + alarm_x, outer_y(left)),
        ),
        (
            Point::new(right.x - r, right.y - r - BROW_GAP),
            Point::new(right.x + r - alarm_x, outer_y(right)),
        ),
    ]
}

/// Which teeth are dark for a day of the month: bit `7 - i` of the day for tooth `i`, so
/// the leftmost tooth is the most significant bit.
pub fn teeth(day_of_month: u32) -> [bool; TOOTH_COUNT] {
    core::array::from_fn(|i| day_of_month & (1 << (TOOTH_COUNT - 1 - i)) != 0)
}

/// Eyelid quadrilateral for one eye at the given blink offset.
fn eyelid(layout: &FaceLayout, eye: Point, offset: i32) -> [Point; 4] {
    let r = layout.eye_radius;
    let reach = r + LID_CLEARANCE;
    let offset = offset.clamp(0, 2 * r);
    // Bottom edge travels from just above the eye outline to just below it.
    let bottom = eye.y - reach + offset * reach / r;
    let top = bottom - 2 * reach - 4;
    let (left, right) = (eye.x - reach - 1, eye.x + reach + 1);
    [
        Point::new(left, top),
        Point::new(right, top),
        Point::new(right, bottom),
        Point::new(left, bottom),
    ]
}

/// Compose one frame of the face.
pub fn render(
    profile: &DeviceProfile,
    time: NaiveDateTime,
    animation: &AnimationState,
    settings: &Settings,
    status: &RuntimeStatus,
) -> Frame {
    let layout = &profile.layout;
    let color = profile.supports_color;
    let background = if color {
        animation.background.color()
    } else {
        Rgb565::BLACK
    };
    let ink = if color { Rgb565::BLACK } else { Rgb565::WHITE };

    let mut frame = Frame::new();
    frame.push(Shape::FillRect {
        area: profile.bounds,
        color: background,
    });

    // Eyes
    let (left_eye, right_eye) = eye_centers(profile);
    let eye_radius = layout.eye_radius as u32;
    for eye in [left_eye, right_eye] {
        frame.push(Shape::FillCircle {
            center: eye,
            radius: eye_radius,
            color: Rgb565::WHITE,
        });
    }
    if color {
        for eye in [left_eye, right_eye] {
            frame.push(Shape::StrokeCircle {
                center: eye,
                radius: eye_radius + 1,
                width: BORDER_WIDTH,
                color: Rgb565::BLACK,
            });
        }
    }

    // Pupils: hour on the left, minute on the right, unless gravity has them
    let (left_angle, right_angle) = if animation.googly.is_active() {
        (animation.googly.angle(), animation.googly.angle())
    } else {
        (
            hour_angle(time.hour(), time.minute()),
            minute_angle(time.minute()),
        )
    };
    let pupils = [
        orbit_point(left_eye, layout.pupil_orbit(), left_angle),
        orbit_point(right_eye, layout.pupil_orbit(), right_angle),
    ];
    for pupil in pupils {
        frame.push(Shape::FillCircle {
            center: pupil,
            radius: layout.pupil_radius as u32,
            color: Rgb565::BLACK,
        });
    }
    for pupil in pupils {
        frame.push(Shape::FillCircle {
            center: pupil + HIGHLIGHT_OFFSET,
            radius: HIGHLIGHT_RADIUS,
            color: Rgb565::WHITE,
        });
    }

    // Eyelids
    let offset = animation.blink.offset();
    for eye in [left_eye, right_eye] {
        frame.push(Shape::FillQuad {
            corners: eyelid(layout, eye, offset),
            color: background,
        });
    }

    if settings.show_eyebrows {
        for (inner, outer) in eyebrows(layout, (left_eye, right_eye), settings, status) {
            frame.push(Shape::Line {
                start: inner,
                end: outer,
                width: BROW_WIDTH,
                color: ink,
            });
        }
    }

    if settings.show_mouth {
        let r = layout.eye_radius;
        let tooth_width = (r / 4).max(1);
        let mouth = Rectangle::new(
            Point::new(
                (left_eye.x + right_eye.x) / 2 - tooth_width * TOOTH_COUNT as i32 / 2,
                left_eye.y + r + r / 2,
            ),
            Size::new((tooth_width * TOOTH_COUNT as i32) as u32, (r / 2) as u32),
        );
        for (i, dark) in teeth(time.day()).into_iter().enumerate() {
            frame.push(Shape::FillRect {
                area: Rectangle::new(
                    mouth.top_left + Point::new(i as i32 * tooth_width, 0),
                    Size::new(tooth_width as u32, mouth.size.height),
                ),
                color: if dark { Rgb565::BLACK } else { Rgb565::WHITE },
            });
        }
        if color {
            frame.push(Shape::StrokeRoundedRect {
                area: mouth,
                corner_radius: (r / 8) as u32,
                width: BORDER_WIDTH,
                color: Rgb565::BLACK,
            });
        }
    }

    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Angryness;

    #[test]
    fn day_twenty_one_reads_as_binary() {
        assert_eq!(
            teeth(21),
            [false, false, false, true, false, true, false, true]
        );
        assert_eq!(teeth(1), [false, false, false, false, false, false, false, true]);
        assert_eq!(teeth(31), [false, false, false, true, true, true, true, true]);
    }

    #[test]
    fn eyes_sit_either_side_of_center() {
        let profile = DeviceProfile::default();
        let (left, right) = eye_centers(&profile);
        let center = profile.bounds.center();
        assert_eq!(left, center - Point::new(38, 0));
        assert_eq!(right, center + Point::new(38, 0));

        let (low_left, low_right) = eye_centers(&profile.with_bezel_offset(12));
        assert_eq!(low_left, left + Point::new(0, 12));
        assert_eq!(low_right, right + Point::new(0, 12));
    }

    #[test]
    fn disconnected_bluetooth_skews_outer_brows() {
        let layout = FaceLayout::DEFAULT;
        let eyes = eye_centers(&DeviceProfile::default());
        let settings = Settings {
            angryness: Angryness::BATTERY,
            bluetooth_alert: true,
            ..Settings::default()
        };
        let connected = RuntimeStatus {
            battery_percent: 50,
            charging: false,
            bluetooth_connected: true,
        };
        let disconnected = RuntimeStatus {
            bluetooth_connected: false,
            ..connected
        };

        let calm = eyebrows(&layout, eyes, &settings, &connected);
        let alarmed = eyebrows(&layout, eyes, &settings, &disconnected);
        assert_eq!(alarmed[0].1.x, calm[0].1.x + 32);
        assert_eq!(alarmed[1].1.x, calm[1].1.x - 32);
        // charge diff is 0 at 50 %, so nothing moves vertically
        assert_eq!(alarmed[0].1.y, calm[0].1.y);
        assert_eq!(alarmed[0].0, calm[0].0);
    }

    #[test]
    fn alarm_is_off_when_disabled() {
        let layout = FaceLayout::DEFAULT;
        let eyes = eye_centers(&DeviceProfile::default());
        let settings = Settings {
            bluetooth_alert: false,
            ..Settings::default()
        };
        let status = RuntimeStatus {
            bluetooth_connected: false,
            ..RuntimeStatus::default()
        };
        let connected = RuntimeStatus {
            bluetooth_connected: true,
            ..status
        };
        assert_eq!(
            eyebrows(&layout, eyes, &settings, &status),
            eyebrows(&layout, eyes, &settings, &connected)
        );
    }

    #[test]
    fn angry_brows_raise_the_outer_ends() {
        let layout = FaceLayout::DEFAULT;
        let eyes = eye_centers(&DeviceProfile::default());
        let status = RuntimeStatus {
            bluetooth_connected: true,
            ..RuntimeStatus::default()
        };
        let mood = |level| Settings {
            angryness: Angryness::new(level),
            ..Settings::default()
        };
        let [(inner, outer), _] = eyebrows(&layout, eyes, &mood(10), &status);
        assert_eq!(outer.y, inner.y - 10);
        let [(inner, outer), _] = eyebrows(&layout, eyes, &mood(0), &status);
        assert_eq!(outer.y, inner.y + 10);
    }

    #[test]
    fn eyelid_spans_the_eye_at_full_offset() {
        let layout = FaceLayout::DEFAULT;
        let eye = Point::new(50, 80);
        let open = eyelid(&layout, eye, 0);
        assert!(open[2].y < eye.y - layout.eye_radius - 2);
        let shut = eyelid(&layout, eye, 2 * layout.eye_radius);
        assert!(shut[2].y > eye.y + layout.eye_radius + 2);
        assert!(shut[0].y < eye.y - layout.eye_radius - 2);
        assert_eq!(eyelid(&layout, eye, 500), shut);
    }
}
