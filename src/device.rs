//! Device capabilities, resolved once at startup

use embedded_graphics::{
    geometry::{Point, Size},
    primitives::Rectangle,
};

/// Face proportions in pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FaceLayout {
    pub eye_radius: i32,
    pub pupil_radius: i32,
    /// Gap between each eye and the vertical center line
    pub eye_distance: i32,
    /// Lid travel per blink frame
    pub blink_step: i32,
}

impl FaceLayout {
    pub const DEFAULT: Self = Self {
        eye_radius: 32,
        pupil_radius: 8,
        eye_distance: 6,
        blink_step: 8,
    };

    /// Distance from eye center to pupil center
    pub const fn pupil_orbit(&self) -> i32 {
        self.eye_radius - self.pupil_radius - 4
    }
}

impl Default for FaceLayout {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceProfile {
    /// Area the face is drawn into
    pub bounds: Rectangle,
    pub supports_color: bool,
    /// Extra downward shift of the eyes for bezels that hide the top of the screen
    pub bezel_vertical_offset: i32,
    pub layout: FaceLayout,
}

impl DeviceProfile {
    /// PineTime: 240x240 ST7789 panel
    pub const PINETIME: Self = Self {
        bounds: Rectangle::new(Point::zero(), Size::new(240, 240)),
        supports_color: true,
        bezel_vertical_offset: 0,
        layout: FaceLayout {
            eye_radius: 48,
            pupil_radius: 12,
            eye_distance: 8,
            blink_step: 12,
        },
    };

    /// 144x168 color screen with the default layout
    pub const COMPACT: Self = Self {
        bounds: Rectangle::new(Point::zero(), Size::new(144, 168)),
        supports_color: true,
        bezel_vertical_offset: 0,
        layout: FaceLayout::DEFAULT,
    };

    pub const fn monochrome(self) -> Self {
        Self {
            supports_color: false,
            ..self
        }
    }

    pub const fn with_bezel_offset(self, bezel_vertical_offset: i32) -> Self {
        Self {
            bezel_vertical_offset,
            ..self
        }
    }
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self::COMPACT
    }
}
