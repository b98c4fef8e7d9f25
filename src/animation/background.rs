//! Background color cycle
//!
//! The hue indexes a 64 entry palette with two bits per channel (`0b00rrggbb`). Targets
//! without color keep a black background and never advance.

use embedded_graphics::pixelcolor::{Rgb565, RgbColor};

pub const HUE_COUNT: u8 = 64;
/// Chrome yellow: red 3, green 2, blue 0
pub const INITIAL_HUE: u8 = 0b11_10_00;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BackgroundCycle {
    hue: u8,
    enabled: bool,
}

impl BackgroundCycle {
    pub fn new(supports_color: bool) -> Self {
        Self {
            hue: INITIAL_HUE,
            enabled: supports_color,
        }
    }

    pub fn hue(&self) -> u8 {
        self.hue
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Step to the next palette entry.
    #[must_use]
    pub fn advance(self) -> Self {
        if !self.enabled {
            return self;
        }
        Self {
            hue: (self.hue + 1) % HUE_COUNT,
            ..self
        }
    }

    pub fn color(&self) -> Rgb565 {
        if !self.enabled {
            return Rgb565::BLACK;
        }
        palette(self.hue)
    }
}

/// Expand a `0b00rrggbb` palette index to RGB565.
pub fn palette(hue: u8) -> Rgb565 {
    let r = (hue >> 4) & 0b11;
    let g = (hue >> 2) & 0b11;
    let b = hue & 0b11;
    Rgb565::new(r * 31 / 3, g * 63 / 3, b * 31 / 3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hue_wraps_after_sixty_four_steps() {
        let mut cycle = BackgroundCycle::new(true);
        assert_eq!(cycle.hue(), INITIAL_HUE);
        for _ in 0..(HUE_COUNT - INITIAL_HUE) {
            cycle = cycle.advance();
        }
        assert_eq!(cycle.hue(), 0);
        for _ in 0..HUE_COUNT {
            cycle = cycle.advance();
        }
        assert_eq!(cycle.hue(), 0);
    }

    #[test]
    fn monochrome_never_cycles() {
        let cycle = BackgroundCycle::new(false);
        assert_eq!(cycle.advance(), cycle);
        assert_eq!(cycle.color(), Rgb565::BLACK);
    }

    #[test]
    fn palette_extremes() {
        assert_eq!(palette(0), Rgb565::BLACK);
        assert_eq!(palette(0b11_11_11), Rgb565::WHITE);
        assert_eq!(palette(INITIAL_HUE), Rgb565::new(31, 42, 0));
    }
}
