//! Draw list produced by the renderer

use embedded_graphics::{
    pixelcolor::Rgb565,
    prelude::*,
    primitives::{Circle, Line, PrimitiveStyle, Rectangle, RoundedRectangle, Triangle},
};
use heapless::Vec;

/// Upper bound on shapes in one frame
pub const FRAME_CAPACITY: usize = 32;

/// One filled or stroked primitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    FillRect {
        area: Rectangle,
        color: Rgb565,
    },
    FillCircle {
        center: Point,
        radius: u32,
        color: Rgb565,
    },
    StrokeCircle {
        center: Point,
        radius: u32,
        width: u32,
        color: Rgb565,
    },
    /// Corners in drawing order, filled as two triangles
    FillQuad {
        corners: [Point; 4],
        color: Rgb565,
    },
    Line {
        start: Point,
        end: Point,
        width: u32,
        color: Rgb565,
    },
    StrokeRoundedRect {
        area: Rectangle,
        corner_radius: u32,
        width: u32,
        color: Rgb565,
    },
}

fn circle(center: Point, radius: u32) -> Circle {
    Circle::with_center(center, 2 * radius + 1)
}

impl Drawable for Shape {
    type Color = Rgb565;
    type Output = ();

    fn draw<D>(&self, target: &mut D) -> Result<Self::Output, D::Error>
    where
        D: DrawTarget<Color = Self::Color>,
    {
        match *self {
            Shape::FillRect { area, color } => area
                .into_styled(PrimitiveStyle::with_fill(color))
                .draw(target),
            Shape::FillCircle {
                center,
                radius,
                color,
            } => circle(center, radius)
                .into_styled(PrimitiveStyle::with_fill(color))
                .draw(target),
            Shape::StrokeCircle {
                center,
                radius,
                width,
                color,
            } => circle(center, radius)
                .into_styled(PrimitiveStyle::with_stroke(color, width))
                .draw(target),
            Shape::FillQuad {
                corners: [a, b, c, d],
                color,
            } => {
                let style = PrimitiveStyle::with_fill(color);
                Triangle::new(a, b, c).into_styled(style).draw(target)?;
                Triangle::new(a, c, d).into_styled(style).draw(target)
            }
            Shape::Line {
                start,
                end,
                width,
                color,
            } => Line::new(start, end)
                .into_styled(PrimitiveStyle::with_stroke(color, width))
                .draw(target),
            Shape::StrokeRoundedRect {
                area,
                corner_radius,
                width,
                color,
            } => RoundedRectangle::with_equal_corners(area, Size::new_equal(corner_radius))
                .into_styled(PrimitiveStyle::with_stroke(color, width))
                .draw(target),
        }
    }
}

/// Shapes of one frame, back to front.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Frame {
    shapes: Vec<Shape, FRAME_CAPACITY>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, shape: Shape) {
        if self.shapes.push(shape).is_err() {
            warn!("frame full, dropping shape");
        }
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }
}

impl Drawable for Frame {
    type Color = Rgb565;
    type Output = ();

    fn draw<D>(&self, target: &mut D) -> Result<Self::Output, D::Error>
    where
        D: DrawTarget<Color = Self::Color>,
    {
        for shape in &self.shapes {
            shape.draw(target)?;
        }
        Ok(())
    }
}
