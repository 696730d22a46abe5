use serde::Serialize;

/// Position on the stage, in pixels from the top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub(crate) struct Point {
    pub(crate) x: f32,
    pub(crate) y: f32,
}

impl Point {
    pub(crate) fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub(crate) fn distance(self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub(crate) fn offset(self, dx: f32, dy: f32) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }
}

/// Pixel extent of the play area. The pet sits at its center; messes land on
/// the floor band between 60% and 80% of its height.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub(crate) struct Stage {
    pub(crate) w: f32,
    pub(crate) h: f32,
}

impl Default for Stage {
    fn default() -> Self {
        Self { w: 800.0, h: 600.0 }
    }
}

impl Stage {
    pub(crate) fn center(&self) -> Point {
        Point::new(self.w / 2.0, self.h / 2.0)
    }

    /// Maps two unit draws onto the floor band.
    pub(crate) fn floor_point(&self, u: f32, v: f32) -> Point {
        Point::new(self.w * (0.1 + 0.8 * u), self.h * (0.6 + 0.2 * v))
    }
}

/// Feedback symbol carried by a transient effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub(crate) enum Glyph {
    Food(char),
    Heart,
    Ball,
    Sleepy,
    Sparkle,
}

impl Glyph {
    pub(crate) fn symbol(self) -> char {
        match self {
            Glyph::Food(icon) => icon,
            Glyph::Heart => '♥',
            Glyph::Ball => 'o',
            Glyph::Sleepy => 'z',
            Glyph::Sparkle => '✧',
        }
    }
}
