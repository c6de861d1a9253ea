use serde::{Deserialize, Serialize};

/// 2D point with floating point coordinates
///
/// Used both for pixel-space corners reported by decoders and for
/// corners in the normalized `[0, 1]` frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
}

impl Point {
    /// Create a new point
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Calculate distance to another point
    pub fn distance(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Midpoint between this point and another
    pub fn midpoint(&self, other: &Point) -> Self {
        Self {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }

    /// Divide each axis by the matching image dimension
    pub fn scale_to_unit(&self, width: f32, height: f32) -> Self {
        Self {
            x: self.x / width,
            y: self.y / height,
        }
    }
}
