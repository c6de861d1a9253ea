//! Pixel corners to a resolution-independent oriented box
//!
//! Corners follow the [`Quad`](crate::models::Quad) convention:
//! c1 top-right, c2 top-left, c3 bottom-left, c4 bottom-right.

use crate::models::{BoxSize, MergedDetection, NormalizedDetection, OrientedBox, Point};

/// Normalize a merged detection against the image it was found in
///
/// `width` and `height` must be non-zero.
pub fn normalize(merged: &MergedDetection, width: u32, height: u32) -> NormalizedDetection {
    let (w, h) = (width as f32, height as f32);
    let quad = &merged.detection.corners;
    let (c1, c2, c3, c4) = (quad.top_right, quad.top_left, quad.bottom_left, quad.bottom_right);

    let center = c1.midpoint(&c3).scale_to_unit(w, h);
    let size = BoxSize {
        width: c2.distance(&c1) / w,
        height: c4.distance(&c1) / h,
    };

    NormalizedDetection {
        format: merged.detection.symbology.clone(),
        value: merged.detection.payload.clone(),
        bbox: OrientedBox {
            angle: right_edge_angle(c1, c4),
            center,
            size,
        },
        corners: [c2, c3, c4, c1].map(|p| p.scale_to_unit(w, h)),
        detected_by: merged.contributing_tags.clone(),
    }
}

/// Tilt of the c4 -> c1 edge from vertical, in degrees, clockwise positive
///
/// A horizontal edge gives -90 when c1 lies right of c4, +90 when it lies
/// left, and 0 when the two corners coincide.
pub fn right_edge_angle(c1: Point, c4: Point) -> f32 {
    let dx = c1.x - c4.x;
    let dy = c1.y - c4.y;

    let angle = if dy == 0.0 {
        if dx > 0.0 {
            -90.0
        } else if dx < 0.0 {
            90.0
        } else {
            0.0
        }
    } else {
        -(dx / dy).atan().to_degrees()
    };

    // -0.0 serializes as "-0.0"
    if angle == 0.0 { 0.0 } else { angle }
}
