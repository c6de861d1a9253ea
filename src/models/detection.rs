use serde::{Deserialize, Serialize};

use super::Point;

/// Four pixel corners of a decoded symbol
///
/// Named after their position on an upright symbol. Decoders that report
/// corners in another order map them here once, so everything downstream
/// can rely on a single convention.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Quad {
    /// Corner 1
    pub top_right: Point,
    /// Corner 2
    pub top_left: Point,
    /// Corner 3
    pub bottom_left: Point,
    /// Corner 4
    pub bottom_right: Point,
}

impl Quad {
    /// Build from corners listed clockwise starting at the top-left,
    /// the order used by `rqrr` grid bounds.
    pub fn from_clockwise(points: [Point; 4]) -> Self {
        let [top_left, top_right, bottom_right, bottom_left] = points;
        Self {
            top_right,
            top_left,
            bottom_left,
            bottom_right,
        }
    }

    /// Build from corners in the fixed `[c1, c2, c3, c4]` order
    pub fn from_corners(corners: [Point; 4]) -> Self {
        let [top_right, top_left, bottom_left, bottom_right] = corners;
        Self {
            top_right,
            top_left,
            bottom_left,
            bottom_right,
        }
    }

    /// Axis-aligned quad enclosing every point, `None` when `points` is empty
    pub fn bounding(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self {
            top_right: Point::new(max_x, min_y),
            top_left: Point::new(min_x, min_y),
            bottom_left: Point::new(min_x, max_y),
            bottom_right: Point::new(max_x, max_y),
        })
    }
}

/// Detection as produced by one decoder call inside one Block
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    /// Symbology name as reported by the backend
    pub symbology: String,
    /// Decoded text, also the dedup key
    pub payload: String,
    /// Pixel corners
    pub corners: Quad,
    /// Position of the producing Block in the Block list
    pub source_block_index: usize,
    /// `decoder_preprocessing` tag of the producing Block
    pub source_tag: String,
}

/// Detections from several Blocks collapsed onto one payload
#[derive(Debug, Clone, PartialEq)]
pub struct MergedDetection {
    /// Fields of the contributing detection with the lowest Block index
    pub detection: RawDetection,
    /// Every distinct tag that produced this payload, in arrival order
    pub contributing_tags: Vec<String>,
}

impl MergedDetection {
    /// Start a merge group from its first detection
    pub fn new(detection: RawDetection) -> Self {
        let contributing_tags = vec![detection.source_tag.clone()];
        Self {
            detection,
            contributing_tags,
        }
    }

    /// Fold another detection with the same payload into this group
    pub fn absorb(&mut self, other: &RawDetection) {
        if !self.contributing_tags.iter().any(|t| *t == other.source_tag) {
            self.contributing_tags.push(other.source_tag.clone());
        }
        if other.source_block_index < self.detection.source_block_index {
            self.detection.symbology.clone_from(&other.symbology);
            self.detection.payload.clone_from(&other.payload);
            self.detection.corners = other.corners;
            self.detection.source_block_index = other.source_block_index;
        }
    }
}

/// Extent of an oriented box in normalized coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoxSize {
    /// Width as a fraction of the image width
    pub width: f32,
    /// Height as a fraction of the image height
    pub height: f32,
}

/// Rotated bounding box in the normalized `[0, 1]` frame
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OrientedBox {
    /// Rotation in degrees, positive for a clockwise tilt
    pub angle: f32,
    /// Box center
    pub center: Point,
    /// Box extent
    pub size: BoxSize,
}

/// Final, resolution-independent detection returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedDetection {
    /// Symbology name
    pub format: String,
    /// Decoded text
    pub value: String,
    /// Oriented bounding box
    #[serde(rename = "box")]
    pub bbox: OrientedBox,
    /// Normalized corners: top-left, bottom-left, bottom-right, top-right
    pub corners: [Point; 4],
    /// Tags of every Block that decoded this value
    pub detected_by: Vec<String>,
}
