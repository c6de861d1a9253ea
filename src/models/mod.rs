pub mod block;
pub mod detection;
pub mod image;
pub mod point;

pub use block::{Block, BlockOptions, DecoderKind, Preprocessing};
pub use detection::{BoxSize, MergedDetection, NormalizedDetection, OrientedBox, Quad, RawDetection};
pub use image::{ColorSpace, ImageInput, RawImage, SourceImage};
pub use point::Point;
