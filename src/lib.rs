//! barscan - multi-backend barcode and QR scanning
//!
//! An image is run through an ordered list of Blocks, each pairing a
//! grayscale preprocessing method with a decoder backend. Blocks run either
//! all at once (results concatenated in Block order) or one by one until a
//! Block finds something. Detections are then merged by payload and mapped
//! onto a resolution-independent oriented box.
//!
//! ```no_run
//! use barscan::{ImageInput, ScanConfig, Scanner};
//!
//! let bytes = std::fs::read("ticket.png").unwrap();
//! let scanner = Scanner::with_config(ScanConfig::default()).unwrap();
//! let report = scanner.scan(&ImageInput::Encoded(bytes)).unwrap();
//! for code in &report.detections {
//!     println!("{} {} by {:?}", code.format, code.value, code.detected_by);
//! }
//! ```

/// JSON and environment configuration
pub mod config;
/// Decoder trait, backend registry and built-in adapters
pub mod decoder;
/// Error types
pub mod error;
/// Stderr logger
pub mod logger;
/// Core data structures (Block, detections, images, points)
pub mod models;
/// Executor, merge, normalization and the Scanner
pub mod pipeline;
/// Grayscale conversion and enhancement
pub mod preprocess;
/// Helpers for loading images from disk
pub mod tools;

pub use config::ScanConfig;
pub use decoder::{Backends, Decoder, RawCode};
pub use error::{BlockError, ConfigError, DecodeError, InputError, PreprocessError, Result, ScanError};
pub use models::{
    Block, BlockOptions, ColorSpace, DecoderKind, ImageInput, MergedDetection, NormalizedDetection, Point,
    Preprocessing, Quad, RawDetection, RawImage, SourceImage,
};
pub use pipeline::{BlockFailure, ExecutionMode, ScanReport, Scanner};

/// Scan one image with `config` and the built-in backends
pub fn scan(input: &ImageInput, config: &ScanConfig) -> Result<ScanReport> {
    Scanner::with_config(config.clone())?.scan(input)
}

/// Scan several images with `config`; the first fatal error fails the batch
pub fn scan_batch(inputs: &[ImageInput], config: &ScanConfig) -> Result<Vec<ScanReport>> {
    Scanner::with_config(config.clone())?.scan_batch(inputs)
}
