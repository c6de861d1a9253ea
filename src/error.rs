//! Error types.
//!
//! Two tiers: [`ScanError`] is fatal for the image being processed (and for a
//! whole batch), while [`BlockError`] describes a single Block failing and is
//! absorbed by the executor.

use std::path::PathBuf;

/// Fatal error for one scan invocation.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    #[error("invalid input image: {0}")]
    Input(#[from] InputError),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Problems with the pipeline configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("block list is empty")]
    EmptyBlocks,
    #[error("unknown decoder kind '{0}' (expected rqrr, rxing or scripted)")]
    UnknownDecoder(String),
    #[error("unknown preprocessing method '{0}' (expected original, histogram or otsu)")]
    UnknownPreprocessing(String),
    #[error("unknown execution mode '{0}' (expected parallel or sequential)")]
    UnknownMode(String),
    #[error("block {index}: no backend registered for decoder '{kind}'")]
    MissingBackend { index: usize, kind: &'static str },
    #[error("resize percentage must be in (0, 100], got {0}")]
    InvalidResize(f32),
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Problems turning caller-supplied bytes into a [`SourceImage`](crate::SourceImage).
#[derive(thiserror::Error, Debug)]
pub enum InputError {
    #[error("width and height must be positive numbers (width: {width}, height: {height})")]
    InvalidDimensions { width: i64, height: i64 },
    #[error("image dimensions too large (max: {max})")]
    TooLarge { max: u32 },
    #[error("unsupported dtype: {0}. Only 'uint8' is currently supported")]
    UnsupportedDtype(String),
    #[error("unsupported colorSpace: {0}. Supported values: GRAY, RGB, BGR, RGBA, BGRA")]
    UnsupportedColorSpace(String),
    #[error("unsupported channel count: {0}")]
    UnsupportedChannels(usize),
    #[error("data length mismatch: expected {expected} bytes ({width}x{height}x{channels}), got {actual} bytes")]
    LengthMismatch {
        expected: usize,
        actual: usize,
        width: u32,
        height: u32,
        channels: usize,
    },
    #[error("cannot infer channels: data length ({len}) is not divisible by width*height ({pixels})")]
    CannotInferChannels { len: usize, pixels: usize },
    #[error("image data too large: {bytes} bytes (max: {max} bytes)")]
    BufferTooLarge { bytes: usize, max: usize },
    #[error("failed to decode image buffer: {0}")]
    Decode(#[from] image::ImageError),
    #[error("failed to read image {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Preprocessing failure for one Block.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PreprocessError {
    #[error("unsupported channel layout: {0}")]
    UnsupportedLayout(&'static str),
    #[error("preprocessing changed dimensions from {expected:?} to {actual:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
}

/// Decoder backend failure for one Block.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid option '{key}': {reason}")]
    InvalidOption { key: String, reason: String },
    #[error("{0}")]
    Backend(String),
}

/// Recoverable failure of a single Block.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BlockError {
    #[error("preprocessing failed: {0}")]
    Preprocess(#[from] PreprocessError),
    #[error("decoding failed: {0}")]
    Decode(#[from] DecodeError),
    #[error("block panicked: {0}")]
    Panicked(String),
}

/// Result alias for fatal scan errors.
pub type Result<T> = std::result::Result<T, ScanError>;
