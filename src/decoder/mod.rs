//! Decoder backends
//!
//! Every backend implements [`Decoder`]: it receives a prepared grayscale
//! image plus the Block's options and returns the codes it found, with
//! corners already mapped onto the [`Quad`] convention.
//!
//! - `rqrr`: QR only, pure Rust
//! - `rxing`: multi-format (1D and 2D) port of ZXing
//! - `scripted`: replays detections listed in the options

/// QR decoding through `rqrr`
pub mod rqrr;
/// Multi-format decoding through `rxing`
pub mod rxing;
/// Canned detections read from Block options
pub mod scripted;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use image::GrayImage;

use crate::error::DecodeError;
use crate::models::{BlockOptions, DecoderKind, Quad};

pub use self::rqrr::RqrrDecoder;
pub use self::rxing::RxingDecoder;
pub use self::scripted::ScriptedDecoder;

/// One symbol reported by a backend
#[derive(Debug, Clone, PartialEq)]
pub struct RawCode {
    /// Symbology name in rxing spelling (e.g. `QR_CODE`, `EAN_13`)
    pub symbology: String,
    /// Decoded text
    pub payload: String,
    /// Pixel corners
    pub corners: Quad,
}

/// Symbol recognition backend
///
/// Implementations must treat the image as read-only and may be called
/// from several threads at once.
pub trait Decoder: Send + Sync {
    /// Decode every symbol found in `image`
    fn decode(&self, image: &GrayImage, options: &BlockOptions) -> Result<Vec<RawCode>, DecodeError>;
}

/// Decoder instances keyed by kind
///
/// The executor never constructs backends itself; it looks them up here.
#[derive(Clone)]
pub struct Backends {
    decoders: HashMap<DecoderKind, Arc<dyn Decoder>>,
}

impl Backends {
    /// Registry without any backend
    pub fn empty() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// Register (or replace) the backend for `kind`
    pub fn with(mut self, kind: DecoderKind, decoder: Arc<dyn Decoder>) -> Self {
        self.decoders.insert(kind, decoder);
        self
    }

    /// Register (or replace) the backend for `kind` in place
    pub fn insert(&mut self, kind: DecoderKind, decoder: Arc<dyn Decoder>) {
        self.decoders.insert(kind, decoder);
    }

    /// Backend for `kind`, if registered
    pub fn get(&self, kind: DecoderKind) -> Option<&Arc<dyn Decoder>> {
        self.decoders.get(&kind)
    }
}

/// All built-in backends
impl Default for Backends {
    fn default() -> Self {
        Self::empty()
            .with(DecoderKind::Rqrr, Arc::new(RqrrDecoder))
            .with(DecoderKind::Rxing, Arc::new(RxingDecoder))
            .with(DecoderKind::Scripted, Arc::new(ScriptedDecoder))
    }
}

impl fmt::Debug for Backends {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.decoders.keys().map(|k| k.name()).collect();
        kinds.sort_unstable();
        f.debug_struct("Backends").field("kinds", &kinds).finish()
    }
}

/// Read an optional boolean option
pub(crate) fn bool_option(options: &BlockOptions, key: &str, default: bool) -> Result<bool, DecodeError> {
    match options.get(key) {
        None | Some(serde_json::Value::Null) => Ok(default),
        Some(serde_json::Value::Bool(v)) => Ok(*v),
        Some(other) => Err(DecodeError::InvalidOption {
            key: key.to_string(),
            reason: format!("expected a boolean, got {other}"),
        }),
    }
}
