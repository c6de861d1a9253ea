use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Backend-specific options, passed through to the decoder untouched
pub type BlockOptions = serde_json::Map<String, serde_json::Value>;

/// Decoder backend selected by a Block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum DecoderKind {
    /// QR-only decoder backed by `rqrr`
    Rqrr,
    /// Multi-format decoder backed by `rxing`
    Rxing,
    /// Replays detections listed in the Block options
    Scripted,
}

impl DecoderKind {
    /// All kinds, in registry order
    pub const ALL: [DecoderKind; 3] = [DecoderKind::Rqrr, DecoderKind::Rxing, DecoderKind::Scripted];

    /// Configuration name of this kind
    pub fn name(&self) -> &'static str {
        match self {
            DecoderKind::Rqrr => "rqrr",
            DecoderKind::Rxing => "rxing",
            DecoderKind::Scripted => "scripted",
        }
    }
}

impl FromStr for DecoderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rqrr" => Ok(DecoderKind::Rqrr),
            "rxing" => Ok(DecoderKind::Rxing),
            "scripted" => Ok(DecoderKind::Scripted),
            _ => Err(ConfigError::UnknownDecoder(s.to_string())),
        }
    }
}

impl TryFrom<String> for DecoderKind {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for DecoderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Grayscale enhancement applied before decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Preprocessing {
    /// Plain grayscale conversion
    Original,
    /// Grayscale followed by global histogram equalization
    Histogram,
    /// Histogram equalization followed by Otsu binarization
    Otsu,
}

impl Preprocessing {
    /// Configuration name of this method
    pub fn name(&self) -> &'static str {
        match self {
            Preprocessing::Original => "original",
            Preprocessing::Histogram => "histogram",
            Preprocessing::Otsu => "otsu",
        }
    }
}

impl FromStr for Preprocessing {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "original" | "identity" => Ok(Preprocessing::Original),
            "histogram" | "histogramEq" => Ok(Preprocessing::Histogram),
            "otsu" | "otsuThreshold" => Ok(Preprocessing::Otsu),
            _ => Err(ConfigError::UnknownPreprocessing(s.to_string())),
        }
    }
}

impl TryFrom<String> for Preprocessing {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Preprocessing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One configured decode attempt: preprocessing, decoder and its options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Decoder backend
    pub decoder: DecoderKind,
    /// Preprocessing applied to the source image
    pub preprocessing: Preprocessing,
    /// Opaque backend options
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub options: BlockOptions,
}

impl Block {
    /// Create a Block with no options
    pub fn new(decoder: DecoderKind, preprocessing: Preprocessing) -> Self {
        Self {
            decoder,
            preprocessing,
            options: BlockOptions::new(),
        }
    }

    /// Add a backend option
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Identifier reported in `detectedBy`, e.g. `rxing_histogram`
    pub fn tag(&self) -> String {
        format!("{}_{}", self.decoder.name(), self.preprocessing.name())
    }
}

/// Parses the CLI shorthand `decoder:preprocessing`, e.g. `rqrr:otsu`
impl FromStr for Block {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (decoder, preprocessing) = s.split_once(':').unwrap_or((s, "original"));
        Ok(Block::new(decoder.parse()?, preprocessing.parse()?))
    }
}
