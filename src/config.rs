//! Scanner configuration
//!
//! Loaded from JSON (camelCase keys) and optionally adjusted from the
//! environment:
//!
//! - `BARSCAN_MODE`: `parallel` or `sequential`
//! - `BARSCAN_THREADS`: worker count, `0` for the global rayon pool

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;
use crate::models::{Block, DecoderKind, Preprocessing};
use crate::pipeline::ExecutionMode;

pub const ENV_MODE: &str = "BARSCAN_MODE";
pub const ENV_THREADS: &str = "BARSCAN_THREADS";

fn parse_env_usize(name: &str) -> Option<usize> {
    std::env::var(name).ok().and_then(|v| v.trim().parse::<usize>().ok())
}

fn parse_env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Run every string-valued name through its `FromStr` so the typed error wins
fn check_names(value: &Value) -> Result<(), ConfigError> {
    if let Some(mode) = value.get("mode").and_then(Value::as_str) {
        mode.parse::<ExecutionMode>()?;
    }
    let blocks = value.get("blocks").and_then(Value::as_array).map(Vec::as_slice).unwrap_or_default();
    for block in blocks {
        if let Some(decoder) = block.get("decoder").and_then(Value::as_str) {
            decoder.parse::<DecoderKind>()?;
        }
        if let Some(preprocessing) = block.get("preprocessing").and_then(Value::as_str) {
            preprocessing.parse::<Preprocessing>()?;
        }
    }
    Ok(())
}

/// Everything that shapes one scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanConfig {
    /// Block evaluation mode
    #[serde(default)]
    pub mode: ExecutionMode,
    /// Ordered Block list; must not be empty
    #[serde(default = "default_blocks")]
    pub blocks: Vec<Block>,
    /// Downscale the input to this percentage before decoding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resize_percent: Option<f32>,
    /// Size of a dedicated worker pool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
}

/// Fast QR pass, thorough multi-format passes, then a binarized QR pass
pub fn default_blocks() -> Vec<Block> {
    vec![
        Block::new(DecoderKind::Rqrr, Preprocessing::Original),
        Block::new(DecoderKind::Rxing, Preprocessing::Original).with_option("tryHarder", true),
        Block::new(DecoderKind::Rxing, Preprocessing::Histogram),
        Block::new(DecoderKind::Rqrr, Preprocessing::Otsu),
    ]
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::default(),
            blocks: default_blocks(),
            resize_percent: None,
            threads: None,
        }
    }
}

impl ScanConfig {
    /// Config with the given Blocks and defaults elsewhere
    pub fn with_blocks(mode: ExecutionMode, blocks: Vec<Block>) -> Self {
        Self {
            mode,
            blocks,
            ..Self::default()
        }
    }

    /// Parse a JSON document
    ///
    /// Unknown mode, decoder or preprocessing names surface as their own
    /// [`ConfigError`] variants rather than as a generic parse error.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(json)?;
        check_names(&value)?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Apply `BARSCAN_MODE` and `BARSCAN_THREADS` when set
    ///
    /// An unparsable thread count is ignored; an unknown mode is an error.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(parse_env_string(ENV_MODE).as_deref(), parse_env_usize(ENV_THREADS))
    }

    /// Apply explicit overrides; `threads == Some(0)` selects the global pool
    pub fn with_overrides(mut self, mode: Option<&str>, threads: Option<usize>) -> Result<Self, ConfigError> {
        if let Some(mode) = mode {
            self.mode = mode.parse()?;
        }
        if let Some(threads) = threads {
            self.threads = (threads > 0).then_some(threads);
        }
        Ok(self)
    }

    /// Reject configurations that cannot run any image
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.blocks.is_empty() {
            return Err(ConfigError::EmptyBlocks);
        }
        match self.resize_percent {
            Some(percent) if !(percent > 0.0 && percent <= 100.0) => Err(ConfigError::InvalidResize(percent)),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ScanConfig::default();
        assert_eq!(config.mode, ExecutionMode::Parallel);
        assert_eq!(config.blocks.len(), 4);
        assert_eq!(config.blocks[1].tag(), "rxing_original");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_json() {
        let config = ScanConfig::from_json_str(
            r#"{
                "mode": "sequential",
                "resizePercent": 50,
                "blocks": [
                    {"decoder": "rqrr", "preprocessing": "otsuThreshold"},
                    {"decoder": "rxing", "preprocessing": "identity", "options": {"tryHarder": true}}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.mode, ExecutionMode::Sequential);
        assert_eq!(config.resize_percent, Some(50.0));
        assert_eq!(config.blocks[0].preprocessing, Preprocessing::Otsu);
        assert_eq!(config.blocks[1].decoder, DecoderKind::Rxing);
        assert_eq!(config.threads, None);
    }

    #[test]
    fn test_missing_blocks_use_defaults() {
        let config = ScanConfig::from_json_str(r#"{"mode": "parallel"}"#).unwrap();
        assert_eq!(config.blocks, default_blocks());
    }

    #[test]
    fn test_unknown_names_are_rejected() {
        let err = ScanConfig::from_json_str(r#"{"blocks": [{"decoder": "zbar", "preprocessing": "original"}]}"#)
            .unwrap_err();
        assert!(matches!(&err, ConfigError::UnknownDecoder(name) if name == "zbar"), "{err:?}");
        assert!(err.to_string().contains("zbar"));

        let err = ScanConfig::from_json_str(r#"{"mode": "eager"}"#).unwrap_err();
        assert!(matches!(&err, ConfigError::UnknownMode(name) if name == "eager"), "{err:?}");

        let err = ScanConfig::from_json_str(
            r#"{"blocks": [{"decoder": "rqrr", "preprocessing": "original"}, {"decoder": "rqrr", "preprocessing": "sharpen"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(&err, ConfigError::UnknownPreprocessing(name) if name == "sharpen"), "{err:?}");
    }

    #[test]
    fn test_malformed_documents_are_parse_errors() {
        for json in [r#"{"mode": "#, r#"{"mode": 3}"#, r#"{"blocks": [{"decoder": "rqrr"}]}"#] {
            let err = ScanConfig::from_json_str(json).unwrap_err();
            assert!(matches!(err, ConfigError::Parse(_)), "{json}: {err:?}");
        }
    }

    #[test]
    fn test_validate() {
        let empty = ScanConfig::with_blocks(ExecutionMode::Parallel, Vec::new());
        assert!(matches!(empty.validate(), Err(ConfigError::EmptyBlocks)));

        let config = ScanConfig {
            resize_percent: Some(0.0),
            ..ScanConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidResize(_))));
    }

    #[test]
    fn test_overrides() {
        let config = ScanConfig::default()
            .with_overrides(Some("sequential"), Some(3))
            .unwrap();
        assert_eq!(config.mode, ExecutionMode::Sequential);
        assert_eq!(config.threads, Some(3));

        let config = config.with_overrides(None, Some(0)).unwrap();
        assert_eq!(config.threads, None);
        assert_eq!(config.mode, ExecutionMode::Sequential);

        assert!(ScanConfig::default().with_overrides(Some("fast"), None).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = ScanConfig::from_path("/nonexistent/barscan.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
