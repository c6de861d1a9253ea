//! Block execution
//!
//! Each Block is preprocess + decode on its own copy of the grayscale image,
//! so Blocks share nothing mutable and run as independent rayon tasks.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;
use std::sync::Arc;

use log::{debug, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::decoder::{Backends, Decoder, RawCode};
use crate::error::{BlockError, ConfigError};
use crate::models::{Block, RawDetection, SourceImage};

/// How the Block list is evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ExecutionMode {
    /// Every Block runs; results are concatenated in Block order
    #[default]
    Parallel,
    /// Blocks run in order until one of them finds something
    Sequential,
}

impl ExecutionMode {
    pub fn name(&self) -> &'static str {
        match self {
            ExecutionMode::Parallel => "parallel",
            ExecutionMode::Sequential => "sequential",
        }
    }
}

impl FromStr for ExecutionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "parallel" => Ok(ExecutionMode::Parallel),
            "sequential" => Ok(ExecutionMode::Sequential),
            _ => Err(ConfigError::UnknownMode(s.to_string())),
        }
    }
}

impl TryFrom<String> for ExecutionMode {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A Block that failed and contributed nothing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockFailure {
    pub block_index: usize,
    pub tag: String,
    pub message: String,
}

/// Outcome of one executor run
#[derive(Debug, Clone, Default)]
pub struct Execution {
    /// Raw detections in Block order
    pub detections: Vec<RawDetection>,
    /// Recoverable Block failures
    pub failures: Vec<BlockFailure>,
    /// Number of Blocks that were started
    pub blocks_run: usize,
}

/// Runs a Block list against one image
#[derive(Debug, Clone, Copy)]
pub struct Executor<'a> {
    backends: &'a Backends,
}

impl<'a> Executor<'a> {
    pub fn new(backends: &'a Backends) -> Self {
        Self { backends }
    }

    /// Resolve every Block's backend up front
    ///
    /// Fails on an empty list or on a decoder kind with no registered backend.
    pub fn resolve(&self, blocks: &[Block]) -> Result<Vec<Arc<dyn Decoder>>, ConfigError> {
        if blocks.is_empty() {
            return Err(ConfigError::EmptyBlocks);
        }
        blocks
            .iter()
            .enumerate()
            .map(|(index, block)| {
                self.backends
                    .get(block.decoder)
                    .cloned()
                    .ok_or(ConfigError::MissingBackend {
                        index,
                        kind: block.decoder.name(),
                    })
            })
            .collect()
    }

    /// Evaluate `blocks` against `image`
    ///
    /// Only configuration problems are returned as errors; Block failures are
    /// logged and collected in [`Execution::failures`].
    pub fn run(&self, image: &SourceImage, blocks: &[Block], mode: ExecutionMode) -> Result<Execution, ConfigError> {
        let decoders = self.resolve(blocks)?;

        let execution = match mode {
            ExecutionMode::Parallel => run_parallel(image, blocks, &decoders),
            ExecutionMode::Sequential => run_sequential(image, blocks, &decoders),
        };

        for failure in &execution.failures {
            warn!(
                "block {} ({}) failed: {}",
                failure.block_index, failure.tag, failure.message
            );
        }
        debug!(
            "{mode} run: {}/{} blocks, {} detections, {} failures",
            execution.blocks_run,
            blocks.len(),
            execution.detections.len(),
            execution.failures.len()
        );
        Ok(execution)
    }
}

fn run_parallel(image: &SourceImage, blocks: &[Block], decoders: &[Arc<dyn Decoder>]) -> Execution {
    // indexed collect keeps Block order regardless of completion order
    let outcomes: Vec<_> = blocks
        .par_iter()
        .zip(decoders.par_iter())
        .enumerate()
        .map(|(index, (block, decoder))| run_block(index, block, decoder.as_ref(), image))
        .collect();

    let mut execution = Execution {
        blocks_run: blocks.len(),
        ..Execution::default()
    };
    for (index, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(found) => execution.detections.extend(found),
            Err(err) => execution.failures.push(failure(index, &blocks[index], &err)),
        }
    }
    execution
}

fn run_sequential(image: &SourceImage, blocks: &[Block], decoders: &[Arc<dyn Decoder>]) -> Execution {
    let mut execution = Execution::default();
    for (index, (block, decoder)) in blocks.iter().zip(decoders).enumerate() {
        execution.blocks_run += 1;
        match run_block(index, block, decoder.as_ref(), image) {
            Ok(found) if !found.is_empty() => {
                execution.detections = found;
                break;
            }
            Ok(_) => {}
            Err(err) => execution.failures.push(failure(index, block, &err)),
        }
    }
    execution
}

/// Preprocess and decode for a single Block
///
/// A panic in the preprocessor or the decoder is caught and reported as
/// [`BlockError::Panicked`], so it stays local to this Block.
pub fn run_block(
    index: usize,
    block: &Block,
    decoder: &dyn Decoder,
    image: &SourceImage,
) -> Result<Vec<RawDetection>, BlockError> {
    let tag = block.tag();
    debug!("block {index} ({tag}) started");

    let codes = panic::catch_unwind(AssertUnwindSafe(|| -> Result<Vec<RawCode>, BlockError> {
        let gray = block.preprocessing.transform(image)?;
        Ok(decoder.decode(&gray, &block.options)?)
    }))
    .map_err(|payload| BlockError::Panicked(panic_message(payload.as_ref())))??;

    debug!("block {index} ({tag}) found {}", codes.len());
    Ok(codes
        .into_iter()
        .map(|code| RawDetection {
            symbology: code.symbology,
            payload: code.payload,
            corners: code.corners,
            source_block_index: index,
            source_tag: tag.clone(),
        })
        .collect())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn failure(index: usize, block: &Block, err: &BlockError) -> BlockFailure {
    BlockFailure {
        block_index: index,
        tag: block.tag(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;
    use crate::models::{BlockOptions, ColorSpace, DecoderKind, Preprocessing};
    use serde_json::json;

    fn image() -> SourceImage {
        SourceImage::new(vec![128; 16], 4, 4, ColorSpace::Gray).unwrap()
    }

    fn scripted(texts: &[&str]) -> Block {
        let detections: Vec<_> = texts
            .iter()
            .map(|t| json!({"format": "QR_CODE", "text": t, "corners": [[3, 0], [0, 0], [0, 3], [3, 3]]}))
            .collect();
        Block::new(DecoderKind::Scripted, Preprocessing::Original).with_option("detections", detections)
    }

    fn failing() -> Block {
        Block::new(DecoderKind::Scripted, Preprocessing::Histogram).with_option("fail", "boom")
    }

    fn payloads(execution: &Execution) -> Vec<&str> {
        execution.detections.iter().map(|d| d.payload.as_str()).collect()
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("Sequential".parse::<ExecutionMode>().unwrap(), ExecutionMode::Sequential);
        assert!(matches!(
            "eager".parse::<ExecutionMode>(),
            Err(ConfigError::UnknownMode(m)) if m == "eager"
        ));
        assert_eq!(ExecutionMode::default(), ExecutionMode::Parallel);
    }

    #[test]
    fn test_parallel_keeps_block_order() {
        let backends = Backends::default();
        let blocks = vec![scripted(&["a", "b"]), failing(), scripted(&["c"])];
        let run = Executor::new(&backends)
            .run(&image(), &blocks, ExecutionMode::Parallel)
            .unwrap();

        assert_eq!(payloads(&run), vec!["a", "b", "c"]);
        assert_eq!(run.detections[2].source_block_index, 2);
        assert_eq!(run.blocks_run, 3);
        assert_eq!(run.failures.len(), 1);
        assert_eq!(run.failures[0].block_index, 1);
        assert_eq!(run.failures[0].tag, "scripted_histogram");
        assert!(run.failures[0].message.contains("boom"));
    }

    #[test]
    fn test_sequential_stops_at_first_hit() {
        let backends = Backends::default();
        let blocks = vec![failing(), scripted(&[]), scripted(&["x"]), scripted(&["y"])];
        let run = Executor::new(&backends)
            .run(&image(), &blocks, ExecutionMode::Sequential)
            .unwrap();

        assert_eq!(payloads(&run), vec!["x"]);
        assert_eq!(run.blocks_run, 3);
        assert_eq!(run.failures.len(), 1);
    }

    #[test]
    fn test_sequential_all_empty() {
        let backends = Backends::default();
        let blocks = vec![scripted(&[]), failing()];
        let run = Executor::new(&backends)
            .run(&image(), &blocks, ExecutionMode::Sequential)
            .unwrap();
        assert!(run.detections.is_empty());
        assert_eq!(run.blocks_run, 2);
    }

    #[test]
    fn test_empty_blocks_is_fatal() {
        let backends = Backends::default();
        let err = Executor::new(&backends)
            .run(&image(), &[], ExecutionMode::Parallel)
            .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyBlocks));
    }

    #[test]
    fn test_missing_backend_is_fatal() {
        let backends = Backends::empty();
        let err = Executor::new(&backends)
            .run(&image(), &[scripted(&["a"])], ExecutionMode::Sequential)
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingBackend { index: 0, kind: "scripted" }));
    }

    struct PanickingDecoder;

    impl Decoder for PanickingDecoder {
        fn decode(&self, _image: &image::GrayImage, _options: &BlockOptions) -> Result<Vec<RawCode>, DecodeError> {
            panic!("index out of range in backend");
        }
    }

    fn with_panicking_rxing() -> Backends {
        Backends::default().with(DecoderKind::Rxing, Arc::new(PanickingDecoder))
    }

    #[test]
    fn test_panicking_block_is_contained_in_parallel() {
        let backends = with_panicking_rxing();
        let blocks = vec![
            scripted(&["a"]),
            Block::new(DecoderKind::Rxing, Preprocessing::Original),
            scripted(&["b"]),
        ];
        let run = Executor::new(&backends)
            .run(&image(), &blocks, ExecutionMode::Parallel)
            .unwrap();

        assert_eq!(payloads(&run), vec!["a", "b"]);
        assert_eq!(run.failures.len(), 1);
        assert_eq!(run.failures[0].block_index, 1);
        assert!(run.failures[0].message.contains("index out of range in backend"));
    }

    #[test]
    fn test_panicking_block_is_contained_in_sequential() {
        let backends = with_panicking_rxing();
        let blocks = vec![Block::new(DecoderKind::Rxing, Preprocessing::Otsu), scripted(&["later"])];
        let run = Executor::new(&backends)
            .run(&image(), &blocks, ExecutionMode::Sequential)
            .unwrap();

        assert_eq!(payloads(&run), vec!["later"]);
        assert_eq!(run.blocks_run, 2);
        assert!(run.failures[0].message.starts_with("block panicked"));
    }

    #[test]
    fn test_panic_message() {
        let caught = panic::catch_unwind(|| panic!("plain")).unwrap_err();
        assert_eq!(panic_message(caught.as_ref()), "plain");
        let caught = panic::catch_unwind(|| panic!("formatted {}", 7)).unwrap_err();
        assert_eq!(panic_message(caught.as_ref()), "formatted 7");
    }

    #[test]
    fn test_preprocess_failure_is_recoverable() {
        let backends = Backends::default();
        let image = SourceImage::new(vec![0; 32], 4, 4, ColorSpace::GrayAlpha).unwrap();
        let run = Executor::new(&backends)
            .run(&image, &[scripted(&["a"])], ExecutionMode::Parallel)
            .unwrap();
        assert!(run.detections.is_empty());
        assert!(run.failures[0].message.contains("GRAYA"));
    }
}
