//! Scan pipeline: ingest, execute Blocks, merge, normalize.

/// Collapse raw detections by payload
pub mod dedup;
/// Run Blocks in parallel or sequential mode
pub mod executor;
/// Convert pixel corners into an oriented, normalized box
pub mod normalize;

use log::info;
use serde::Serialize;

use crate::config::ScanConfig;
use crate::decoder::Backends;
use crate::error::{ConfigError, Result};
use crate::models::{ImageInput, NormalizedDetection, SourceImage};

pub use dedup::merge;
pub use executor::{BlockFailure, Execution, ExecutionMode, Executor, run_block};
pub use normalize::normalize;

/// Result of scanning one image
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanReport {
    /// Width of the image the Blocks saw (after resizing)
    pub width: u32,
    /// Height of the image the Blocks saw (after resizing)
    pub height: u32,
    /// Merged, normalized detections in first-occurrence order
    pub detections: Vec<NormalizedDetection>,
    /// Blocks that failed and contributed nothing
    pub failures: Vec<BlockFailure>,
}

/// Configured pipeline, reusable across images
///
/// Holds no per-image state: concurrent calls to [`Scanner::scan`] never
/// share results.
pub struct Scanner {
    config: ScanConfig,
    backends: Backends,
    pool: Option<rayon::ThreadPool>,
}

impl Scanner {
    /// Validate `config` against `backends` and build the worker pool
    pub fn new(config: ScanConfig, backends: Backends) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Executor::new(&backends).resolve(&config.blocks)?;

        let pool = match config.threads {
            Some(threads) if threads > 0 => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("barscan-{i}"))
                    .build()?,
            ),
            _ => None,
        };

        Ok(Self {
            config,
            backends,
            pool,
        })
    }

    /// Scanner with every built-in backend
    pub fn with_config(config: ScanConfig) -> std::result::Result<Self, ConfigError> {
        Self::new(config, Backends::default())
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scan one caller-supplied image
    pub fn scan(&self, input: &ImageInput) -> Result<ScanReport> {
        let image = SourceImage::from_input(input)?;
        self.scan_image(&image)
    }

    /// Scan an already ingested image
    pub fn scan_image(&self, image: &SourceImage) -> Result<ScanReport> {
        let resized;
        let image = match self.config.resize_percent {
            Some(percent) if percent < 100.0 => {
                resized = image
                    .resized(percent)
                    .ok_or(ConfigError::InvalidResize(percent))?;
                &resized
            }
            _ => image,
        };
        let (width, height) = (image.width(), image.height());
        // SourceImage::new and resized both keep every side at least 1 px
        debug_assert!(width > 0 && height > 0);

        let executor = Executor::new(&self.backends);
        let run = || executor.run(image, &self.config.blocks, self.config.mode);
        let execution = match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }?;

        let detections: Vec<_> = merge(&execution.detections)
            .iter()
            .map(|m| normalize(m, width, height))
            .collect();

        info!(
            "scanned {width}x{height}: {} raw, {} merged, {} failed blocks",
            execution.detections.len(),
            detections.len(),
            execution.failures.len()
        );

        Ok(ScanReport {
            width,
            height,
            detections,
            failures: execution.failures,
        })
    }

    /// Scan every image, in order
    ///
    /// Failures are not isolated: the first fatal error aborts the batch and
    /// no report is returned for any image.
    pub fn scan_batch(&self, inputs: &[ImageInput]) -> Result<Vec<ScanReport>> {
        inputs
            .iter()
            .enumerate()
            .map(|(idx, input)| {
                self.scan(input).inspect_err(|err| {
                    log::error!("batch aborted at image {idx}/{}: {err}", inputs.len());
                })
            })
            .collect()
    }
}

impl std::fmt::Debug for Scanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("config", &self.config)
            .field("backends", &self.backends)
            .field("threads", &self.pool.as_ref().map(|p| p.current_num_threads()))
            .finish()
    }
}
