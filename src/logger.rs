//! Stderr logger for the `log` facade.
//!
//! Lines look like `[  0.012s  WARN] block 1 (rxing_otsu) failed: ...`.
//! The library itself only uses `log` macros; binaries pick the level.

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

/// Environment variable holding the level name
pub const ENV_LOG: &str = "BARSCAN_LOG";

struct StderrLogger {
    level: LevelFilter,
    started: Instant,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let elapsed = self.started.elapsed().as_secs_f64();
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "[{:7.3}s {:>5}] {}", elapsed, record.level(), record.args());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

/// Install the logger with the provided level filter.
///
/// Only the first call installs anything; later calls keep the first level.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_none() {
        let logger = LOGGER.get_or_init(|| StderrLogger {
            level,
            started: Instant::now(),
        });
        log::set_logger(logger)?;
        log::set_max_level(level);
    }
    Ok(())
}

/// Install the logger at the level named by `BARSCAN_LOG`, `warn` if unset
pub fn init_from_env() -> Result<(), log::SetLoggerError> {
    init_with_level(level_from_env(LevelFilter::Warn))
}

/// Level named by `BARSCAN_LOG`, or `default` when unset or unparsable
pub fn level_from_env(default: LevelFilter) -> LevelFilter {
    std::env::var(ENV_LOG)
        .ok()
        .and_then(|v| v.trim().parse::<LevelFilter>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        assert!(init_with_level(LevelFilter::Debug).is_ok());
        assert!(init_with_level(LevelFilter::Trace).is_ok());
        log::debug!("logger installed");
    }
}
