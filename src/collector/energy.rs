//! Accounting reader for cumulative energy counters.
//!
//! Reads a powercap/RAPL style counter file holding a single non-negative
//! integer in microjoules, e.g. `/sys/class/powercap/intel-rapl:0/energy_uj`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::debug;

use crate::collector::traits::FileSystem;
use crate::error::{MeasureError, ParseError};

/// Default counter: package 0 of the Intel RAPL powercap driver.
pub const DEFAULT_ACCOUNTING_PATH: &str = "/sys/class/powercap/intel-rapl:0/energy_uj";

/// Microjoules per joule.
pub const MICROJOULES_PER_JOULE: f64 = 1_000_000.0;

/// A single counter reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergySample {
    /// Counter value in microjoules.
    pub value: u64,
    /// When the counter was read.
    pub timestamp: Instant,
}

/// Energy consumed between two samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyDelta {
    /// Consumed energy in joules, never negative.
    pub joules: f64,
    /// The end reading was below the start reading; `joules` was clamped to 0.
    pub wrapped: bool,
}

/// Parses counter file content into microjoules.
pub fn parse_counter(content: &str) -> Result<u64, ParseError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(ParseError::new("empty counter"));
    }
    trimmed
        .parse::<u64>()
        .map_err(|_| ParseError::new(format!("invalid counter value '{}'", trimmed)))
}

/// Computes the energy between two samples.
///
/// Counter wrap (end < start) yields zero joules with `wrapped` set.
pub fn energy_delta(start: &EnergySample, end: &EnergySample) -> EnergyDelta {
    match end.value.checked_sub(start.value) {
        Some(microjoules) => EnergyDelta {
            joules: microjoules as f64 / MICROJOULES_PER_JOULE,
            wrapped: false,
        },
        None => EnergyDelta {
            joules: 0.0,
            wrapped: true,
        },
    }
}

/// Reads the cumulative energy counter from a fixed path.
pub struct EnergyCounter<F: FileSystem> {
    fs: F,
    path: PathBuf,
}

impl<F: FileSystem> EnergyCounter<F> {
    /// Creates a new counter reader.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `path` - Counter file, usually [`DEFAULT_ACCOUNTING_PATH`]
    pub fn new(fs: F, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
        }
    }

    /// Path of the counter file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the counter file is present.
    pub fn is_available(&self) -> bool {
        self.fs.exists(&self.path)
    }

    /// Reads the current counter value.
    pub fn read(&self) -> Result<EnergySample, MeasureError> {
        let content = self
            .fs
            .read_to_string(&self.path)
            .map_err(|e| MeasureError::accounting(&self.path, e))?;
        let value = parse_counter(&content).map_err(|e| MeasureError::accounting(&self.path, e.message))?;
        debug!(path = %self.path.display(), value, "read energy counter");

        Ok(EnergySample {
            value,
            timestamp: Instant::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockFs;

    fn sample(value: u64) -> EnergySample {
        EnergySample {
            value,
            timestamp: Instant::now(),
        }
    }

    #[test]
    fn test_parse_counter() {
        assert_eq!(parse_counter("123456789\n"), Ok(123456789));
        assert_eq!(parse_counter("  42  "), Ok(42));
    }

    #[test]
    fn test_parse_counter_rejects_garbage() {
        assert!(parse_counter("").is_err());
        assert!(parse_counter("-5").is_err());
        assert!(parse_counter("12.5").is_err());
        assert!(parse_counter("abc").is_err());
    }

    #[test]
    fn test_energy_delta_converts_to_joules() {
        let delta = energy_delta(&sample(1_000_000), &sample(3_500_000));
        assert_eq!(delta.joules, 2.5);
        assert!(!delta.wrapped);
    }

    #[test]
    fn test_energy_delta_exact_for_many_pairs() {
        for (start, end) in [(0u64, 0u64), (0, 1), (7, 1_000_007), (u64::MAX - 10, u64::MAX)] {
            let delta = energy_delta(&sample(start), &sample(end));
            assert_eq!(delta.joules, (end - start) as f64 / 1_000_000.0);
            assert!(!delta.wrapped);
        }
    }

    #[test]
    fn test_energy_delta_wrap_clamps_to_zero() {
        let delta = energy_delta(&sample(5_000_000), &sample(100));
        assert_eq!(delta.joules, 0.0);
        assert!(delta.wrapped);
    }

    #[test]
    fn test_read_counter() {
        let mut fs = MockFs::new();
        fs.add_file(DEFAULT_ACCOUNTING_PATH, "987654\n");
        let counter = EnergyCounter::new(fs, DEFAULT_ACCOUNTING_PATH);

        assert!(counter.is_available());
        assert_eq!(counter.read().unwrap().value, 987654);
    }

    #[test]
    fn test_read_missing_counter_is_unavailable() {
        let counter = EnergyCounter::new(MockFs::new(), DEFAULT_ACCOUNTING_PATH);

        assert!(!counter.is_available());
        assert!(matches!(
            counter.read(),
            Err(MeasureError::AccountingUnavailable { .. })
        ));
    }

    #[test]
    fn test_read_non_numeric_counter_is_unavailable() {
        let mut fs = MockFs::new();
        fs.add_file(DEFAULT_ACCOUNTING_PATH, "not a number\n");
        let counter = EnergyCounter::new(fs, DEFAULT_ACCOUNTING_PATH);

        match counter.read() {
            Err(MeasureError::AccountingUnavailable { path, reason }) => {
                assert_eq!(path, PathBuf::from(DEFAULT_ACCOUNTING_PATH));
                assert!(reason.contains("not a number"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
