//! Mock filesystem and process runner for testing.
//!
//! This module provides `MockFs`, `MockRunner` and pre-built scenarios for
//! testing the harness without RAPL access or a `perf` binary.

mod filesystem;
mod runner;
pub mod scenarios;

pub use filesystem::MockFs;
pub use runner::{MockRunner, RecordedRun};
