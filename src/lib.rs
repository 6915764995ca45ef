//! joulemeter - energy measurement harness library.
//!
//! Runs a command, reads energy/time telemetry for that single invocation
//! (RAPL counter file or `perf stat` report) and records one normalized row.
//!
//! Provides:
//! - `collector` - accounting reader, process runner, perf output parser
//! - `measure` - orchestrator that turns one command into one record
//! - `storage` - measurement record and CSV result sink
//! - `config` - explicit harness configuration
//! - `fmt` - console summary formatting

pub mod collector;
pub mod config;
pub mod error;
pub mod fmt;
pub mod measure;
pub mod storage;

pub use config::{MeasureConfig, Strategy};
pub use error::MeasureError;
pub use measure::{Measurement, MeasureWarning, Measurer};
pub use storage::{MeasurementRecord, OutputSchema, ResultSink};
