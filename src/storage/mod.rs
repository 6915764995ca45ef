//! Measurement records and their persistent tabular store.

pub mod model;
mod sink;

pub use model::{MeasurementRecord, OutputSchema};
pub use sink::ResultSink;
