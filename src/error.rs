//! Infrastructure errors that abort a measurement.
//!
//! Telemetry gaps are not errors: they are reported as
//! [`MeasureWarning`](crate::measure::MeasureWarning) values alongside a
//! complete record.

use std::io;
use std::path::PathBuf;

/// Error type for parsing an accounting counter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Fatal failures of the measurement infrastructure.
#[derive(Debug)]
pub enum MeasureError {
    /// Counter path missing, unreadable or not a non-negative integer.
    AccountingUnavailable { path: PathBuf, reason: String },
    /// The measured command or the accounting tool could not be started.
    ProcessSpawn { command: String, source: io::Error },
    /// The result row could not be written.
    Sink { path: PathBuf, reason: String },
}

impl MeasureError {
    pub(crate) fn accounting(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        MeasureError::AccountingUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

impl std::fmt::Display for MeasureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeasureError::AccountingUnavailable { path, reason } => {
                write!(f, "accounting counter {} unavailable: {}", path.display(), reason)
            }
            MeasureError::ProcessSpawn { command, source } => {
                write!(f, "failed to start '{}': {}", command, source)
            }
            MeasureError::Sink { path, reason } => {
                write!(f, "failed to write results to {}: {}", path.display(), reason)
            }
        }
    }
}

impl std::error::Error for MeasureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MeasureError::ProcessSpawn { source, .. } => Some(source),
            _ => None,
        }
    }
}
