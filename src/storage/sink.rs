//! Append-only CSV result file.
//!
//! The header row is written when the file is created (or found empty);
//! later runs only append rows, and only under a matching header. A single
//! writer per file is assumed.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::model::{FullRow, MeasurementRecord, OutputSchema, SimpleRow};
use crate::error::MeasureError;

/// Persistent tabular store for measurement records.
#[derive(Debug, Clone)]
pub struct ResultSink {
    path: PathBuf,
    schema: OutputSchema,
}

impl ResultSink {
    pub fn new(path: impl Into<PathBuf>, schema: OutputSchema) -> Self {
        Self {
            path: path.into(),
            schema,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema(&self) -> OutputSchema {
        self.schema
    }

    /// Appends one record, writing the header first if the file is new.
    ///
    /// Fails without writing if the file already starts with the header of
    /// another schema.
    pub fn append(&self, record: &MeasurementRecord) -> Result<(), MeasureError> {
        let write_header = fs::metadata(&self.path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);
        if !write_header {
            self.check_header()?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.error(e))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if write_header {
            debug!(path = %self.path.display(), "writing result header");
            writer
                .write_record(self.schema.header())
                .map_err(|e| self.error(e))?;
        }

        let written = match self.schema {
            OutputSchema::Full => writer.serialize(FullRow::from(record)),
            OutputSchema::Simple => writer.serialize(SimpleRow::from(record)),
        };
        written.map_err(|e| self.error(e))?;

        writer.flush().map_err(|e| self.error(e))
    }

    fn check_header(&self) -> Result<(), MeasureError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(&self.path)
            .map_err(|e| self.error(e))?;

        let mut existing = csv::StringRecord::new();
        reader
            .read_record(&mut existing)
            .map_err(|e| self.error(e))?;

        let expected = self.schema.header();
        if existing.iter().ne(expected.iter().copied()) {
            return Err(self.error(format!(
                "existing header '{}' does not match the {:?} layout '{}'",
                existing.iter().collect::<Vec<_>>().join(","),
                self.schema,
                expected.join(",")
            )));
        }
        Ok(())
    }

    fn error(&self, reason: impl ToString) -> MeasureError {
        MeasureError::Sink {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}
