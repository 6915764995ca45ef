//! Row structures for the result file.
//!
//! A [`MeasurementRecord`] always carries every field; absent telemetry is
//! stored as `0`. The on-disk layout is selected by [`OutputSchema`].

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::collector::perf::PartialMetrics;
use crate::config::Strategy;

/// Normalized result of one measured command.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRecord {
    /// When the measurement started.
    pub timestamp: DateTime<Utc>,
    /// The exact command line that was measured.
    pub command: String,
    pub energy_joules: f64,
    pub user_time_seconds: f64,
    pub system_time_seconds: f64,
    pub duration_seconds: f64,
}

impl MeasurementRecord {
    /// Builds a record, defaulting every absent field to zero.
    pub fn from_partial(
        timestamp: DateTime<Utc>,
        command: impl Into<String>,
        metrics: &PartialMetrics,
    ) -> Self {
        Self {
            timestamp,
            command: command.into(),
            energy_joules: non_negative(metrics.energy_joules),
            user_time_seconds: non_negative(metrics.user_time_seconds),
            system_time_seconds: non_negative(metrics.system_time_seconds),
            duration_seconds: non_negative(metrics.duration_seconds),
        }
    }

    /// Average power over the run in watts, 0 when the duration is unknown.
    pub fn average_watts(&self) -> f64 {
        if self.duration_seconds > 0.0 {
            self.energy_joules / self.duration_seconds
        } else {
            0.0
        }
    }
}

fn non_negative(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite() && *v >= 0.0).unwrap_or(0.0)
}

/// Column layout of the result file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputSchema {
    /// `timestamp,command,energy_joules,user_time,system_time,duration_time`
    Full,
    /// `command,energy_joules,duration_seconds`
    Simple,
}

impl OutputSchema {
    /// Schema the strategy produces by default.
    pub fn for_strategy(strategy: Strategy) -> Self {
        match strategy {
            Strategy::DirectRead => OutputSchema::Simple,
            Strategy::WrappedTool => OutputSchema::Full,
        }
    }

    /// Header row written once at the top of the file.
    pub fn header(&self) -> &'static [&'static str] {
        match self {
            OutputSchema::Full => &[
                "timestamp",
                "command",
                "energy_joules",
                "user_time",
                "system_time",
                "duration_time",
            ],
            OutputSchema::Simple => &["command", "energy_joules", "duration_seconds"],
        }
    }
}

impl FromStr for OutputSchema {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "full" => Ok(OutputSchema::Full),
            "simple" => Ok(OutputSchema::Simple),
            other => Err(format!(
                "unknown schema '{}' (expected 'full' or 'simple')",
                other
            )),
        }
    }
}

/// Serialized row for [`OutputSchema::Full`].
#[derive(Debug, Serialize)]
pub(crate) struct FullRow<'a> {
    pub timestamp: String,
    pub command: &'a str,
    pub energy_joules: f64,
    pub user_time: f64,
    pub system_time: f64,
    pub duration_time: f64,
}

/// Serialized row for [`OutputSchema::Simple`].
#[derive(Debug, Serialize)]
pub(crate) struct SimpleRow<'a> {
    pub command: &'a str,
    pub energy_joules: f64,
    pub duration_seconds: f64,
}

impl<'a> From<&'a MeasurementRecord> for FullRow<'a> {
    fn from(record: &'a MeasurementRecord) -> Self {
        Self {
            timestamp: record.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            command: &record.command,
            energy_joules: record.energy_joules,
            user_time: record.user_time_seconds,
            system_time: record.system_time_seconds,
            duration_time: record.duration_seconds,
        }
    }
}

impl<'a> From<&'a MeasurementRecord> for SimpleRow<'a> {
    fn from(record: &'a MeasurementRecord) -> Self {
        Self {
            command: &record.command,
            energy_joules: record.energy_joules,
            duration_seconds: record.duration_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_from_partial_defaults_absent_fields() {
        let metrics = PartialMetrics {
            energy_joules: Some(12.5),
            duration_seconds: Some(3.0),
            ..PartialMetrics::default()
        };
        let record = MeasurementRecord::from_partial(ts(), "make", &metrics);

        assert_eq!(record.command, "make");
        assert_eq!(record.energy_joules, 12.5);
        assert_eq!(record.user_time_seconds, 0.0);
        assert_eq!(record.system_time_seconds, 0.0);
        assert_eq!(record.duration_seconds, 3.0);
    }

    #[test]
    fn test_from_partial_rejects_invalid_values() {
        let metrics = PartialMetrics {
            energy_joules: Some(-1.0),
            user_time_seconds: Some(f64::NAN),
            ..PartialMetrics::default()
        };
        let record = MeasurementRecord::from_partial(ts(), "x", &metrics);

        assert_eq!(record.energy_joules, 0.0);
        assert_eq!(record.user_time_seconds, 0.0);
    }

    #[test]
    fn test_average_watts() {
        let metrics = PartialMetrics {
            energy_joules: Some(50.0),
            duration_seconds: Some(2.0),
            ..PartialMetrics::default()
        };
        assert_eq!(MeasurementRecord::from_partial(ts(), "x", &metrics).average_watts(), 25.0);
        assert_eq!(
            MeasurementRecord::from_partial(ts(), "x", &PartialMetrics::default()).average_watts(),
            0.0
        );
    }

    #[test]
    fn test_full_row_timestamp_format() {
        let record = MeasurementRecord::from_partial(ts(), "x", &PartialMetrics::default());
        let row = FullRow::from(&record);
        assert_eq!(row.timestamp, "2026-10-16T12:00:00Z");
    }

    #[test]
    fn test_schema_headers() {
        assert_eq!(OutputSchema::Full.header().len(), 6);
        assert_eq!(
            OutputSchema::Simple.header(),
            &["command", "energy_joules", "duration_seconds"]
        );
        assert_eq!("SIMPLE".parse::<OutputSchema>(), Ok(OutputSchema::Simple));
        assert!("wide".parse::<OutputSchema>().is_err());
    }
}
