//! Console formatting for measurement summaries.

use crate::measure::Measurement;

/// Format an energy amount with a readable unit.
///
/// `"850.0 mJ"`, `"12.50 J"`, `"3.20 kJ"`
pub fn format_energy(joules: f64) -> String {
    if joules >= 1000.0 {
        format!("{:.2} kJ", joules / 1000.0)
    } else if joules > 0.0 && joules < 1.0 {
        format!("{:.1} mJ", joules * 1000.0)
    } else {
        format!("{:.2} J", joules)
    }
}

/// Format seconds with millisecond precision, `"1m 5.250s"` past a minute.
pub fn format_seconds(secs: f64) -> String {
    if secs >= 60.0 {
        let minutes = (secs / 60.0).floor();
        format!("{}m {:.3}s", minutes as u64, secs - minutes * 60.0)
    } else {
        format!("{:.3}s", secs)
    }
}

/// Multi-line summary printed to stdout after a measurement.
pub fn format_summary(measurement: &Measurement) -> String {
    let record = &measurement.record;
    let mut lines = vec![
        format!("Command:  {}", record.command),
        format!(
            "Energy:   {} ({:.2} W avg)",
            format_energy(record.energy_joules),
            record.average_watts()
        ),
        format!("Elapsed:  {}", format_seconds(record.duration_seconds)),
    ];
    if record.user_time_seconds > 0.0 || record.system_time_seconds > 0.0 {
        lines.push(format!(
            "CPU:      {} user, {} sys",
            format_seconds(record.user_time_seconds),
            format_seconds(record.system_time_seconds)
        ));
    }
    if measurement.exit_status != 0 {
        lines.push(format!("Exit:     {}", measurement.exit_status));
    }
    for warning in &measurement.warnings {
        lines.push(format!("Warning:  {}", warning));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::perf::{MetricField, PartialMetrics};
    use crate::config::Strategy;
    use crate::measure::MeasureWarning;
    use crate::storage::MeasurementRecord;
    use chrono::Utc;

    #[test]
    fn test_format_energy() {
        assert_eq!(format_energy(0.0), "0.00 J");
        assert_eq!(format_energy(0.85), "850.0 mJ");
        assert_eq!(format_energy(12.5), "12.50 J");
        assert_eq!(format_energy(3200.0), "3.20 kJ");
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(5.0), "5.000s");
        assert_eq!(format_seconds(65.25), "1m 5.250s");
    }

    #[test]
    fn test_format_summary() {
        let metrics = PartialMetrics {
            energy_joules: Some(10.0),
            duration_seconds: Some(4.0),
            ..PartialMetrics::default()
        };
        let measurement = Measurement {
            record: MeasurementRecord::from_partial(Utc::now(), "make test", &metrics),
            exit_status: 1,
            strategy: Strategy::WrappedTool,
            warnings: vec![MeasureWarning::PartialTelemetry {
                missing: vec![MetricField::UserTime, MetricField::SystemTime],
            }],
        };

        let summary = format_summary(&measurement);

        assert!(summary.contains("Command:  make test"));
        assert!(summary.contains("Energy:   10.00 J (2.50 W avg)"));
        assert!(summary.contains("Elapsed:  4.000s"));
        assert!(!summary.contains("CPU:"));
        assert!(summary.contains("Exit:     1"));
        assert!(summary.contains("Warning:  missing user time, system time"));
    }
}
