//! Parser for `perf stat` reports.
//!
//! Two report shapes are understood and both are scanned on every parse:
//!
//! - machine CSV (`perf stat -x,`): `value,unit,event,...` per line
//! - human-readable: `42.17 Joules power/energy-pkg/`, `1.00 seconds user`,
//!   `0.50 seconds sys`, `5.00 seconds time elapsed`
//!
//! The grammars are disjoint (CSV needs commas, the human lines are
//! whitespace separated), so a single pass over the lines handles either.
//! Every field is extracted independently; a malformed line only loses the
//! field it would have provided. When a field matches more than once the
//! last match in text order wins.

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use crate::collector::runner::RawCapture;

/// Default energy event: whole-package energy from the RAPL PMU.
pub const DEFAULT_ENERGY_EVENT: &str = "power/energy-pkg/";

/// Values perf prints instead of a number.
const UNAVAILABLE_VALUES: &[&str] = &["<not supported>", "<not counted>"];

const NUMBER: &str = r"([0-9]+(?:\.[0-9]+)?)";

static HUMAN_ENERGY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"{}[ \t]+Joules[ \t]+(\S+)", NUMBER)).expect("valid energy pattern")
});
static HUMAN_USER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"{}[ \t]+seconds[ \t]+user\b", NUMBER)).expect("valid user pattern")
});
static HUMAN_SYS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"{}[ \t]+seconds[ \t]+sys\b", NUMBER)).expect("valid sys pattern")
});
static HUMAN_ELAPSED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"{}[ \t]+seconds[ \t]+time[ \t]+elapsed", NUMBER))
        .expect("valid elapsed pattern")
});

/// Telemetry extracted from a report; every field may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PartialMetrics {
    pub energy_joules: Option<f64>,
    pub user_time_seconds: Option<f64>,
    pub system_time_seconds: Option<f64>,
    pub duration_seconds: Option<f64>,
}

/// Names of the telemetry fields, used when reporting gaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricField {
    Energy,
    UserTime,
    SystemTime,
    Duration,
}

impl MetricField {
    pub const ALL: [MetricField; 4] = [
        MetricField::Energy,
        MetricField::UserTime,
        MetricField::SystemTime,
        MetricField::Duration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricField::Energy => "energy",
            MetricField::UserTime => "user time",
            MetricField::SystemTime => "system time",
            MetricField::Duration => "elapsed time",
        }
    }
}

impl std::fmt::Display for MetricField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialMetrics {
    /// Value of a single field.
    pub fn get(&self, field: MetricField) -> Option<f64> {
        match field {
            MetricField::Energy => self.energy_joules,
            MetricField::UserTime => self.user_time_seconds,
            MetricField::SystemTime => self.system_time_seconds,
            MetricField::Duration => self.duration_seconds,
        }
    }

    /// Fields that were not found in the report.
    pub fn missing_fields(&self) -> Vec<MetricField> {
        MetricField::ALL
            .into_iter()
            .filter(|f| self.get(*f).is_none())
            .collect()
    }

    /// True when nothing at all was extracted.
    pub fn is_empty(&self) -> bool {
        self.missing_fields().len() == MetricField::ALL.len()
    }
}

/// One parsed line of `perf stat -x,` output.
#[derive(Debug, Clone, PartialEq)]
struct CsvCounter<'a> {
    value: f64,
    unit: &'a str,
    event: &'a str,
}

/// Parses a `value,unit,event,...` line.
///
/// Returns `None` for lines with fewer than three fields, unavailable
/// counters and values that are not finite non-negative numbers.
fn parse_csv_line(line: &str) -> Option<CsvCounter<'_>> {
    let mut fields = line.split(',');
    let value = fields.next()?.trim();
    let unit = fields.next()?.trim();
    let event = fields.next()?.trim();

    if UNAVAILABLE_VALUES.contains(&value) {
        trace!(event, value, "skipping unavailable counter");
        return None;
    }

    let value: f64 = value.parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }

    Some(CsvCounter { value, unit, event })
}

/// Converts a time value with a perf unit to seconds.
///
/// perf reports its tool events (`duration_time`, `user_time`,
/// `system_time`) in nanoseconds and leaves the unit empty on older versions.
pub fn to_seconds(value: f64, unit: &str) -> Option<f64> {
    let scale = match unit {
        "" | "ns" | "nsec" => 1e-9,
        "us" | "usec" => 1e-6,
        "ms" | "msec" => 1e-3,
        "s" | "sec" | "seconds" => 1.0,
        _ => return None,
    };
    Some(value * scale)
}

fn last_number(re: &Regex, line: &str) -> Option<f64> {
    re.captures_iter(line)
        .filter_map(|c| c.get(1)?.as_str().parse::<f64>().ok())
        .last()
}

/// Extracts telemetry from perf reports for a given energy event.
#[derive(Debug, Clone)]
pub struct PerfOutputParser {
    energy_event: String,
}

impl Default for PerfOutputParser {
    fn default() -> Self {
        Self::new(DEFAULT_ENERGY_EVENT)
    }
}

impl PerfOutputParser {
    /// Creates a parser matching energy lines whose event contains `energy_event`.
    pub fn new(energy_event: impl Into<String>) -> Self {
        Self {
            energy_event: energy_event.into(),
        }
    }

    pub fn energy_event(&self) -> &str {
        &self.energy_event
    }

    /// Parses the diagnostic text of a capture.
    pub fn parse(&self, capture: &RawCapture) -> PartialMetrics {
        self.parse_text(&capture.text)
    }

    /// Parses raw report text. Pure: the same text always yields the same metrics.
    pub fn parse_text(&self, text: &str) -> PartialMetrics {
        let mut metrics = PartialMetrics::default();
        for line in text.lines() {
            self.apply_line(line, &mut metrics);
        }
        metrics
    }

    fn apply_line(&self, line: &str, metrics: &mut PartialMetrics) {
        if let Some(counter) = parse_csv_line(line) {
            self.apply_csv_counter(&counter, metrics);
            return;
        }

        if let Some(joules) = self.human_energy(line) {
            metrics.energy_joules = Some(joules);
        }
        if let Some(v) = last_number(&HUMAN_USER, line) {
            metrics.user_time_seconds = Some(v);
        }
        if let Some(v) = last_number(&HUMAN_SYS, line) {
            metrics.system_time_seconds = Some(v);
        }
        if let Some(v) = last_number(&HUMAN_ELAPSED, line) {
            metrics.duration_seconds = Some(v);
        }
    }

    fn apply_csv_counter(&self, counter: &CsvCounter<'_>, metrics: &mut PartialMetrics) {
        if counter.event.contains(self.energy_event.as_str()) {
            metrics.energy_joules = Some(counter.value);
            return;
        }

        // Strip event modifiers such as `duration_time:u`.
        let name = counter.event.split(':').next().unwrap_or(counter.event);
        let slot = match name {
            "duration_time" => &mut metrics.duration_seconds,
            "user_time" => &mut metrics.user_time_seconds,
            "system_time" => &mut metrics.system_time_seconds,
            _ => return,
        };
        match to_seconds(counter.value, counter.unit) {
            Some(seconds) => *slot = Some(seconds),
            None => trace!(event = counter.event, unit = counter.unit, "unknown time unit"),
        }
    }

    fn human_energy(&self, line: &str) -> Option<f64> {
        HUMAN_ENERGY
            .captures_iter(line)
            .filter(|c| {
                c.get(2)
                    .is_some_and(|event| event.as_str().contains(self.energy_event.as_str()))
            })
            .filter_map(|c| c.get(1)?.as_str().parse::<f64>().ok())
            .last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::scenarios::{
        PERF_CSV_REPORT, PERF_HUMAN_REPORT, PERF_UNSUPPORTED_REPORT,
    };

    fn parse(text: &str) -> PartialMetrics {
        PerfOutputParser::default().parse_text(text)
    }

    fn assert_close(actual: Option<f64>, expected: f64) {
        let actual = actual.expect("field should be present");
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_csv_energy_line() {
        let metrics = parse("12.5,Joules,power/energy-pkg/,0.00\n");

        assert_eq!(metrics.energy_joules, Some(12.5));
        assert_eq!(metrics.user_time_seconds, None);
        assert_eq!(metrics.duration_seconds, None);
    }

    #[test]
    fn test_csv_not_supported_is_skipped() {
        let metrics = parse("<not supported>,Joules,power/energy-pkg/");
        assert_eq!(metrics.energy_joules, None);

        let metrics = parse(PERF_UNSUPPORTED_REPORT);
        assert!(metrics.is_empty());
    }

    #[test]
    fn test_csv_not_counted_is_skipped() {
        let metrics = parse("<not counted>,Joules,power/energy-pkg/,0,0.00,,\n");
        assert_eq!(metrics.energy_joules, None);
    }

    #[test]
    fn test_csv_unparseable_value_is_skipped() {
        let metrics = parse("abc,Joules,power/energy-pkg/\n7.25,Joules,power/energy-pkg/\n");
        assert_eq!(metrics.energy_joules, Some(7.25));

        let metrics = parse("NaN,Joules,power/energy-pkg/\n");
        assert_eq!(metrics.energy_joules, None);
    }

    #[test]
    fn test_csv_other_events_ignored() {
        let metrics = parse("1234,,cycles,1000,100.00,,\n3.5,Joules,power/energy-cores/,0,100.00,,\n");
        assert!(metrics.is_empty());
    }

    #[test]
    fn test_csv_full_report_normalizes_nanoseconds() {
        let metrics = parse(PERF_CSV_REPORT);

        assert_eq!(metrics.energy_joules, Some(42.17));
        assert_close(metrics.duration_seconds, 5.004123456);
        assert_close(metrics.user_time_seconds, 3.21);
        assert_close(metrics.system_time_seconds, 0.45);
    }

    #[test]
    fn test_csv_time_units() {
        assert_eq!(to_seconds(1500.0, "ms"), Some(1.5));
        assert_eq!(to_seconds(2.0, "s"), Some(2.0));
        assert_close(to_seconds(2_500_000.0, "usec"), 2.5);
        assert_close(to_seconds(1e9, ""), 1.0);
        assert_eq!(to_seconds(1.0, "furlongs"), None);

        let metrics = parse("1500,msec,duration_time,0,100.00,,\n");
        assert_close(metrics.duration_seconds, 1.5);
    }

    #[test]
    fn test_human_readable_report() {
        let metrics = parse(
            "  3.14 Joules power/energy-pkg/\n  1.00 seconds user\n  0.50 seconds sys\n  5.00 seconds time elapsed\n",
        );

        assert_eq!(
            metrics,
            PartialMetrics {
                energy_joules: Some(3.14),
                user_time_seconds: Some(1.00),
                system_time_seconds: Some(0.50),
                duration_seconds: Some(5.00),
            }
        );
    }

    #[test]
    fn test_human_readable_real_perf_layout() {
        let metrics = parse(PERF_HUMAN_REPORT);

        assert_eq!(metrics.energy_joules, Some(42.17));
        assert_close(metrics.duration_seconds, 5.004123456);
        assert_close(metrics.user_time_seconds, 3.21);
        assert_close(metrics.system_time_seconds, 0.45);
    }

    #[test]
    fn test_human_readable_order_independent() {
        let metrics = parse(
            "0.50 seconds sys\nnoise from the command\n5.00 seconds time elapsed\n1.00 seconds user\n3.14 Joules power/energy-pkg/\n",
        );

        assert_eq!(metrics.energy_joules, Some(3.14));
        assert_eq!(metrics.user_time_seconds, Some(1.00));
        assert_eq!(metrics.system_time_seconds, Some(0.50));
        assert_eq!(metrics.duration_seconds, Some(5.00));
    }

    #[test]
    fn test_human_energy_requires_configured_event() {
        let text = "3.14 Joules power/energy-cores/\n";
        assert_eq!(parse(text).energy_joules, None);

        let cores = PerfOutputParser::new("power/energy-cores/");
        assert_eq!(cores.parse_text(text).energy_joules, Some(3.14));
    }

    #[test]
    fn test_empty_text_yields_all_absent() {
        let metrics = parse("");

        assert!(metrics.is_empty());
        assert_eq!(metrics.missing_fields(), MetricField::ALL.to_vec());
    }

    #[test]
    fn test_missing_one_field_keeps_others() {
        let full = "3.14 Joules power/energy-pkg/\n1.00 seconds user\n0.50 seconds sys\n5.00 seconds time elapsed\n";

        for (idx, field) in MetricField::ALL.into_iter().enumerate() {
            let text: String = full
                .lines()
                .enumerate()
                .filter(|(i, _)| *i != idx)
                .map(|(_, l)| format!("{}\n", l))
                .collect();
            let metrics = parse(&text);

            assert_eq!(metrics.missing_fields(), vec![field]);
            for other in MetricField::ALL.into_iter().filter(|f| *f != field) {
                assert!(metrics.get(other).is_some(), "{} lost when {} missing", other, field);
            }
        }
    }

    #[test]
    fn test_malformed_line_does_not_block_others() {
        let metrics = parse(
            "<not supported>,Joules,power/energy-pkg/,0,100.00,,\n1.00 seconds user\ngarbage seconds sys\n",
        );

        assert_eq!(metrics.energy_joules, None);
        assert_eq!(metrics.user_time_seconds, Some(1.00));
        assert_eq!(metrics.system_time_seconds, None);
    }

    #[test]
    fn test_multiple_energy_lines_last_wins() {
        let metrics = parse("1.0,Joules,power/energy-pkg/,0,100.00,,\n2.0,Joules,power/energy-pkg/,0,100.00,,\n");
        assert_eq!(metrics.energy_joules, Some(2.0));

        let metrics = parse("4.0 Joules power/energy-pkg/\n1.5,Joules,power/energy-pkg/,0,100.00,,\n");
        assert_eq!(metrics.energy_joules, Some(1.5));

        let metrics = parse("1.5,Joules,power/energy-pkg/,0,100.00,,\n4.0 Joules power/energy-pkg/\n");
        assert_eq!(metrics.energy_joules, Some(4.0));
    }

    #[test]
    fn test_parse_is_idempotent() {
        let parser = PerfOutputParser::default();
        let capture = RawCapture::from_text(PERF_HUMAN_REPORT);

        let first = parser.parse(&capture);
        let second = parser.parse(&capture);

        assert_eq!(first, second);
    }
}
