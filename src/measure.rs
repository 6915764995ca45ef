//! Measurement orchestrator.
//!
//! Turns one command into one [`MeasurementRecord`]. Each call walks through
//!
//! ```text
//! Idle → ReadingBaseline (direct-read only) → Running → ParsingOutput → Finalized
//!                                    └──────── infrastructure failure ──→ Aborted
//! ```
//!
//! A failing measured command is still measured: its exit status is kept
//! next to the record. Only infrastructure failures (counter unreadable,
//! process not startable) abort. Telemetry gaps become [`MeasureWarning`]s.

use std::io;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::collector::energy::{EnergyCounter, energy_delta};
use crate::collector::perf::{MetricField, PartialMetrics, PerfOutputParser};
use crate::collector::runner::RawCapture;
use crate::collector::traits::{FileSystem, ProcessRunner};
use crate::config::{MeasureConfig, Strategy};
use crate::error::MeasureError;
use crate::storage::MeasurementRecord;

/// Shell exit codes for "command not found" and "not executable".
const EXIT_NOT_FOUND: i32 = 127;
const EXIT_NOT_EXECUTABLE: i32 = 126;

/// Progress of a single measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    ReadingBaseline,
    Running,
    ParsingOutput,
    Finalized,
    Aborted,
}

/// Non-fatal conditions raised while measuring.
#[derive(Debug, Clone, PartialEq)]
pub enum MeasureWarning {
    /// The counter went backwards; energy was clamped to 0.
    CounterWrapped { start: u64, end: u64 },
    /// Fields absent from the tool report; they were recorded as 0.
    PartialTelemetry { missing: Vec<MetricField> },
}

impl std::fmt::Display for MeasureWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeasureWarning::CounterWrapped { start, end } => write!(
                f,
                "energy counter wrapped ({} -> {} uJ), energy recorded as 0",
                start, end
            ),
            MeasureWarning::PartialTelemetry { missing } => {
                let names: Vec<&str> = missing.iter().map(MetricField::as_str).collect();
                write!(f, "missing {} in tool output, recorded as 0", names.join(", "))
            }
        }
    }
}

/// Outcome of one measured command.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub record: MeasurementRecord,
    /// Exit status of the measured command (or of the wrapping tool).
    pub exit_status: i32,
    pub strategy: Strategy,
    pub warnings: Vec<MeasureWarning>,
}

/// Sequences the accounting reader, runner and parser.
pub struct Measurer<F: FileSystem, R: ProcessRunner> {
    config: MeasureConfig,
    counter: EnergyCounter<F>,
    runner: R,
    parser: PerfOutputParser,
    phase: Phase,
}

impl<F: FileSystem, R: ProcessRunner> Measurer<F, R> {
    /// Creates an orchestrator.
    ///
    /// # Arguments
    /// * `config` - Strategy, counter path, tool template and environment
    /// * `fs` - Filesystem used for counter reads (real or mock)
    /// * `runner` - Process runner (real or mock)
    pub fn new(config: MeasureConfig, fs: F, runner: R) -> Self {
        let counter = EnergyCounter::new(fs, config.accounting_path.clone());
        let parser = PerfOutputParser::new(config.tool.energy_event.clone());
        Self {
            config,
            counter,
            runner,
            parser,
            phase: Phase::Idle,
        }
    }

    pub fn config(&self) -> &MeasureConfig {
        &self.config
    }

    /// Phase reached by the last call to [`measure`](Self::measure).
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Measures `command` once with the configured strategy.
    pub fn measure(&mut self, command: &str) -> Result<Measurement, MeasureError> {
        self.phase = Phase::Idle;
        let timestamp = Utc::now();
        debug!(command, strategy = %self.config.strategy, "starting measurement");

        let result = match self.config.strategy {
            Strategy::DirectRead => self.measure_direct(command),
            Strategy::WrappedTool => self.measure_wrapped(command),
        };

        match result {
            Ok((metrics, capture, warnings)) => {
                self.enter(Phase::Finalized);
                if !capture.succeeded() {
                    warn!(
                        exit_status = capture.exit_status,
                        "measured command exited with non-zero status"
                    );
                }
                let record = MeasurementRecord::from_partial(timestamp, command, &metrics);
                info!(
                    command,
                    energy_joules = record.energy_joules,
                    duration_seconds = record.duration_seconds,
                    exit_status = capture.exit_status,
                    "measurement complete"
                );
                Ok(Measurement {
                    record,
                    exit_status: capture.exit_status,
                    strategy: self.config.strategy,
                    warnings,
                })
            }
            Err(e) => {
                self.enter(Phase::Aborted);
                Err(e)
            }
        }
    }

    fn measure_direct(
        &mut self,
        command: &str,
    ) -> Result<(PartialMetrics, RawCapture, Vec<MeasureWarning>), MeasureError> {
        self.enter(Phase::ReadingBaseline);
        let start = self.counter.read()?;

        self.enter(Phase::Running);
        let capture = self.run(command)?;
        let end = self.counter.read()?;

        self.enter(Phase::ParsingOutput);
        let mut warnings = Vec::new();
        let delta = energy_delta(&start, &end);
        if delta.wrapped {
            let warning = MeasureWarning::CounterWrapped {
                start: start.value,
                end: end.value,
            };
            warn!("{}", warning);
            warnings.push(warning);
        }

        let metrics = PartialMetrics {
            energy_joules: Some(delta.joules),
            duration_seconds: Some(capture.wall_time.as_secs_f64()),
            ..PartialMetrics::default()
        };
        Ok((metrics, capture, warnings))
    }

    fn measure_wrapped(
        &mut self,
        command: &str,
    ) -> Result<(PartialMetrics, RawCapture, Vec<MeasureWarning>), MeasureError> {
        self.enter(Phase::Running);
        let command_line = self.config.tool.command_line(command);
        let capture = self.run(&command_line)?;

        self.enter(Phase::ParsingOutput);
        let metrics = self.parser.parse(&capture);

        if self.tool_missing(&capture) {
            let kind = if capture.exit_status == EXIT_NOT_FOUND {
                io::ErrorKind::NotFound
            } else {
                io::ErrorKind::PermissionDenied
            };
            return Err(MeasureError::ProcessSpawn {
                command: command_line,
                source: io::Error::new(kind, capture.text.trim().to_string()),
            });
        }

        let mut warnings = Vec::new();
        let missing = metrics.missing_fields();
        if !missing.is_empty() {
            let warning = MeasureWarning::PartialTelemetry { missing };
            warn!("{}", warning);
            warnings.push(warning);
        }
        Ok((metrics, capture, warnings))
    }

    /// Whether the shell could not start the tool itself, as opposed to the
    /// measured command inside it.
    fn tool_missing(&self, capture: &RawCapture) -> bool {
        if !matches!(capture.exit_status, EXIT_NOT_FOUND | EXIT_NOT_EXECUTABLE) {
            return false;
        }
        // Any report line, even `<not supported>`, means the tool ran.
        if capture.text.contains(self.config.tool.energy_event.as_str()) {
            return false;
        }
        let prefix = format!("{}: ", self.config.tool.program);
        capture.text.lines().any(|line| {
            line.find(&prefix).is_some_and(|at| {
                let starts_word = line[..at].ends_with(char::is_whitespace) || at == 0;
                let reason = &line[at + prefix.len()..];
                starts_word
                    && (reason.contains("not found")
                        || reason.contains("No such file")
                        || reason.contains("Permission denied"))
            })
        })
    }

    fn run(&self, command_line: &str) -> Result<RawCapture, MeasureError> {
        let capture = self
            .runner
            .run(command_line, &self.config.env)
            .map_err(|source| MeasureError::ProcessSpawn {
                command: command_line.to_string(),
                source,
            })?;
        if !capture.stdout.is_empty() {
            debug!(stdout = %capture.stdout.trim_end(), "measured command output");
        }
        Ok(capture)
    }

    fn enter(&mut self, phase: Phase) {
        debug!(from = ?self.phase, to = ?phase, "measurement phase");
        self.phase = phase;
    }
}
