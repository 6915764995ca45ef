//! Telemetry collection for a single measured command.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Measurer                            │
//! │  ┌─────────────────────┐   ┌──────────────────────────────┐  │
//! │  │   EnergyCounter     │   │  ProcessRunner (trait)       │  │
//! │  │  - energy_uj reads  │   │  - sh -c <command>           │  │
//! │  └──────────┬──────────┘   │  - perf stat ... sh -c <cmd> │  │
//! │             │              └──────────────┬───────────────┘  │
//! │      ┌──────▼──────┐                      │ RawCapture       │
//! │      │ FileSystem  │               ┌──────▼───────────┐      │
//! │      └──────┬──────┘               │ PerfOutputParser │      │
//! │             │                      └──────────────────┘      │
//! └─────────────┼────────────────────────────────────────────────┘
//!        ┌──────┴──────┐
//!   ┌────▼────┐   ┌────▼────┐
//!   │ RealFs  │   │ MockFs  │
//!   └─────────┘   └─────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use joulemeter::collector::{EnergyCounter, MockFs};
//!
//! let fs = MockFs::rapl_counter(1_000_000, 3_500_000);
//! let counter = EnergyCounter::new(fs, "/sys/class/powercap/intel-rapl:0/energy_uj");
//! assert_eq!(counter.read().unwrap().value, 1_000_000);
//! ```

pub mod energy;
pub mod invocation;
pub mod mock;
pub mod perf;
pub mod runner;
pub mod traits;

pub use energy::{EnergyCounter, EnergyDelta, EnergySample, energy_delta};
pub use invocation::ToolInvocation;
pub use mock::{MockFs, MockRunner};
pub use perf::{MetricField, PartialMetrics, PerfOutputParser};
pub use runner::RawCapture;
pub use traits::{FileSystem, ProcessRunner, RealFs, ShellRunner};
