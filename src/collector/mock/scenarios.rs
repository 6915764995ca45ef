//! Pre-built accounting scenarios for testing.
//!
//! Reports are copied from `perf stat` runs on an Intel package with the
//! `power/energy-pkg/` event, trimmed to what the parser cares about.

use super::filesystem::MockFs;
use super::runner::MockRunner;
use crate::collector::energy::DEFAULT_ACCOUNTING_PATH;
use crate::collector::runner::RawCapture;
use std::time::Duration;

/// Human-readable `perf stat -a -e power/energy-pkg/` report.
pub const PERF_HUMAN_REPORT: &str = "

 Performance counter stats for 'system wide':

             42.17 Joules power/energy-pkg/

       5.004123456 seconds time elapsed

       3.210000000 seconds user
       0.450000000 seconds sys

";

/// Machine-readable `perf stat -x, -e power/energy-pkg/,duration_time,user_time,system_time` report.
pub const PERF_CSV_REPORT: &str = "\
42.17,Joules,power/energy-pkg/,5004123456,100.00,,
5004123456,ns,duration_time,5004123456,100.00,,
3210000000,ns,user_time,5004123456,100.00,,
450000000,ns,system_time,5004123456,100.00,,
";

/// Report of a host without RAPL support in perf.
pub const PERF_UNSUPPORTED_REPORT: &str = "\
<not supported>,Joules,power/energy-pkg/,0,100.00,,
";

#[allow(dead_code)]
impl MockFs {
    /// RAPL package counter advancing from `start` to `end` microjoules.
    pub fn rapl_counter(start: u64, end: u64) -> Self {
        let mut fs = Self::new();
        fs.add_counter(DEFAULT_ACCOUNTING_PATH, &[start, end]);
        fs
    }
}

#[allow(dead_code)]
impl MockRunner {
    /// Successful run with a human-readable perf report.
    pub fn perf_human() -> Self {
        Self::with_stderr(PERF_HUMAN_REPORT)
    }

    /// Successful run with a machine-readable perf report.
    pub fn perf_csv() -> Self {
        Self::with_stderr(PERF_CSV_REPORT)
    }

    /// Measured command exits with `status`, perf still reports.
    pub fn perf_failed_command(status: i32) -> Self {
        Self::new(RawCapture {
            text: format!("make: *** [test] Error {}\n{}", status, PERF_HUMAN_REPORT),
            stdout: String::new(),
            exit_status: status,
            wall_time: Duration::from_millis(5004),
        })
    }

    /// Plain command run (direct-read strategy) taking `wall_time`.
    pub fn plain(exit_status: i32, wall_time: Duration) -> Self {
        Self::new(RawCapture {
            text: String::new(),
            stdout: "ok\n".to_string(),
            exit_status,
            wall_time,
        })
    }
}
