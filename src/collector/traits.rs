//! Abstractions for filesystem and process access to enable testing and mocking.
//!
//! The `FileSystem` trait lets the accounting reader work with the real sysfs
//! powercap tree or with `MockFs`. The `ProcessRunner` trait does the same for
//! spawning measured commands, so the orchestrator can be driven by
//! `MockRunner` in tests.

use std::io;
use std::path::Path;

use crate::collector::runner::{RawCapture, run_shell};

/// Abstraction for filesystem operations.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a string.
    ///
    /// # Arguments
    /// * `path` - Path to the file to read
    ///
    /// # Returns
    /// The file contents as a string, or an I/O error if the file cannot be read.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Checks if a path exists.
    fn exists(&self, path: &Path) -> bool;
}

/// Real filesystem implementation that delegates to `std::fs`.
///
/// Use this in production to read from the actual `/sys/class/powercap` tree.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    /// Creates a new `RealFs` instance.
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Abstraction for running a shell-interpreted command line.
///
/// Implementations must wait for the command to finish and must not treat a
/// non-zero exit status as an error: only a failure to start the process is
/// reported through `Err`.
pub trait ProcessRunner {
    /// Runs `command_line` through a shell with the extra environment `env`.
    fn run(&self, command_line: &str, env: &[(String, String)]) -> io::Result<RawCapture>;
}

/// Runs commands through `sh -c`.
///
/// The measured command's stdout goes to the terminal by default; see
/// [`with_captured_stdout`](Self::with_captured_stdout).
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: String,
    capture_stdout: bool,
}

impl ShellRunner {
    /// Creates a runner using `/bin/sh`.
    pub fn new() -> Self {
        Self::with_shell("/bin/sh")
    }

    /// Creates a runner using a custom POSIX shell.
    pub fn with_shell(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            capture_stdout: false,
        }
    }

    /// Captures the command's stdout into [`RawCapture::stdout`] instead of
    /// passing it through.
    pub fn with_captured_stdout(mut self, capture: bool) -> Self {
        self.capture_stdout = capture;
        self
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRunner for ShellRunner {
    fn run(&self, command_line: &str, env: &[(String, String)]) -> io::Result<RawCapture> {
        run_shell(&self.shell, command_line, env, self.capture_stdout)
    }
}
