//! Process runner for measured commands.
//!
//! Commands are always executed through a shell so callers can pass pipes and
//! redirections. The child's stderr is captured as the diagnostic text (this is
//! where `perf stat` writes its report). Stdout is passed through to the
//! terminal unless the caller asks for it to be captured.

use std::io;
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tracing::debug;

/// Unstructured output of one command run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCapture {
    /// Diagnostic (stderr) output, decoded lossily.
    pub text: String,
    /// Standard output of the command when captured, decoded lossily. Never parsed.
    pub stdout: String,
    /// Exit status; `128 + signal` if the child was killed by a signal.
    pub exit_status: i32,
    /// Wall time observed by the runner between spawn and exit.
    pub wall_time: Duration,
}

impl RawCapture {
    /// Creates a capture holding only diagnostic text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Whether the measured command reported success.
    pub fn succeeded(&self) -> bool {
        self.exit_status == 0
    }
}

/// Spawns `shell -c command_line`, waits for it and captures its output.
///
/// A non-zero exit is returned as data, only spawn/wait failures are errors.
/// With `capture_stdout` unset the child writes straight to our stdout and
/// [`RawCapture::stdout`] stays empty.
pub fn run_shell(
    shell: &str,
    command_line: &str,
    env: &[(String, String)],
    capture_stdout: bool,
) -> io::Result<RawCapture> {
    debug!(shell, command = command_line, "spawning command");

    let mut command = Command::new(shell);
    command
        .arg("-c")
        .arg(command_line)
        .stdin(Stdio::inherit())
        .stdout(if capture_stdout {
            Stdio::piped()
        } else {
            Stdio::inherit()
        })
        .stderr(Stdio::piped());
    for (key, value) in env {
        command.env(key, value);
    }

    let started = Instant::now();
    let output = command.output()?;
    let wall_time = started.elapsed();

    let exit_status = exit_code(output.status);
    debug!(
        exit_status,
        elapsed_ms = wall_time.as_millis() as u64,
        "command finished"
    );

    Ok(RawCapture {
        text: String::from_utf8_lossy(&output.stderr).into_owned(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        exit_status,
        wall_time,
    })
}

/// Normalizes an exit status to an integer the way POSIX shells report it.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    -1
}
