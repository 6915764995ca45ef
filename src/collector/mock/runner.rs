//! Scripted process runner for testing the orchestrator without spawning.

use std::cell::RefCell;
use std::io;

use crate::collector::runner::RawCapture;
use crate::collector::traits::ProcessRunner;

/// A recorded `ProcessRunner::run` call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRun {
    pub command_line: String,
    pub env: Vec<(String, String)>,
}

/// Process runner that returns a canned capture and records every call.
#[derive(Debug)]
pub struct MockRunner {
    response: Result<RawCapture, io::ErrorKind>,
    calls: RefCell<Vec<RecordedRun>>,
}

impl MockRunner {
    /// Runner whose every command produces `capture`.
    pub fn new(capture: RawCapture) -> Self {
        Self {
            response: Ok(capture),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Runner whose command produces only diagnostic `text` and exit status 0.
    pub fn with_stderr(text: impl Into<String>) -> Self {
        Self::new(RawCapture::from_text(text))
    }

    /// Runner that fails to spawn with the given error kind.
    pub fn failing(kind: io::ErrorKind) -> Self {
        Self {
            response: Err(kind),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// All calls made so far.
    pub fn calls(&self) -> Vec<RecordedRun> {
        self.calls.borrow().clone()
    }

    /// Command lines of all calls made so far.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(|c| c.command_line.clone())
            .collect()
    }
}

impl ProcessRunner for MockRunner {
    fn run(&self, command_line: &str, env: &[(String, String)]) -> io::Result<RawCapture> {
        self.calls.borrow_mut().push(RecordedRun {
            command_line: command_line.to_string(),
            env: env.to_vec(),
        });
        match &self.response {
            Ok(capture) => Ok(capture.clone()),
            Err(kind) => Err(io::Error::new(*kind, "mock spawn failure")),
        }
    }
}
