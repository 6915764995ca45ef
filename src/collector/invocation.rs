//! Command lines for the external accounting tool.

use crate::collector::perf::DEFAULT_ENERGY_EVENT;

/// Template for wrapping a command in `perf stat`.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    /// Tool binary, `perf` by default.
    pub program: String,
    /// Energy event passed with `-e`.
    pub energy_event: String,
    /// Additional events, e.g. `duration_time` for machine CSV mode.
    pub extra_events: Vec<String>,
    /// Emit machine CSV (`-x,`) instead of the human-readable report.
    pub machine_csv: bool,
    /// Count system wide (`-a`); RAPL events are only available this way.
    pub system_wide: bool,
}

impl Default for ToolInvocation {
    fn default() -> Self {
        Self {
            program: "perf".to_string(),
            energy_event: DEFAULT_ENERGY_EVENT.to_string(),
            extra_events: Vec::new(),
            machine_csv: false,
            system_wide: true,
        }
    }
}

impl ToolInvocation {
    /// Machine CSV template that also asks perf for wall, user and system time.
    pub fn machine_csv() -> Self {
        Self {
            machine_csv: true,
            extra_events: vec![
                "duration_time".to_string(),
                "user_time".to_string(),
                "system_time".to_string(),
            ],
            ..Self::default()
        }
    }

    /// Builds the shell command line measuring `command`.
    ///
    /// The target is handed to a nested `sh -c` so it keeps its own shell
    /// syntax; it is single-quoted for the outer shell.
    pub fn command_line(&self, command: &str) -> String {
        let mut events = vec![self.energy_event.as_str()];
        events.extend(self.extra_events.iter().map(String::as_str));

        let mut parts = vec![shell_quote(&self.program), "stat".to_string()];
        if self.system_wide {
            parts.push("-a".to_string());
        }
        parts.push("-e".to_string());
        parts.push(shell_quote(&events.join(",")));
        if self.machine_csv {
            parts.push("-x,".to_string());
        }
        parts.push("sh".to_string());
        parts.push("-c".to_string());
        parts.push(shell_quote(command));
        parts.join(" ")
    }
}

/// Quotes a word for a POSIX shell.
///
/// Words made only of safe characters are returned unchanged.
pub fn shell_quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@%+,".contains(c));
    if safe {
        return word.to_string();
    }
    format!("'{}'", word.replace('\'', r"'\''"))
}
