//! Harness configuration.
//!
//! Everything the orchestrator needs is carried explicitly in
//! [`MeasureConfig`]; nothing is read from globals.

use std::path::PathBuf;
use std::str::FromStr;

use crate::collector::energy::DEFAULT_ACCOUNTING_PATH;
use crate::collector::invocation::ToolInvocation;
use crate::storage::OutputSchema;

/// How energy is accounted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Read the counter file before and after the unwrapped command.
    DirectRead,
    /// Run the command inside the accounting tool and parse its report.
    WrappedTool,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::DirectRead => "direct",
            Strategy::WrappedTool => "perf",
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "direct" | "rapl" | "direct-read" => Ok(Strategy::DirectRead),
            "perf" | "wrapped" | "wrapped-tool" => Ok(Strategy::WrappedTool),
            other => Err(format!(
                "unknown strategy '{}' (expected 'direct' or 'perf')",
                other
            )),
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Environment forced on every measured run so perf prints dot-decimal numbers.
pub fn numeric_locale_env() -> Vec<(String, String)> {
    vec![
        ("LC_ALL".to_string(), "C".to_string()),
        ("LC_NUMERIC".to_string(), "C".to_string()),
    ]
}

/// Configuration of a measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasureConfig {
    /// Energy counter used by the direct-read strategy.
    pub accounting_path: PathBuf,
    pub strategy: Strategy,
    /// Tool template used by the wrapped-tool strategy.
    pub tool: ToolInvocation,
    /// Row layout of the result file.
    pub schema: OutputSchema,
    /// Extra environment for the runner.
    pub env: Vec<(String, String)>,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self::new(Strategy::WrappedTool)
    }
}

impl MeasureConfig {
    /// Default configuration for a strategy.
    pub fn new(strategy: Strategy) -> Self {
        Self {
            accounting_path: PathBuf::from(DEFAULT_ACCOUNTING_PATH),
            strategy,
            tool: ToolInvocation::default(),
            schema: OutputSchema::for_strategy(strategy),
            env: numeric_locale_env(),
        }
    }

    pub fn with_accounting_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.accounting_path = path.into();
        self
    }

    pub fn with_tool(mut self, tool: ToolInvocation) -> Self {
        self.tool = tool;
        self
    }

    pub fn with_schema(mut self, schema: OutputSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Adds (or replaces) a variable in the runner environment.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.env.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.env.push((key, value)),
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("direct".parse::<Strategy>(), Ok(Strategy::DirectRead));
        assert_eq!("RAPL".parse::<Strategy>(), Ok(Strategy::DirectRead));
        assert_eq!("perf".parse::<Strategy>(), Ok(Strategy::WrappedTool));
        assert!("likwid".parse::<Strategy>().is_err());
    }

    #[test]
    fn test_default_config_forces_locale() {
        let config = MeasureConfig::default();

        assert_eq!(config.strategy, Strategy::WrappedTool);
        assert_eq!(config.schema, OutputSchema::Full);
        assert!(config.env.contains(&("LC_NUMERIC".to_string(), "C".to_string())));
        assert!(config.env.contains(&("LC_ALL".to_string(), "C".to_string())));
    }

    #[test]
    fn test_direct_read_uses_simple_schema() {
        let config = MeasureConfig::new(Strategy::DirectRead);
        assert_eq!(config.schema, OutputSchema::Simple);
        assert_eq!(config.accounting_path, PathBuf::from(DEFAULT_ACCOUNTING_PATH));
    }

    #[test]
    fn test_with_env_replaces_existing() {
        let config = MeasureConfig::default()
            .with_env("LC_ALL", "POSIX")
            .with_env("PERF_PAGER", "cat");

        assert!(config.env.contains(&("LC_ALL".to_string(), "POSIX".to_string())));
        assert!(config.env.contains(&("PERF_PAGER".to_string(), "cat".to_string())));
        assert_eq!(config.env.len(), 3);
    }
}
