//! Query configuration shared by the client and the command-line tool.

use crate::defaults::{DEFAULT_BINARY, DEFAULT_TIMEOUT, ENV_BINARY, ENV_DEBUG, ENV_TIMEOUT};
use crate::query::OutputFormat;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryConfig {
    /// Upstream binary to invoke
    pub binary: PathBuf,
    /// Time bound used when a call does not pass its own
    pub default_timeout: String,
    /// Framing requested from the upstream tool
    pub format: OutputFormat,
    /// Log raw values of skipped delimited rows
    pub debug: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_BINARY),
            default_timeout: DEFAULT_TIMEOUT.to_string(),
            format: OutputFormat::default(),
            debug: false,
        }
    }
}

impl QueryConfig {
    /// Defaults overridden by `WMIC_BIN`, `WMIC_TIMEOUT` and `WMIC_DEBUG`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(binary) = lookup(ENV_BINARY).filter(|v| !v.trim().is_empty()) {
            config.binary = PathBuf::from(binary);
        }
        if let Some(timeout) = lookup(ENV_TIMEOUT).filter(|v| !v.trim().is_empty()) {
            config.default_timeout = timeout;
        }
        config.debug = lookup(ENV_DEBUG).map(|v| is_truthy(&v)).unwrap_or(false);
        config
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
