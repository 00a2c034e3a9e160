//! Canonical default values and environment variable names.

/// Time bound applied when a query does not pass one.
pub const DEFAULT_TIMEOUT: &str = "30m";
/// Upstream query binary.
pub const DEFAULT_BINARY: &str = "wmic";

pub const ENV_BINARY: &str = "WMIC_BIN";
pub const ENV_TIMEOUT: &str = "WMIC_TIMEOUT";
pub const ENV_DEBUG: &str = "WMIC_DEBUG";
