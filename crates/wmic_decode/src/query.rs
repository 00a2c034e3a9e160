//! Upstream query argument construction.

use crate::framer::{DelimitedFramer, KeyValueFramer, RowFramer};
use std::fmt;
use std::str::FromStr;

/// Text framing requested from the upstream tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Blank-line separated `Name=Value` blocks
    #[default]
    Value,
    /// Header-first comma separated table
    Csv,
}

impl OutputFormat {
    /// Trailing argument tokens that select this framing.
    pub fn format_args(self) -> &'static [&'static str] {
        match self {
            OutputFormat::Value => &["/format:rawxml", "/VALUE"],
            OutputFormat::Csv => &["/format:csv"],
        }
    }

    /// Framer matching this output.
    pub fn framer(self, verbose_diagnostics: bool) -> Box<dyn RowFramer> {
        match self {
            OutputFormat::Value => Box::new(KeyValueFramer),
            OutputFormat::Csv => Box::new(
                DelimitedFramer::for_wmic().with_verbose_diagnostics(verbose_diagnostics),
            ),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Value => write!(f, "value"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "value" | "list" | "kv" => Ok(OutputFormat::Value),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!(
                "Invalid output format: '{}'. Expected: value, csv.",
                s
            )),
        }
    }
}

/// Build the upstream argument list.
///
/// `columns` wins over `schema_fields` when non-empty. A filter clause is
/// wrapped in parentheses unless its first token already starts with `(`
/// and its last token already ends with `)`; each end is checked on its
/// own and no balance analysis is done.
pub fn build_query_args<S: AsRef<str>>(
    class: &str,
    columns: &[S],
    filter: Option<&str>,
    schema_fields: &str,
    format: OutputFormat,
) -> Vec<String> {
    let mut args = vec!["PATH".to_string(), class.to_string()];

    if let Some(filter) = filter.map(str::trim).filter(|f| !f.is_empty()) {
        let parts: Vec<&str> = filter.split_whitespace().collect();
        args.push("WHERE".to_string());
        if !parts.first().is_some_and(|p| p.starts_with('(')) {
            args.push("(".to_string());
        }
        args.extend(parts.iter().map(|p| p.to_string()));
        if !parts.last().is_some_and(|p| p.ends_with(')')) {
            args.push(")".to_string());
        }
    }

    args.push("GET".to_string());
    if columns.is_empty() {
        args.push(schema_fields.to_string());
    } else {
        let joined: Vec<&str> = columns.iter().map(|c| c.as_ref()).collect();
        args.push(joined.join(","));
    }

    args.extend(format.format_args().iter().map(|t| t.to_string()));
    args
}
