//! Row framers: split raw upstream text into per-record field lists.
//!
//! Two framings are supported:
//!
//! - **Key/value blocks** (`/VALUE` output): one `Name=Value` per line,
//!   records separated by blank lines.
//! - **Delimited tables** (`/format:csv` output): a header line of column
//!   names followed by comma separated data lines.
//!
//! Both produce [`RawRow`]s so the decoder treats them the same way.

use crate::error::{DecodeError, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, warn};

/// One upstream record before coercion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based row number used when reporting field errors
    pub number: usize,
    pub fields: Vec<(String, String)>,
}

impl RawRow {
    fn new(number: usize) -> Self {
        Self {
            number,
            fields: Vec::new(),
        }
    }
}

/// Splits a complete text buffer into raw rows.
pub trait RowFramer {
    fn frame(&self, class: &str, text: &str) -> Result<Vec<RawRow>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameState {
    Idle,
    InRow,
}

/// Frames blank-line separated `Name=Value` blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyValueFramer;

impl RowFramer for KeyValueFramer {
    fn frame(&self, _class: &str, text: &str) -> Result<Vec<RawRow>> {
        let mut rows = Vec::new();
        let mut state = FrameState::Idle;
        let mut row_number = 1;
        let mut current = RawRow::new(row_number);

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                if state == FrameState::InRow {
                    rows.push(std::mem::replace(&mut current, RawRow::new(row_number + 1)));
                    row_number += 1;
                    state = FrameState::Idle;
                }
                continue;
            }

            state = FrameState::InRow;
            let Some((name, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            current.fields.push((name.to_string(), value.to_string()));
        }

        // End of input terminates a row that is still open.
        if state == FrameState::InRow {
            rows.push(current);
        }

        Ok(rows)
    }
}

/// Frames header-first comma separated tables.
///
/// Quote characters are removed from every line before parsing, so quoted
/// fields containing commas are not supported. Rows whose field count does
/// not match the header are skipped.
#[derive(Debug, Clone, Default)]
pub struct DelimitedFramer {
    ignored_columns: Vec<String>,
    verbose_diagnostics: bool,
}

impl DelimitedFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Framer for upstream CSV output, which prepends a `Node` column.
    pub fn for_wmic() -> Self {
        Self::new().ignore_column("Node")
    }

    pub fn ignore_column(mut self, name: impl Into<String>) -> Self {
        self.ignored_columns.push(name.into());
        self
    }

    /// Log the raw values of skipped rows at warn level.
    pub fn with_verbose_diagnostics(mut self, enabled: bool) -> Self {
        self.verbose_diagnostics = enabled;
        self
    }

    fn report_skipped(&self, class: &str, row: usize, reason: &str, record: &StringRecord) {
        if self.verbose_diagnostics {
            let values: Vec<&str> = record.iter().collect();
            warn!(class, row, reason, ?values, "Skipping malformed delimited row");
        } else {
            debug!(class, row, reason, "Skipping malformed delimited row");
        }
    }
}

fn strip_quotes(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        cleaned.push_str(&line.trim_end_matches('\r').replace('"', ""));
        cleaned.push('\n');
    }
    cleaned
}

impl RowFramer for DelimitedFramer {
    fn frame(&self, class: &str, text: &str) -> Result<Vec<RawRow>> {
        let cleaned = strip_quotes(text);
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::None)
            .from_reader(cleaned.as_bytes());

        let delimited_err = |source: csv::Error| DecodeError::Delimited {
            class: class.to_string(),
            source,
        };

        let headers: Vec<String> = reader
            .headers()
            .map_err(delimited_err)?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        let keep: Vec<bool> = headers
            .iter()
            .map(|h| !self.ignored_columns.iter().any(|ignored| ignored == h))
            .collect();

        let mut rows = Vec::new();
        let mut record = StringRecord::new();
        let mut row_number = 0;
        loop {
            match reader.read_record(&mut record) {
                Ok(true) => {}
                Ok(false) => break,
                Err(err) => return Err(delimited_err(err)),
            }
            row_number += 1;

            if record.len() != headers.len() {
                let reason = format!(
                    "expected {} fields, found {}",
                    headers.len(),
                    record.len()
                );
                self.report_skipped(class, row_number, &reason, &record);
                continue;
            }

            let mut row = RawRow::new(row_number);
            for ((name, value), keep) in headers.iter().zip(record.iter()).zip(&keep) {
                let value = value.trim_start();
                if !keep || value.is_empty() {
                    continue;
                }
                row.fields.push((name.clone(), value.to_string()));
            }
            rows.push(row);
        }

        Ok(rows)
    }
}
