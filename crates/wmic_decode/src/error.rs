//! Error types for decoding and querying.
//!
//! Two tiers: [`RecordError`] is a recoverable per-field failure collected
//! alongside decoded records, [`DecodeError`] and [`QueryError`] abort the
//! whole call and discard partial results.

use serde::Serialize;
use std::fmt;
use std::io;
use thiserror::Error;

/// A field whose raw value could not be coerced into its declared type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordError {
    pub class: String,
    pub field: String,
    /// Row number assigned by the framer (1-based)
    pub row: usize,
    pub message: String,
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} (row {}): {}",
            self.class, self.field, self.row, self.message
        )
    }
}

/// Unrecoverable decode failure.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Cannot find field {field} on {type_name}, names are case-sensitive")]
    UnknownField { type_name: String, field: String },

    #[error("Field {field} has an unsupported type {kind}")]
    UnsupportedType { field: String, kind: String },

    #[error("Delimited read failed for {class}: {source}")]
    Delimited {
        class: String,
        #[source]
        source: csv::Error,
    },
}

/// Failure of a full query: argument handling, upstream invocation or decode.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Invalid timeout '{value}': {reason}")]
    InvalidTimeout { value: String, reason: String },

    #[error("Failed to spawn '{binary}': {source}")]
    Spawn {
        binary: String,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Upstream exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },

    #[error("Upstream wrote to stderr: {0}")]
    Stderr(String),

    #[error("Upstream did not finish within {0:?}")]
    Timeout(std::time::Duration),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Result type alias for decode operations
pub type Result<T> = std::result::Result<T, DecodeError>;
