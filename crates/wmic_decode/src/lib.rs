//! Typed decoding of tabular query output.
//!
//! The upstream tool prints query results either as blank-line separated
//! `Name=Value` blocks or as a CSV table. This crate turns that text into
//! typed records:
//!
//! 1. [`query::build_query_args`] assembles the upstream argument list from
//!    a class name, a column list (or the record's schema) and an optional
//!    filter clause.
//! 2. A [`framer::RowFramer`] splits the captured text into raw rows.
//! 3. [`decoder`] maps every raw field onto a fresh record by name,
//!    coercing it to the field's declared kind.
//!
//! Bad values are recoverable: they are collected as [`RecordError`]s next
//! to the decoded records. Schema mismatches (unknown field names,
//! fields of a kind with no coercion) are fatal and discard the batch.
//!
//! # Modules
//!
//! - [`schema`]: field kinds, schema descriptors, the [`Record`] trait and
//!   the [`wmic_record!`] macro
//! - [`coerce`]: string to scalar coercion and by-name field mapping
//! - [`framer`]: key/value and delimited row framers
//! - [`decoder`]: orchestration over a framer
//! - [`query`]: argument construction and output format selection
//! - [`client`]: query entry points over a [`runner::QueryRunner`]

pub mod client;
pub mod coerce;
pub mod config;
pub mod decoder;
pub mod defaults;
pub mod duration;
pub mod dynamic;
pub mod error;
pub mod framer;
pub mod query;
pub mod registry;
pub mod runner;
pub mod schema;

pub use client::WmicClient;
pub use config::QueryConfig;
pub use decoder::{decode, decode_into, decode_with, Decoded};
pub use dynamic::{dynamic_schema, DynamicRecord};
pub use error::{DecodeError, QueryError, RecordError};
pub use framer::{DelimitedFramer, KeyValueFramer, RawRow, RowFramer};
pub use query::{build_query_args, OutputFormat};
pub use runner::{QueryRunner, WmicProcess};
pub use schema::{FieldKind, FieldValue, FloatWidth, IntWidth, Record, Scalar, Schema};

#[doc(hidden)]
pub mod __private {
    pub use once_cell::sync::Lazy;
}
