//! Query entry points: build arguments, run upstream, decode.

use crate::config::QueryConfig;
use crate::decoder::{decode_with, Decoded};
use crate::duration::parse_timeout;
use crate::error::{QueryError, RecordError};
use crate::query::{build_query_args, OutputFormat};
use crate::registry::field_list;
use crate::runner::{QueryRunner, WmicProcess};
use crate::schema::{Record, Schema};
use tracing::info;

/// Typed query client over a [`QueryRunner`].
pub struct WmicClient<Q = WmicProcess> {
    runner: Q,
    config: QueryConfig,
}

impl WmicClient<WmicProcess> {
    /// Client that spawns the configured upstream binary.
    pub fn from_config(config: QueryConfig) -> Self {
        let runner = WmicProcess::new(config.binary.clone());
        Self { runner, config }
    }

    /// Client configured from the process environment.
    pub fn from_env() -> Self {
        Self::from_config(QueryConfig::from_env())
    }
}

impl<Q: QueryRunner> WmicClient<Q> {
    pub fn with_runner(runner: Q, config: QueryConfig) -> Self {
        Self { runner, config }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    pub fn format(&self) -> OutputFormat {
        self.config.format
    }

    /// All schema columns of every instance of `class`.
    pub fn query_all<R: Record>(&self, class: &str) -> Result<Decoded<R>, QueryError> {
        self.query(class, &[], None, None)
    }

    pub fn query_all_with_timeout<R: Record>(
        &self,
        class: &str,
        timeout: &str,
    ) -> Result<Decoded<R>, QueryError> {
        self.query(class, &[], None, Some(timeout))
    }

    /// Only the named columns; fields outside `columns` keep their zero value.
    pub fn query_columns<R: Record>(
        &self,
        class: &str,
        columns: &[&str],
    ) -> Result<Decoded<R>, QueryError> {
        self.query(class, columns, None, None)
    }

    pub fn query_columns_with_timeout<R: Record>(
        &self,
        class: &str,
        columns: &[&str],
        timeout: &str,
    ) -> Result<Decoded<R>, QueryError> {
        self.query(class, columns, None, Some(timeout))
    }

    /// All schema columns of the instances matching `filter`.
    pub fn query_where<R: Record>(
        &self,
        class: &str,
        filter: &str,
    ) -> Result<Decoded<R>, QueryError> {
        self.query(class, &[], Some(filter), None)
    }

    pub fn query_where_with_timeout<R: Record>(
        &self,
        class: &str,
        filter: &str,
        timeout: &str,
    ) -> Result<Decoded<R>, QueryError> {
        self.query(class, &[], Some(filter), Some(timeout))
    }

    /// General form. `timeout` overrides the configured default bound.
    pub fn query<R: Record>(
        &self,
        class: &str,
        columns: &[&str],
        filter: Option<&str>,
        timeout: Option<&str>,
    ) -> Result<Decoded<R>, QueryError> {
        let fields = field_list::<R>();
        self.run_and_decode(R::schema(), &fields, class, columns, filter, timeout, R::default)
    }

    /// Query against a runtime-built schema.
    pub fn query_schema<R, F>(
        &self,
        schema: &Schema<R>,
        class: &str,
        columns: &[&str],
        filter: Option<&str>,
        timeout: Option<&str>,
        new_record: F,
    ) -> Result<Decoded<R>, QueryError>
    where
        F: FnMut() -> R,
    {
        let fields = schema.field_names().collect::<Vec<_>>().join(",");
        self.run_and_decode(schema, &fields, class, columns, filter, timeout, new_record)
    }

    #[allow(clippy::too_many_arguments)]
    fn run_and_decode<R, F>(
        &self,
        schema: &Schema<R>,
        schema_fields: &str,
        class: &str,
        columns: &[&str],
        filter: Option<&str>,
        timeout: Option<&str>,
        new_record: F,
    ) -> Result<Decoded<R>, QueryError>
    where
        F: FnMut() -> R,
    {
        let bound = parse_timeout(timeout.unwrap_or(&self.config.default_timeout))?;
        let args = build_query_args(class, columns, filter, schema_fields, self.config.format);
        let output = self.runner.run(&args, bound)?;

        let framer = self.config.format.framer(self.config.debug);
        let decoded = decode_with(framer.as_ref(), schema, class, &output, new_record)?;
        info!(
            class,
            records = decoded.records.len(),
            field_errors = decoded.field_errors.len(),
            "Query complete"
        );
        Ok(decoded)
    }

    /// Like [`WmicClient::query`], writing into a caller-owned collection of
    /// either `R` or an owning wrapper such as `Box<R>`. `out` is emptied on
    /// failure.
    pub fn query_into<R, E>(
        &self,
        class: &str,
        columns: &[&str],
        filter: Option<&str>,
        timeout: Option<&str>,
        out: &mut Vec<E>,
    ) -> Result<Vec<RecordError>, QueryError>
    where
        R: Record,
        E: From<R>,
    {
        match self.query::<R>(class, columns, filter, timeout) {
            Ok(decoded) => Ok(decoded.into_collection(out)),
            Err(err) => {
                out.clear();
                Err(err)
            }
        }
    }
}
