//! wmic-decode: decode captured query output or run live queries.
//!
//! Usage:
//!     wmic-decode decode --class Win32_Process --field Name --field ProcessId:u32 --input out.txt
//!     wmic-decode args --class Win32_Service --where "State = 'Running'" --field Name
//!     wmic-decode query --class Win32_Service --field Name --field State --timeout 1m

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use wmic_decode::{
    build_query_args, decode_with, dynamic_schema, Decoded, DynamicRecord, OutputFormat,
    QueryConfig, RecordError, Schema, WmicClient,
};
use wmic_logging::{init_logging, LogConfig};

#[derive(Parser, Debug)]
#[command(name = "wmic-decode", about = "Decode tabular query output into JSON records")]
struct Cli {
    /// Enable verbose logging (info/debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Append logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode captured output read from a file or stdin
    Decode {
        #[command(flatten)]
        schema: SchemaArgs,

        /// Input file (stdin when omitted or "-")
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Print the upstream argument list without running anything
    #[command(name = "args")]
    ShowArgs {
        #[command(flatten)]
        schema: SchemaArgs,

        #[command(flatten)]
        selection: SelectionArgs,
    },

    /// Run a query with the upstream binary and decode its output
    Query {
        #[command(flatten)]
        schema: SchemaArgs,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Time bound for the upstream process (e.g. 30s, 5m, 1h30m)
        #[arg(long)]
        timeout: Option<String>,
    },
}

#[derive(Args, Debug)]
struct SchemaArgs {
    /// Class (table) name
    #[arg(long)]
    class: String,

    /// Field spec as Name or Name:kind (string, i8..i64, u8..u64, f32, f64, bool)
    #[arg(long = "field", required = true)]
    fields: Vec<String>,

    /// Output framing: value or csv
    #[arg(long)]
    format: Option<OutputFormat>,
}

#[derive(Args, Debug)]
struct SelectionArgs {
    /// Explicit columns to request (defaults to the field names)
    #[arg(long, value_delimiter = ',')]
    columns: Vec<String>,

    /// Filter clause, e.g. "State = 'Running'"
    #[arg(long = "where")]
    filter: Option<String>,
}

impl SchemaArgs {
    fn schema(&self) -> Result<Schema<DynamicRecord>> {
        dynamic_schema(&self.class, self.fields.as_slice())
            .map_err(|e| anyhow::anyhow!(e))
            .context("Invalid --field spec")
    }

    fn config(&self) -> QueryConfig {
        let config = QueryConfig::from_env();
        match self.format {
            Some(format) => config.with_format(format),
            None => config,
        }
    }
}

#[derive(Serialize)]
struct DecodeOutput<'a> {
    class: &'a str,
    records: Vec<Value>,
    errors: Vec<RecordError>,
}

fn render(class: &str, schema: &Schema<DynamicRecord>, decoded: Decoded<DynamicRecord>) -> Result<()> {
    let output = DecodeOutput {
        class,
        records: decoded
            .records
            .iter()
            .map(|record| record.to_json(schema))
            .collect(),
        errors: decoded.field_errors,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn read_input(input: Option<&PathBuf>) -> Result<String> {
    match input {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file: {}", path.display())),
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

fn run_decode(schema_args: &SchemaArgs, input: Option<&PathBuf>) -> Result<()> {
    let schema = schema_args.schema()?;
    let config = schema_args.config();
    let text = read_input(input)?;

    let framer = config.format.framer(config.debug);
    let decoded = decode_with(framer.as_ref(), &schema, &schema_args.class, &text, || {
        DynamicRecord::zeroed(&schema)
    })
    .with_context(|| format!("Failed to decode {} output", schema_args.class))?;

    render(&schema_args.class, &schema, decoded)
}

fn run_args(schema_args: &SchemaArgs, selection: &SelectionArgs) -> Result<()> {
    let schema = schema_args.schema()?;
    let config = schema_args.config();
    let fields = schema.field_names().collect::<Vec<_>>().join(",");
    let args = build_query_args(
        &schema_args.class,
        selection.columns.as_slice(),
        selection.filter.as_deref(),
        &fields,
        config.format,
    );
    println!("{}", serde_json::to_string_pretty(&args)?);
    Ok(())
}

fn run_query(
    schema_args: &SchemaArgs,
    selection: &SelectionArgs,
    timeout: Option<&str>,
) -> Result<()> {
    let schema = schema_args.schema()?;
    let client = WmicClient::from_config(schema_args.config());
    let columns: Vec<&str> = selection.columns.iter().map(String::as_str).collect();

    tracing::info!(
        class = %schema_args.class,
        binary = %client.config().binary.display(),
        format = %client.format(),
        "Running query"
    );
    let decoded = client
        .query_schema(
            &schema,
            &schema_args.class,
            &columns,
            selection.filter.as_deref(),
            timeout,
            || DynamicRecord::zeroed(&schema),
        )
        .with_context(|| format!("Query for {} failed", schema_args.class))?;

    render(&schema_args.class, &schema, decoded)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging(LogConfig {
        app_name: "wmic-decode",
        verbose: cli.verbose,
        log_file: cli.log_file.clone(),
    }) {
        eprintln!("Warning: failed to initialize logging: {:#}", err);
    }

    let result = match &cli.command {
        Commands::Decode { schema, input } => run_decode(schema, input.as_ref()),
        Commands::ShowArgs { schema, selection } => run_args(schema, selection),
        Commands::Query {
            schema,
            selection,
            timeout,
        } => run_query(schema, selection, timeout.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
