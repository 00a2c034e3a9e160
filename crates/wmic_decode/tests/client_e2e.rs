//! Client entry points against a scripted runner.

use std::cell::RefCell;
use std::time::Duration;
use wmic_decode::{OutputFormat, QueryConfig, QueryError, QueryRunner, WmicClient};

wmic_decode::wmic_record! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Service {
        pub name: String => "Name",
        pub state: String => "State",
        pub process_id: u32 => "ProcessId",
    }
}

/// Returns canned output and remembers what it was asked to run.
struct ScriptedRunner {
    output: Result<String, String>,
    calls: RefCell<Vec<(Vec<String>, Duration)>>,
}

impl ScriptedRunner {
    fn ok(output: &str) -> Self {
        Self {
            output: Ok(output.to_string()),
            calls: RefCell::new(Vec::new()),
        }
    }

    fn stderr(message: &str) -> Self {
        Self {
            output: Err(message.to_string()),
            calls: RefCell::new(Vec::new()),
        }
    }

    fn last_args(&self) -> Vec<String> {
        self.calls.borrow().last().map(|c| c.0.clone()).unwrap_or_default()
    }

    fn last_timeout(&self) -> Duration {
        self.calls.borrow().last().map(|c| c.1).unwrap()
    }
}

impl QueryRunner for &ScriptedRunner {
    fn run(&self, args: &[String], timeout: Duration) -> Result<String, QueryError> {
        self.calls.borrow_mut().push((args.to_vec(), timeout));
        self.output.clone().map_err(QueryError::Stderr)
    }
}

const SERVICES: &str = "\n\nName=Spooler\nProcessId=2140\nState=Running\n\n\nName=wuauserv\nProcessId=0\nState=Stopped\n\n";

#[test]
fn test_query_all_uses_schema_columns_and_default_timeout() {
    let runner = ScriptedRunner::ok(SERVICES);
    let client = WmicClient::with_runner(&runner, QueryConfig::default());

    let decoded = client.query_all::<Service>("Win32_Service").unwrap();
    assert_eq!(decoded.records.len(), 2);
    assert_eq!(decoded.records[0].name, "Spooler");
    assert_eq!(decoded.records[0].process_id, 2140);
    assert_eq!(decoded.records[1].state, "Stopped");

    assert_eq!(
        runner.last_args(),
        vec!["PATH", "Win32_Service", "GET", "Name,State,ProcessId", "/format:rawxml", "/VALUE"]
    );
    assert_eq!(runner.last_timeout(), Duration::from_secs(30 * 60));
}

#[test]
fn test_query_columns_sends_explicit_columns() {
    let runner = ScriptedRunner::ok("Name=Spooler\n");
    let client = WmicClient::with_runner(&runner, QueryConfig::default());

    let decoded = client
        .query_columns::<Service>("Win32_Service", &["Name"])
        .unwrap();
    assert_eq!(decoded.records[0].name, "Spooler");
    assert_eq!(decoded.records[0].process_id, 0);
    assert_eq!(runner.last_args()[3], "Name");
}

#[test]
fn test_query_where_wraps_filter() {
    let runner = ScriptedRunner::ok(SERVICES);
    let client = WmicClient::with_runner(&runner, QueryConfig::default());

    client
        .query_where::<Service>("Win32_Service", "State = 'Running'")
        .unwrap();
    let args = runner.last_args();
    assert_eq!(
        &args[..8],
        &["PATH", "Win32_Service", "WHERE", "(", "State", "=", "'Running'", ")"]
    );
}

#[test]
fn test_explicit_timeout_overrides_default() {
    let runner = ScriptedRunner::ok(SERVICES);
    let client = WmicClient::with_runner(&runner, QueryConfig::default());

    client
        .query::<Service>("Win32_Service", &["Name", "State"], Some("(State = 'Running')"), Some("45s"))
        .unwrap();
    assert_eq!(runner.last_timeout(), Duration::from_secs(45));

    client
        .query_where_with_timeout::<Service>("Win32_Service", "Name = 'x'", "2m")
        .unwrap();
    assert_eq!(runner.last_timeout(), Duration::from_secs(120));
}

#[test]
fn test_invalid_timeout_is_fatal_before_running() {
    let runner = ScriptedRunner::ok(SERVICES);
    let client = WmicClient::with_runner(&runner, QueryConfig::default());

    let err = client
        .query_all_with_timeout::<Service>("Win32_Service", "soon")
        .unwrap_err();
    assert!(matches!(err, QueryError::InvalidTimeout { .. }));
    assert!(runner.calls.borrow().is_empty());
}

#[test]
fn test_upstream_error_is_fatal() {
    let runner = ScriptedRunner::stderr("Node - HOST\nERROR: Description = Invalid class");
    let client = WmicClient::with_runner(&runner, QueryConfig::default());

    let mut out = vec![Service::default()];
    let err = client
        .query_into::<Service, Service>("Win32_Nope", &[], None, None, &mut out)
        .unwrap_err();
    assert!(err.to_string().contains("Invalid class"));
    assert!(out.is_empty());
}

#[test]
fn test_csv_format_end_to_end() {
    let runner = ScriptedRunner::ok(
        "\r\nNode,Name,ProcessId,State\r\nHOST,Spooler,2140,Running\r\nHOST,broken\r\nHOST,wuauserv,0,Stopped\r\n",
    );
    let config = QueryConfig::default().with_format(OutputFormat::Csv);
    let client = WmicClient::with_runner(&runner, config);

    let mut out: Vec<Box<Service>> = Vec::new();
    let errors = client
        .query_into::<Service, _>("Win32_Service", &[], None, None, &mut out)
        .unwrap();
    assert!(errors.is_empty());
    assert_eq!(out.len(), 2);
    assert_eq!(out[1].name, "wuauserv");
    assert_eq!(runner.last_args().last().unwrap(), "/format:csv");
}

#[test]
fn test_decode_errors_surface_through_client() {
    let runner = ScriptedRunner::ok("Name=Spooler\nProcessId=-1\nState=Running\n");
    let client = WmicClient::with_runner(&runner, QueryConfig::default());

    let decoded = client.query_all::<Service>("Win32_Service").unwrap();
    assert_eq!(decoded.records.len(), 1);
    assert_eq!(decoded.field_errors.len(), 1);
    assert_eq!(decoded.field_errors[0].field, "ProcessId");
    assert_eq!(decoded.field_errors[0].row, 1);
    assert_eq!(decoded.field_errors[0].class, "Win32_Service");
}
