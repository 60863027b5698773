// crates/tradedesk-core/tests/dispatch.rs
// ============================================================================
// Module: Dispatch Tests
// Description: Declarative adapters and dispatch against a recording gateway.
// Purpose: Pin request mapping, outcome categories, and exit codes.
// ============================================================================

//! ## Overview
//! Runs each adapter family through [`dispatch`] with a gateway double that
//! records every request and replays scripted responses.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::collections::VecDeque;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use serde_json::json;
use tempfile::NamedTempFile;
use tokio::sync::watch;
use tradedesk_core::ArgValue;
use tradedesk_core::AssertionOperation;
use tradedesk_core::ConditionalOperation;
use tradedesk_core::ErrorKind;
use tradedesk_core::Gateway;
use tradedesk_core::GatewayError;
use tradedesk_core::GatewayRequest;
use tradedesk_core::Method;
use tradedesk_core::NoopWaitObserver;
use tradedesk_core::OperationContext;
use tradedesk_core::OperationId;
use tradedesk_core::OperationTable;
use tradedesk_core::Outcome;
use tradedesk_core::PollConfig;
use tradedesk_core::RequestBody;
use tradedesk_core::RequestOperation;
use tradedesk_core::SegmentedOperation;
use tradedesk_core::ValidatedInvocation;
use tradedesk_core::dispatch;
use tradedesk_core::parse_date;
use tradedesk_core::runtime::request::MAX_UPLOAD_BYTES;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Gateway double that records requests and replays responses.
#[derive(Default)]
struct RecordingGateway {
    /// Requests in call order.
    requests: Mutex<Vec<GatewayRequest>>,
    /// Scripted responses; `null` once exhausted.
    responses: Mutex<VecDeque<Result<Value, GatewayError>>>,
}

impl RecordingGateway {
    fn replying(responses: Vec<Result<Value, GatewayError>>) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            responses: Mutex::new(responses.into()),
        }
    }

    fn requests(&self) -> Vec<GatewayRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Gateway for RecordingGateway {
    async fn call(&self, request: GatewayRequest) -> Result<Value, GatewayError> {
        self.requests.lock().unwrap().push(request);
        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or(Ok(Value::Null))
    }
}

async fn run(table: &OperationTable, gateway: &RecordingGateway, invocation: &ValidatedInvocation) -> Outcome {
    let (_tx, rx) = watch::channel(false);
    let context = OperationContext {
        gateway,
        poll: PollConfig::default(),
        interrupt: rx,
        observer: &NoopWaitObserver,
    };
    dispatch(table, invocation, &context).await
}

fn invocation(operation: &str) -> ValidatedInvocation {
    ValidatedInvocation::new(OperationId::new(operation))
}

fn text(value: &str) -> ArgValue {
    ArgValue::Text(value.to_string())
}

fn list(values: &[&str]) -> ArgValue {
    ArgValue::List(values.iter().copied().map(text).collect())
}

fn date(value: &str) -> ArgValue {
    ArgValue::Date(parse_date(value).unwrap())
}

fn single(table_id: &str, adapter: RequestOperation) -> OperationTable {
    let mut table = OperationTable::new();
    table.register(table_id, adapter).unwrap();
    table
}

// ============================================================================
// SECTION: Request Operation
// ============================================================================

#[tokio::test]
async fn arguments_map_to_query_fields_by_name() {
    let table = single("calendar.closings", RequestOperation::get("/calendar/closings"));
    let gateway = RecordingGateway::replying(vec![Ok(json!([{"exchange": "NYSE"}]))]);
    let call = invocation("calendar.closings")
        .with("exchanges", list(&["NYSE", "LSE"]))
        .with("start_date", date("2024-01-02"))
        .with("types", list(&["full"]));

    let outcome = run(&table, &gateway, &call).await;
    assert_eq!(outcome, Outcome::Success(json!([{"exchange": "NYSE"}])));
    assert_eq!(outcome.exit_code(), 0);

    let requests = gateway.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, Method::Get);
    assert_eq!(request.path, "/calendar/closings");
    assert_eq!(request.query_values("exchanges"), vec!["NYSE", "LSE"]);
    assert_eq!(request.query_values("start_date"), vec!["2024-01-02"]);
    assert_eq!(request.query_values("types"), vec!["full"]);
    assert_eq!(request.body, RequestBody::Empty);
}

#[tokio::test]
async fn path_placeholders_are_filled_and_encoded() {
    let table = single("countdown.crontab", RequestOperation::get("/{service}/crontab"));
    let gateway = RecordingGateway::default();
    let call = invocation("countdown.crontab").with("service", text("countdown usa"));
    run(&table, &gateway, &call).await;
    let request = &gateway.requests()[0];
    assert_eq!(request.path, "/countdown%20usa/crontab");
    assert!(request.query.is_empty());
}

#[tokio::test]
async fn path_values_cannot_escape_their_segment() {
    let table = single("countdown.crontab", RequestOperation::get("/{service}/crontab"));
    let gateway = RecordingGateway::default();
    let call = invocation("countdown.crontab").with("service", text("../a/b?c=1#d%e~f_g.h-ü"));
    run(&table, &gateway, &call).await;
    let request = &gateway.requests()[0];
    assert_eq!(request.path, "/..%2Fa%2Fb%3Fc%3D1%23d%25e~f_g.h-%C3%BC/crontab");
}

#[tokio::test]
async fn missing_path_value_is_missing_argument() {
    let table = single("countdown.crontab", RequestOperation::get("/{service}/crontab"));
    let gateway = RecordingGateway::default();
    let outcome = run(&table, &gateway, &invocation("countdown.crontab")).await;
    assert_eq!(outcome.error_kind(), Some(ErrorKind::MissingArgument));
    assert!(gateway.requests().is_empty());
}

#[tokio::test]
async fn switch_field_is_the_only_rename() {
    let adapter = RequestOperation::put("/{service}/credentials")
        .form()
        .switch_field("paper", "trading_mode", "paper")
        .switch_field("live", "trading_mode", "live");
    let table = single("ibg.credentials", adapter);
    let gateway = RecordingGateway::default();
    let call = invocation("ibg.credentials")
        .with("service", text("ibg1"))
        .with("username", text("trader"))
        .with("paper", ArgValue::Bool(true));
    run(&table, &gateway, &call).await;

    let request = &gateway.requests()[0];
    assert_eq!(request.method, Method::Put);
    assert_eq!(request.path, "/ibg1/credentials");
    assert_eq!(
        request.body,
        RequestBody::Form(vec![
            ("trading_mode".to_string(), "paper".to_string()),
            ("username".to_string(), "trader".to_string()),
        ])
    );
}

#[tokio::test]
async fn file_body_is_sent_as_text() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"0 9 * * mon-fri clock\n").unwrap();
    let table = single(
        "countdown.crontab.load",
        RequestOperation::put("/{service}/crontab").file_body("filename"),
    );
    let gateway = RecordingGateway::default();
    let call = invocation("countdown.crontab.load")
        .with("service", text("countdown"))
        .with("filename", ArgValue::Path(file.path().to_path_buf()));
    let outcome = run(&table, &gateway, &call).await;
    assert!(outcome.is_success());
    let request = &gateway.requests()[0];
    assert_eq!(request.body, RequestBody::Text("0 9 * * mon-fri clock\n".to_string()));
}

#[tokio::test]
async fn unreadable_file_body_is_local_io() {
    let table =
        single("ibg.config.load", RequestOperation::put("/ibgrouter/config").file_body("filename"));
    let gateway = RecordingGateway::default();
    let call = invocation("ibg.config.load")
        .with("filename", ArgValue::Path(PathBuf::from("/nonexistent/tradedesk/config.ini")));
    let outcome = run(&table, &gateway, &call).await;
    assert_eq!(outcome.error_kind(), Some(ErrorKind::LocalIo));
    assert_eq!(outcome.exit_code(), 74);
    assert!(gateway.requests().is_empty());
}

#[tokio::test]
async fn oversized_file_body_is_local_io() {
    let file = NamedTempFile::new().unwrap();
    file.as_file().set_len(MAX_UPLOAD_BYTES + 1).unwrap();
    let table =
        single("ibg.config.load", RequestOperation::put("/ibgrouter/config").file_body("filename"));
    let gateway = RecordingGateway::default();
    let call =
        invocation("ibg.config.load").with("filename", ArgValue::Path(file.path().to_path_buf()));
    let outcome = run(&table, &gateway, &call).await;
    assert_eq!(outcome.error_kind(), Some(ErrorKind::LocalIo));
    assert!(gateway.requests().is_empty());
}

// ============================================================================
// SECTION: Conditional And Assertion Operations
// ============================================================================

#[tokio::test]
async fn conditional_selects_write_only_when_triggered() {
    let mut table = OperationTable::new();
    table
        .register(
            "countdown.timezone",
            ConditionalOperation::new(
                &["tz"],
                RequestOperation::put("/{service}/timezone"),
                RequestOperation::get("/{service}/timezone"),
            ),
        )
        .unwrap();
    let gateway = RecordingGateway::default();

    let show = invocation("countdown.timezone").with("service", text("countdown"));
    run(&table, &gateway, &show).await;
    let set = show.clone().with("tz", text("America/New_York"));
    run(&table, &gateway, &set).await;

    let requests = gateway.requests();
    assert_eq!(requests[0].method, Method::Get);
    assert!(requests[0].query.is_empty());
    assert_eq!(requests[1].method, Method::Put);
    assert_eq!(requests[1].query_values("tz"), vec!["America/New_York"]);
}

#[tokio::test]
async fn assertion_maps_payload_to_exit_status() {
    let mut table = OperationTable::new();
    table
        .register(
            "calendar.is_open",
            AssertionOperation::new(RequestOperation::get("/calendar/isopen"), "open"),
        )
        .unwrap();
    let gateway = RecordingGateway::replying(vec![
        Ok(json!({"NYSE": true, "LSE": true})),
        Ok(json!({"NYSE": true, "LSE": false})),
        Ok(json!({"NYSE": "yes"})),
        Err(GatewayError::Remote {
            category: "bad_request".to_string(),
            message: "unknown exchange: XYZ".to_string(),
        }),
    ]);
    let call = invocation("calendar.is_open").with("exchanges", list(&["NYSE", "LSE"]));

    let open = run(&table, &gateway, &call).await;
    assert_eq!(open.exit_code(), 0);

    let closed = run(&table, &gateway, &call).await;
    assert_eq!(closed.error_kind(), Some(ErrorKind::AssertionFailed));
    assert_eq!(closed.exit_code(), 1);

    let malformed = run(&table, &gateway, &call).await;
    assert_eq!(malformed.error_kind(), Some(ErrorKind::GatewayError));

    let remote = run(&table, &gateway, &call).await;
    match remote {
        Outcome::Failure(failure) => {
            assert_eq!(failure.kind, ErrorKind::GatewayError);
            assert_eq!(failure.message, "unknown exchange: XYZ");
        }
        Outcome::Success(value) => panic!("unexpected success: {value}"),
    }
}

#[test]
fn assertion_payload_shapes() {
    assert!(AssertionOperation::evaluate(&json!(true)).unwrap());
    assert!(!AssertionOperation::evaluate(&json!(false)).unwrap());
    assert!(!AssertionOperation::evaluate(&json!([true, false])).unwrap());
    assert!(AssertionOperation::evaluate(&json!({})).is_err());
    assert!(AssertionOperation::evaluate(&json!([])).is_err());
    assert!(AssertionOperation::evaluate(&json!("true")).is_err());
}

// ============================================================================
// SECTION: Segmented Operation
// ============================================================================

#[tokio::test]
async fn segmented_fetch_issues_one_request_per_segment() {
    let mut table = OperationTable::new();
    table
        .register(
            "fundamental.reuters_estimates",
            SegmentedOperation::new(RequestOperation::get("/fundamental/reuters/estimates")),
        )
        .unwrap();
    let gateway = RecordingGateway::replying(vec![
        Ok(json!([{"row": 1}])),
        Ok(Value::Null),
        Ok(json!([{"row": 3}, {"row": 4}])),
    ]);
    let period = ArgValue::Period("A".parse().unwrap());
    let call = invocation("fundamental.reuters_estimates")
        .with("start_date", date("2013-06-01"))
        .with("end_date", date("2015-12-15"))
        .with("segment", period)
        .with("conids", list(&["265598"]));

    let outcome = run(&table, &gateway, &call).await;
    assert_eq!(outcome, Outcome::Success(json!([{"row": 1}, {"row": 3}, {"row": 4}])));

    let requests = gateway.requests();
    let observed: Vec<(String, String)> = requests
        .iter()
        .map(|request| {
            (
                request.query_values("start_date")[0].to_string(),
                request.query_values("end_date")[0].to_string(),
            )
        })
        .collect();
    assert_eq!(
        observed,
        vec![
            ("2013-06-01".to_string(), "2013-12-30".to_string()),
            ("2013-12-31".to_string(), "2014-12-30".to_string()),
            ("2014-12-31".to_string(), "2015-12-15".to_string()),
        ]
    );
    for request in &requests {
        assert!(request.query_values("segment").is_empty());
        assert_eq!(request.query_values("conids"), vec!["265598"]);
    }
}

#[tokio::test]
async fn segment_without_window_is_missing_argument() {
    let mut table = OperationTable::new();
    table
        .register(
            "fundamental.reuters_estimates",
            SegmentedOperation::new(RequestOperation::get("/fundamental/reuters/estimates")),
        )
        .unwrap();
    let gateway = RecordingGateway::default();
    let call = invocation("fundamental.reuters_estimates")
        .with("start_date", date("2013-06-01"))
        .with("segment", ArgValue::Period("Q".parse().unwrap()));
    let outcome = run(&table, &gateway, &call).await;
    assert_eq!(outcome.error_kind(), Some(ErrorKind::MissingArgument));
    assert!(gateway.requests().is_empty());

    let inverted = invocation("fundamental.reuters_estimates")
        .with("start_date", date("2015-01-02"))
        .with("end_date", date("2015-01-01"))
        .with("segment", ArgValue::Period("Q".parse().unwrap()));
    let outcome = run(&table, &gateway, &inverted).await;
    assert_eq!(outcome.error_kind(), Some(ErrorKind::InvalidDateRange));
    assert_eq!(outcome.exit_code(), 6);
}

#[tokio::test]
async fn unsegmented_fetch_passes_payload_through() {
    let mut table = OperationTable::new();
    table
        .register(
            "fundamental.reuters_estimates",
            SegmentedOperation::new(RequestOperation::get("/fundamental/reuters/estimates")),
        )
        .unwrap();
    let gateway = RecordingGateway::replying(vec![Ok(json!({"rows": 0}))]);
    let call = invocation("fundamental.reuters_estimates").with("start_date", date("2013-06-01"));
    let outcome = run(&table, &gateway, &call).await;
    assert_eq!(outcome, Outcome::Success(json!({"rows": 0})));
    assert_eq!(gateway.requests().len(), 1);
}

// ============================================================================
// SECTION: Dispatch Failures
// ============================================================================

#[tokio::test]
async fn unresolved_operation_is_exit_70() {
    let table = OperationTable::new();
    let gateway = RecordingGateway::default();
    let outcome = run(&table, &gateway, &invocation("nowhere.to_go")).await;
    assert_eq!(outcome.error_kind(), Some(ErrorKind::UnresolvedOperation));
    assert_eq!(outcome.exit_code(), 70);
    assert!(gateway.requests().is_empty());
}

#[tokio::test]
async fn transport_failures_are_gateway_unavailable() {
    let table = single("gateway.ping", RequestOperation::get("/ping"));
    let gateway = RecordingGateway::replying(vec![Err(GatewayError::Unavailable(
        "connection refused".to_string(),
    ))]);
    let outcome = run(&table, &gateway, &invocation("gateway.ping")).await;
    assert_eq!(outcome.error_kind(), Some(ErrorKind::GatewayUnavailable));
    assert_eq!(outcome.exit_code(), 11);
}
