// crates/tradedesk-cli/src/operations.rs
// ============================================================================
// Module: Operation Adapters
// Description: Registration table binding operation ids to adapters.
// Purpose: Map each catalog operation onto a gateway endpoint or local code.
// Dependencies: async-trait, serde_json, tradedesk-core
// ============================================================================

//! ## Overview
//! Most operations are declarative [`RequestOperation`]s. Show-or-set
//! commands use [`ConditionalOperation`], calendar checks use
//! [`AssertionOperation`], gateway start/stop use [`LifecycleOperation`], and
//! date-windowed queries use [`SegmentedOperation`]. `cli.version` and
//! `dates.segment` run locally and never reach the gateway.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tradedesk_core::AssertionOperation;
use tradedesk_core::ConditionalOperation;
use tradedesk_core::ErrorKind;
use tradedesk_core::ExistingResourceOperation;
use tradedesk_core::Failure;
use tradedesk_core::LifecycleOperation;
use tradedesk_core::OperationAdapter;
use tradedesk_core::OperationContext;
use tradedesk_core::OperationTable;
use tradedesk_core::RequestOperation;
use tradedesk_core::ResolveError;
use tradedesk_core::SegmentedOperation;
use tradedesk_core::Transition;
use tradedesk_core::ValidatedInvocation;
use tradedesk_core::segment;

use crate::t;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Gateway collection used for lifecycle requests and status queries.
pub const GATEWAYS_PATH: &str = "/ibgrouter/gateways";

/// Timeout for setting credentials; the gateway logs in before replying.
const CREDENTIALS_TIMEOUT: Duration = Duration::from_secs(180);
/// Timeout for gateway start requests.
const START_TIMEOUT: Duration = Duration::from_secs(120);
/// Timeout for gateway stop requests.
const STOP_TIMEOUT: Duration = Duration::from_secs(60);

// ============================================================================
// SECTION: Operation Table
// ============================================================================

/// Registers an adapter for every catalog operation.
///
/// # Errors
///
/// Returns [`ResolveError::Duplicate`] when an id is registered twice.
pub fn operation_table() -> Result<OperationTable, ResolveError> {
    let mut table = OperationTable::new();

    table.register(
        "calendar.is_open",
        AssertionOperation::new(RequestOperation::get("/calendar/isopen"), "open"),
    )?;
    table.register(
        "calendar.is_closed",
        AssertionOperation::new(RequestOperation::get("/calendar/isclosed"), "closed"),
    )?;
    table.register("calendar.closings", RequestOperation::get("/calendar/closings"))?;
    table.register(
        "calendar.load_closings",
        RequestOperation::put("/calendar/closings").file_body("filename"),
    )?;

    table.register("fundamental.download_reuters", RequestOperation::post("/fundamental/reuters"))?;
    table.register("fundamental.download_wsh", RequestOperation::post("/fundamental/wsh"))?;
    table.register(
        "fundamental.eps",
        SegmentedOperation::new(RequestOperation::get("/fundamental/reuters/summary/eps")),
    )?;
    table.register(
        "fundamental.dividends",
        SegmentedOperation::new(RequestOperation::get("/fundamental/reuters/summary/dividends")),
    )?;
    table.register(
        "fundamental.revenue",
        SegmentedOperation::new(RequestOperation::get("/fundamental/reuters/summary/revenue")),
    )?;
    table.register(
        "fundamental.coa_codes",
        RequestOperation::get("/fundamental/reuters/statements/coa"),
    )?;
    table.register(
        "fundamental.statements",
        SegmentedOperation::new(RequestOperation::get("/fundamental/reuters/statements")),
    )?;
    table.register(
        "fundamental.estimates",
        SegmentedOperation::new(RequestOperation::get("/fundamental/reuters/estimates")),
    )?;
    table.register(
        "fundamental.actuals",
        SegmentedOperation::new(RequestOperation::get("/fundamental/reuters/actuals")),
    )?;

    table.register(
        "ibg.credentials",
        ExistingResourceOperation::new(
            GATEWAYS_PATH,
            "gateways",
            "gateway",
            ConditionalOperation::new(
                &["username", "password", "paper", "live"],
                RequestOperation::put("/{gateway}/credentials")
                    .form()
                    .switch_field("paper", "trading_mode", "paper")
                    .switch_field("live", "trading_mode", "live")
                    .timeout(CREDENTIALS_TIMEOUT),
                RequestOperation::get("/{gateway}/credentials"),
            ),
        ),
    )?;
    table.register("ibg.status", RequestOperation::get(GATEWAYS_PATH))?;
    table.register(
        "ibg.start",
        LifecycleOperation::new(Transition::Start, GATEWAYS_PATH, "gateways").timeout(START_TIMEOUT),
    )?;
    table.register(
        "ibg.stop",
        LifecycleOperation::new(Transition::Stop, GATEWAYS_PATH, "gateways").timeout(STOP_TIMEOUT),
    )?;
    table.register(
        "ibg.config",
        ConditionalOperation::new(
            &["filename"],
            RequestOperation::put("/ibgrouter/config").file_body("filename"),
            RequestOperation::get("/ibgrouter/config"),
        ),
    )?;

    table.register(
        "countdown.crontab",
        ConditionalOperation::new(
            &["filename"],
            RequestOperation::put("/{service}/crontab").file_body("filename"),
            RequestOperation::get("/{service}/crontab"),
        ),
    )?;
    table.register(
        "countdown.timezone",
        ConditionalOperation::new(
            &["tz"],
            RequestOperation::put("/{service}/timezone"),
            RequestOperation::get("/{service}/timezone"),
        ),
    )?;

    table.register("codeload.clone", RequestOperation::post("/codeload/repo").form())?;
    table.register("gateway.ping", RequestOperation::get("/ping"))?;

    table.register("dates.segment", SegmentDatesOperation)?;
    table.register("cli.version", VersionOperation)?;
    Ok(table)
}

// ============================================================================
// SECTION: Local Operations
// ============================================================================

/// Reports the CLI version.
pub struct VersionOperation;

#[async_trait]
impl OperationAdapter for VersionOperation {
    async fn execute(
        &self,
        _invocation: &ValidatedInvocation,
        _context: &OperationContext<'_>,
    ) -> Result<Value, Failure> {
        Ok(Value::String(t!("main.version", version = env!("CARGO_PKG_VERSION"))))
    }
}

/// Exposes the date segmenter: `[[start, end], ...]`.
pub struct SegmentDatesOperation;

#[async_trait]
impl OperationAdapter for SegmentDatesOperation {
    async fn execute(
        &self,
        invocation: &ValidatedInvocation,
        _context: &OperationContext<'_>,
    ) -> Result<Value, Failure> {
        let (Some(start), Some(end), Some(period)) = (
            invocation.date("start_date"),
            invocation.date("end_date"),
            invocation.period("period"),
        ) else {
            return Err(Failure::new(
                ErrorKind::MissingArgument,
                "dates segment requires START_DATE, END_DATE, and --period".to_string(),
            ));
        };
        let segments = segment(start, end, period)?;
        Ok(Value::Array(
            segments
                .into_iter()
                .map(|window| {
                    let (first, last) = window.to_strings();
                    Value::Array(vec![Value::String(first), Value::String(last)])
                })
                .collect(),
        ))
    }
}
