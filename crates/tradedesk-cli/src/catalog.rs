// crates/tradedesk-cli/src/catalog.rs
// ============================================================================
// Module: Command Catalog
// Description: Declarative descriptors for every tradedesk subcommand.
// Purpose: Keep the per-command boilerplate as data.
// Dependencies: tradedesk-core
// ============================================================================

//! ## Overview
//! [`command_registry`] declares every command group and leaf. Each leaf
//! names its target operation by id only; [`build_catalog`] pairs the
//! registry with the operation table and checks that every leaf resolves
//! before anything is parsed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;
use tradedesk_core::ArgumentSpec;
use tradedesk_core::CommandDescriptor;
use tradedesk_core::CommandRegistry;
use tradedesk_core::OperationTable;
use tradedesk_core::RegistryError;
use tradedesk_core::ResolveError;
use tradedesk_core::ValueType;

use crate::operations::operation_table;

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Program name shown in usage output.
pub const PROGRAM_NAME: &str = "tradedesk";

/// Command registry paired with its verified operation table.
pub struct Catalog {
    /// Command tree.
    pub registry: CommandRegistry,
    /// Adapters for every leaf operation.
    pub operations: OperationTable,
}

/// Catalog construction failures; these are programming defects.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The registry is malformed.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// A leaf does not resolve to an adapter.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Builds and verifies the full catalog.
///
/// # Errors
///
/// Returns [`CatalogError`] when the registry or operation table is
/// inconsistent.
pub fn build_catalog() -> Result<Catalog, CatalogError> {
    let registry = command_registry()?;
    registry.check_groups()?;
    let operations = operation_table()?;
    operations.verify_registry(&registry)?;
    Ok(Catalog {
        registry,
        operations,
    })
}

// ============================================================================
// SECTION: Shared Arguments
// ============================================================================

/// Optional `--start-date`/`--end-date` window.
fn date_window(descriptor: CommandDescriptor) -> CommandDescriptor {
    descriptor
        .argument(
            ArgumentSpec::option("start_date", "limit to on or after this date")
                .short('s')
                .typed(ValueType::Date)
                .value_name("YYYY-MM-DD"),
        )
        .argument(
            ArgumentSpec::option("end_date", "limit to on or before this date")
                .short('e')
                .typed(ValueType::Date)
                .value_name("YYYY-MM-DD"),
        )
}

/// Group and conid include/exclude filters.
fn universe_filters(descriptor: CommandDescriptor) -> CommandDescriptor {
    descriptor
        .argument(
            ArgumentSpec::option("groups", "limit to these groups").short('g').many().value_name("GROUP"),
        )
        .argument(
            ArgumentSpec::option("conids", "limit to these conids")
                .short('i')
                .many()
                .typed(ValueType::Integer)
                .value_name("CONID"),
        )
        .argument(ArgumentSpec::option("exclude_groups", "exclude these groups").many().value_name("GROUP"))
        .argument(
            ArgumentSpec::option("exclude_conids", "exclude these conids")
                .many()
                .typed(ValueType::Integer)
                .value_name("CONID"),
        )
}

/// `--segment PERIOD` for chunked queries.
fn segment_option() -> ArgumentSpec {
    ArgumentSpec::option(
        "segment",
        "query in date segments of this size (e.g. Q, A, 2A); requires --start-date and --end-date",
    )
    .typed(ValueType::Period)
    .value_name("PERIOD")
}

/// Exchange assertion command (`isopen`/`isclosed`).
fn exchange_assertion(name: &str, help: &str, operation: &str, state: &str) -> CommandDescriptor {
    CommandDescriptor::new(name, help, operation)
        .argument(
            ArgumentSpec::positional("exchanges", "the exchange(s) to check")
                .at_least_one()
                .value_name("EXCHANGE"),
        )
        .argument(
            ArgumentSpec::option(
                "in",
                &format!("assert that the exchange(s) will be {state} in the future (e.g. 2h)"),
            )
            .short('i')
            .value_name("TIMEDELTA"),
        )
        .argument(
            ArgumentSpec::option("ago", &format!("assert that the exchange(s) was {state} in the past (e.g. 2h)"))
                .short('a')
                .value_name("TIMEDELTA"),
        )
        .exclusive("timing", &["in", "ago"])
}

/// Summary-history query (`eps`, `dividends`, `revenue`).
fn summary_query(name: &str, help: &str, operation: &str) -> CommandDescriptor {
    universe_filters(date_window(CommandDescriptor::new(name, help, operation)))
        .argument(ArgumentSpec::option("report_type", "filter by report type").many())
        .argument(ArgumentSpec::option("period", "filter by period").many())
        .argument(segment_option())
}

/// Analyst estimate query (`estimates`, `actuals`).
fn estimate_query(name: &str, help: &str, operation: &str) -> CommandDescriptor {
    let descriptor = CommandDescriptor::new(name, help, operation).argument(
        ArgumentSpec::positional("metric", "the metric code to query").value_name("METRIC"),
    );
    universe_filters(date_window(descriptor))
        .argument(
            ArgumentSpec::option("period_type", "filter by period type")
                .many()
                .choices(&["A", "Q"])
                .value_name("TYPE"),
        )
        .argument(segment_option())
}

/// `-g/--gateways SERVICE_NAME...`.
fn gateways_option(help: &str) -> ArgumentSpec {
    ArgumentSpec::option("gateways", help).short('g').many().value_name("SERVICE_NAME")
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Declares every command group and leaf.
///
/// # Errors
///
/// Returns [`RegistryError`] when a declaration is inconsistent.
pub fn command_registry() -> Result<CommandRegistry, RegistryError> {
    let mut registry =
        CommandRegistry::new(PROGRAM_NAME, "Command-line client for the trading gateway");
    register_calendar(&mut registry)?;
    register_fundamental(&mut registry)?;
    register_ibg(&mut registry)?;
    register_countdown(&mut registry)?;
    register_codeload(&mut registry)?;
    register_utilities(&mut registry)?;
    Ok(registry)
}

/// `calendar` commands.
fn register_calendar(registry: &mut CommandRegistry) -> Result<(), RegistryError> {
    registry.describe_group(&["calendar"], "exchange calendars and closings")?;
    registry.register(
        &["calendar"],
        exchange_assertion(
            "isopen",
            "assert that one or more exchanges is open; exits non-zero if closed",
            "calendar.is_open",
            "open",
        ),
    )?;
    registry.register(
        &["calendar"],
        exchange_assertion(
            "isclosed",
            "assert that one or more exchanges is closed; exits non-zero if open",
            "calendar.is_closed",
            "closed",
        ),
    )?;
    let closings = date_window(
        CommandDescriptor::new("closings", "get exchange closings", "calendar.closings").argument(
            ArgumentSpec::option("exchanges", "limit to these exchanges")
                .short('x')
                .many()
                .value_name("EXCHANGE"),
        ),
    )
    .argument(
        ArgumentSpec::option("after", "limit to closings this long ago or later (e.g. 30d)")
            .short('a')
            .value_name("TIMEDELTA"),
    )
    .argument(
        ArgumentSpec::option("before", "limit to closings at most this far ahead (e.g. 30d)")
            .short('b')
            .value_name("TIMEDELTA"),
    )
    .argument(
        ArgumentSpec::option("types", "limit to these closing types")
            .short('t')
            .many()
            .choices(&["full", "half"])
            .value_name("TYPE"),
    )
    .exclusive("window_start", &["start_date", "after"])
    .exclusive("window_end", &["end_date", "before"]);
    registry.register(&["calendar"], closings)?;
    registry.register(
        &["calendar"],
        CommandDescriptor::new("load", "load exchange closings from a CSV file", "calendar.load_closings")
            .argument(
                ArgumentSpec::positional("filename", "CSV with columns date, exchange, and optionally type")
                    .typed(ValueType::Path)
                    .value_name("FILENAME"),
            ),
    )
}

/// `fundamental` commands.
fn register_fundamental(registry: &mut CommandRegistry) -> Result<(), RegistryError> {
    registry.describe_group(&["fundamental"], "fundamental data downloads and queries")?;
    let webhook = || {
        ArgumentSpec::option("webhook", "post to this webhook when the downloads are complete")
            .short('w')
            .value_name("URL")
    };
    let download_filters = |descriptor: CommandDescriptor| {
        descriptor
            .argument(
                ArgumentSpec::option("groups", "limit to these groups").short('g').many().value_name("GROUP"),
            )
            .argument(
                ArgumentSpec::option("conids", "limit to these conids")
                    .short('i')
                    .many()
                    .typed(ValueType::Integer)
                    .value_name("CONID"),
            )
    };
    registry.register(
        &["fundamental"],
        download_filters(
            CommandDescriptor::new("reuters", "download Reuters fundamental data", "fundamental.download_reuters")
                .argument(
                    ArgumentSpec::option("reports", "download these reports")
                        .short('r')
                        .many()
                        .choices(&["summary", "statements", "estimates"])
                        .value_name("REPORT"),
                ),
        )
        .argument(webhook()),
    )?;
    registry.register(
        &["fundamental"],
        download_filters(CommandDescriptor::new(
            "wsh",
            "download Wall Street Horizon calendar data",
            "fundamental.download_wsh",
        ))
        .argument(webhook()),
    )?;
    registry.register(
        &["fundamental"],
        summary_query("eps", "query EPS history from the summary database", "fundamental.eps"),
    )?;
    registry.register(
        &["fundamental"],
        summary_query("dividends", "query dividend history from the summary database", "fundamental.dividends"),
    )?;
    registry.register(
        &["fundamental"],
        summary_query("revenue", "query revenue history from the summary database", "fundamental.revenue"),
    )?;
    registry.register(
        &["fundamental"],
        CommandDescriptor::new("coa", "query available Chart of Account codes", "fundamental.coa_codes").argument(
            ArgumentSpec::option("statement_type", "filter by statement type")
                .short('s')
                .many()
                .choices(&["INC", "BAL", "CAS"])
                .value_name("TYPE"),
        ),
    )?;
    let statements = CommandDescriptor::new(
        "statements",
        "query financial statements from the statement database",
        "fundamental.statements",
    )
    .argument(ArgumentSpec::positional("code", "the Chart of Account code to query").value_name("CODE"));
    registry.register(
        &["fundamental"],
        universe_filters(date_window(statements))
            .argument(ArgumentSpec::option("period_type", "filter by period type").many().value_name("TYPE"))
            .argument(
                ArgumentSpec::option("statement_type", "filter by statement type")
                    .many()
                    .choices(&["INC", "BAL", "CAS"])
                    .value_name("TYPE"),
            )
            .argument(segment_option()),
    )?;
    registry.register(
        &["fundamental"],
        estimate_query("estimates", "query analyst estimates", "fundamental.estimates"),
    )?;
    registry.register(
        &["fundamental"],
        estimate_query("actuals", "query reported actuals", "fundamental.actuals"),
    )
}

/// `ibg` commands.
fn register_ibg(registry: &mut CommandRegistry) -> Result<(), RegistryError> {
    registry.describe_group(&["ibg"], "start, stop, and configure broker gateways")?;
    registry.register(
        &["ibg"],
        CommandDescriptor::new(
            "credentials",
            "show, or set username/password and trading mode for, a gateway",
            "ibg.credentials",
        )
        .argument(
            ArgumentSpec::positional("gateway", "name of the gateway service (e.g. ibg1)")
                .value_name("SERVICE_NAME"),
        )
        .argument(
            ArgumentSpec::option("username", "broker username (optional when only changing trading mode)")
                .short('u')
                .value_name("USERNAME"),
        )
        .argument(
            ArgumentSpec::option("password", "broker password (prompted for when omitted with --username)")
                .short('p')
                .value_name("PASSWORD")
                .secret_prompted_by("username"),
        )
        .argument(ArgumentSpec::switch("paper", "set trading mode to paper trading"))
        .argument(ArgumentSpec::switch("live", "set trading mode to live trading"))
        .exclusive("trading_mode", &["paper", "live"]),
    )?;
    registry.register(
        &["ibg"],
        CommandDescriptor::new("status", "query gateway statuses", "ibg.status")
            .argument(
                ArgumentSpec::option("status", "limit to gateways in this status")
                    .short('s')
                    .choices(&["running", "stopped", "error"])
                    .value_name("STATUS"),
            )
            .argument(gateways_option("limit to these gateways")),
    )?;
    registry.register(
        &["ibg"],
        CommandDescriptor::new("start", "start one or more gateways", "ibg.start")
            .argument(gateways_option("limit to these gateways"))
            .argument(
                ArgumentSpec::switch("wait", "wait for the gateways to reach running before returning")
                    .short('w'),
            ),
    )?;
    registry.register(
        &["ibg"],
        CommandDescriptor::new("stop", "stop one or more gateways", "ibg.stop")
            .argument(gateways_option("limit to these gateways"))
            .argument(
                ArgumentSpec::switch("wait", "wait for the gateways to reach stopped before returning")
                    .short('w'),
            ),
    )?;
    registry.register(
        &["ibg"],
        CommandDescriptor::new("config", "upload a new gateway config, or show the current one", "ibg.config")
            .argument(
                ArgumentSpec::positional("filename", "config file to upload (omit to show the current config)")
                    .optional()
                    .typed(ValueType::Path)
                    .value_name("FILENAME"),
            ),
    )
}

/// `countdown` commands.
fn register_countdown(registry: &mut CommandRegistry) -> Result<(), RegistryError> {
    registry.describe_group(&["countdown"], "cron-like scheduling services")?;
    let service = || {
        ArgumentSpec::positional("service", "name of the countdown service (e.g. countdown-usa)")
            .value_name("SERVICE_NAME")
    };
    registry.register(
        &["countdown"],
        CommandDescriptor::new("crontab", "upload a new crontab, or show the current one", "countdown.crontab")
            .argument(service())
            .argument(
                ArgumentSpec::positional("filename", "crontab file to upload (omit to show the current crontab)")
                    .optional()
                    .typed(ValueType::Path)
                    .value_name("FILENAME"),
            ),
    )?;
    registry.register(
        &["countdown"],
        CommandDescriptor::new("timezone", "set the service timezone, or show the current one", "countdown.timezone")
            .argument(service())
            .argument(
                ArgumentSpec::positional("tz", "timezone name (e.g. America/New_York); omit to show")
                    .optional()
                    .value_name("TZ"),
            ),
    )
}

/// `codeload` commands.
fn register_codeload(registry: &mut CommandRegistry) -> Result<(), RegistryError> {
    registry.describe_group(&["codeload"], "clone and manage code")?;
    registry.register(
        &["codeload"],
        CommandDescriptor::new("clone", "clone files from a Git repository", "codeload.clone")
            .argument(
                ArgumentSpec::positional("repo", "demo repo name, GitHub user/repo, or any Git URL")
                    .value_name("REPO"),
            )
            .argument(
                ArgumentSpec::option("branch", "the branch to clone (default master)")
                    .short('b')
                    .value_name("BRANCH"),
            )
            .argument(
                ArgumentSpec::switch("replace", "replace files that already exist locally").short('r'),
            )
            .argument(
                ArgumentSpec::switch("skip_existing", "skip files that already exist locally").short('s'),
            )
            .argument(
                ArgumentSpec::option("target_dir", "directory to clone into").value_name("DIR"),
            )
            .exclusive("on_conflict", &["replace", "skip_existing"]),
    )
}

/// `gateway`, `dates`, and `version` commands.
fn register_utilities(registry: &mut CommandRegistry) -> Result<(), RegistryError> {
    registry.describe_group(&["gateway"], "gateway connectivity")?;
    registry.register(
        &["gateway"],
        CommandDescriptor::new("ping", "check that the gateway is reachable", "gateway.ping"),
    )?;
    registry.describe_group(&["dates"], "local date utilities")?;
    registry.register(
        &["dates"],
        CommandDescriptor::new("segment", "split a date range into period-aligned segments", "dates.segment")
            .argument(
                ArgumentSpec::positional("start_date", "first day of the range")
                    .typed(ValueType::Date)
                    .value_name("START_DATE"),
            )
            .argument(
                ArgumentSpec::positional("end_date", "last day of the range")
                    .typed(ValueType::Date)
                    .value_name("END_DATE"),
            )
            .argument(
                ArgumentSpec::option("period", "segment size (e.g. A, 2A, Q, 6M, W, D)")
                    .short('p')
                    .typed(ValueType::Period)
                    .default_value("A")
                    .value_name("PERIOD"),
            ),
    )?;
    registry.register(&[], CommandDescriptor::new("version", "show the tradedesk version", "cli.version"))
}
