// crates/tradedesk-cli/src/main.rs
// ============================================================================
// Module: Tradedesk CLI Entry Point
// Description: Parses argv, validates it, and dispatches to the gateway.
// Purpose: Turn one command line into one outcome and one exit code.
// Dependencies: clap, tokio, tradedesk-cli, tradedesk-config, tradedesk-core
// ============================================================================

//! ## Overview
//! One invocation runs parse, config, prompt, validate, dispatch, and render
//! in that order. Usage errors are reported before config is loaded, and
//! validation errors before any remote call. Every failure maps onto a stable
//! exit code through `ErrorKind`.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;
use std::time::Instant;

use thiserror::Error;
use tokio::sync::watch;
use tradedesk_cli::audit::AuditSink;
use tradedesk_cli::audit::AuditWaitObserver;
use tradedesk_cli::audit::InvocationAuditEvent;
use tradedesk_cli::audit::InvocationAuditParams;
use tradedesk_cli::audit::sink_from_config;
use tradedesk_cli::catalog::build_catalog;
use tradedesk_cli::gateway_client::HttpGateway;
use tradedesk_cli::gateway_client::HttpGatewayConfig;
use tradedesk_cli::gateway_client::UnconfiguredGateway;
use tradedesk_cli::output::render;
use tradedesk_cli::prompt::TerminalPrompt;
use tradedesk_cli::prompt::fill_secrets;
use tradedesk_cli::surface::GlobalArgs;
use tradedesk_cli::surface::ParseOutcome;
use tradedesk_cli::surface::ParsedInvocation;
use tradedesk_cli::surface::parse;
use tradedesk_cli::t;
use tradedesk_config::DEFAULT_CONFIG_NAME;
use tradedesk_config::GATEWAY_URL_ENV_VAR;
use tradedesk_config::OutputFormat;
use tradedesk_config::TradedeskConfig;
use tradedesk_core::CommandDescriptor;
use tradedesk_core::ErrorKind;
use tradedesk_core::Failure;
use tradedesk_core::Gateway;
use tradedesk_core::OperationContext;
use tradedesk_core::OperationTable;
use tradedesk_core::Outcome;
use tradedesk_core::PollConfig;
use tradedesk_core::dispatch;
use tradedesk_core::validate;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Time an interrupted operation gets to report its own abandonment.
const INTERRUPT_GRACE: Duration = Duration::from_millis(500);

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing failures.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Localized error message.
    message: String,
    /// Exit code reported for this error.
    code: u8,
}

impl CliError {
    /// Creates a new CLI error with a localized message and exit code.
    const fn new(message: String, code: u8) -> Self {
        Self {
            message,
            code,
        }
    }

    /// Creates an error for a failed stream write.
    fn io(message: String) -> Self {
        Self::new(message, ErrorKind::LocalIo.exit_code())
    }
}

/// Result alias for CLI operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err),
    }
}

/// Executes one command line and returns its exit code.
async fn run() -> CliResult<ExitCode> {
    let catalog = build_catalog().map_err(|err| {
        CliError::new(
            t!("catalog.invalid", error = err),
            ErrorKind::UnresolvedOperation.exit_code(),
        )
    })?;

    let parsed = match parse(&catalog.registry, std::env::args_os()) {
        Ok(ParseOutcome::Display(text)) => {
            write_stdout_line(text.trim_end())
                .map_err(|err| CliError::io(output_error("stdout", &err)))?;
            return Ok(ExitCode::SUCCESS);
        }
        Ok(ParseOutcome::Invocation(parsed)) => parsed,
        Err(failure) => {
            write_stderr_line(failure.message.trim_end())
                .map_err(|err| CliError::io(output_error("stderr", &err)))?;
            return Ok(ExitCode::from(failure.exit_code()));
        }
    };

    let config = TradedeskConfig::load(parsed.globals.config.as_deref()).map_err(|err| {
        CliError::new(t!("config.load_failed", error = err), ErrorKind::Configuration.exit_code())
    })?;
    let settings = Settings::resolve(&config, &parsed.globals);
    let sink = sink_from_config(&config.audit).map_err(|err| {
        let path =
            config.audit.path.as_ref().map_or_else(String::new, |path| path.display().to_string());
        CliError::new(
            t!("audit.open_failed", path = path, error = err),
            ErrorKind::LocalIo.exit_code(),
        )
    })?;
    let gateway = build_gateway(&config)?;

    let segments: Vec<&str> = parsed.path.iter().map(String::as_str).collect();
    let Some(descriptor) = catalog.registry.leaf(&segments) else {
        return Err(CliError::new(
            t!("catalog.invalid", error = parsed.command_line()),
            ErrorKind::UnresolvedOperation.exit_code(),
        ));
    };

    let started = Instant::now();
    let outcome =
        execute(&catalog.operations, descriptor, &parsed, gateway.as_ref(), &settings, sink.as_ref())
            .await;
    sink.record(&InvocationAuditEvent::new(InvocationAuditParams {
        command: parsed.command_line(),
        operation: Some(descriptor.operation.to_string()),
        arguments: parsed.raw.names().map(str::to_string).collect(),
        outcome: &outcome,
        duration: started.elapsed(),
    }));

    report(&outcome, settings.format)?;
    Ok(ExitCode::from(outcome.exit_code()))
}

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Effective per-invocation settings after flag overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Settings {
    /// Output rendering format.
    format: OutputFormat,
    /// Lifecycle wait settings.
    poll: PollConfig,
}

impl Settings {
    /// Applies global flags over the loaded configuration.
    fn resolve(config: &TradedeskConfig, globals: &GlobalArgs) -> Self {
        let format = if globals.json { OutputFormat::Json } else { config.output.format };
        let interval = globals
            .poll_interval
            .map_or_else(|| config.wait.poll_interval(), Duration::from_millis);
        let timeout =
            globals.wait_timeout.map_or_else(|| config.wait.timeout(), Duration::from_secs);
        Self {
            format,
            poll: PollConfig {
                interval,
                timeout,
            },
        }
    }
}

/// Builds the gateway client, or a placeholder when no URL is configured.
fn build_gateway(config: &TradedeskConfig) -> CliResult<Box<dyn Gateway>> {
    let settings = HttpGatewayConfig::from_config(&config.gateway).map_err(|err| {
        CliError::new(t!("config.load_failed", error = err), ErrorKind::Configuration.exit_code())
    })?;
    match settings {
        Some(settings) => {
            let client = HttpGateway::new(settings).map_err(|err| {
                CliError::new(
                    t!("gateway.client_failed", error = err),
                    ErrorKind::Configuration.exit_code(),
                )
            })?;
            Ok(Box::new(client))
        }
        None => Ok(Box::new(UnconfiguredGateway::new(t!(
            "gateway.not_configured",
            file = DEFAULT_CONFIG_NAME,
            env = GATEWAY_URL_ENV_VAR
        )))),
    }
}

// ============================================================================
// SECTION: Execution
// ============================================================================

/// Prompts for secrets, validates, and dispatches one leaf command.
async fn execute(
    table: &OperationTable,
    descriptor: &CommandDescriptor,
    parsed: &ParsedInvocation,
    gateway: &dyn Gateway,
    settings: &Settings,
    sink: &dyn AuditSink,
) -> Outcome {
    let mut raw = parsed.raw.clone();
    if let Err(err) = fill_secrets(descriptor, &mut raw, &TerminalPrompt) {
        return Outcome::Failure(err.into());
    }
    let invocation = match validate(descriptor, &raw) {
        Ok(invocation) => invocation,
        Err(err) => return Outcome::Failure(err.into()),
    };

    let (interrupt_tx, interrupt_rx) = watch::channel(false);
    let listener = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = interrupt_tx.send(true);
        }
    });
    let observer = AuditWaitObserver::new(sink, parsed.command_line());
    let context = OperationContext {
        gateway,
        poll: settings.poll,
        interrupt: interrupt_rx.clone(),
        observer: &observer,
    };

    let dispatched = dispatch(table, &invocation, &context);
    tokio::pin!(dispatched);
    let outcome = tokio::select! {
        outcome = &mut dispatched => outcome,
        () = interrupted(interrupt_rx) => {
            tokio::time::timeout(INTERRUPT_GRACE, &mut dispatched).await.unwrap_or_else(|_| {
                Outcome::Failure(Failure::new(ErrorKind::WaitAbandoned, t!("main.interrupted")))
            })
        }
    };
    listener.abort();
    outcome
}

/// Resolves once the interrupt flag is raised; never resolves otherwise.
async fn interrupted(mut receiver: watch::Receiver<bool>) {
    while !*receiver.borrow_and_update() {
        if receiver.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Prints the outcome: payload to stdout, failure message to stderr.
fn report(outcome: &Outcome, format: OutputFormat) -> CliResult<()> {
    match outcome {
        Outcome::Success(payload) => {
            let text = render(payload, format).map_err(|err| {
                CliError::new(t!("output.render_failed", error = err), ErrorKind::LocalIo.exit_code())
            })?;
            if !text.is_empty() {
                write_stdout_line(&text).map_err(|err| CliError::io(output_error("stdout", &err)))?;
            }
        }
        Outcome::Failure(failure) => {
            write_stderr_line(&failure_line(failure))
                .map_err(|err| CliError::io(output_error("stderr", &err)))?;
        }
    }
    Ok(())
}

/// Formats a failure for stderr.
fn failure_line(failure: &Failure) -> String {
    t!("main.error", message = failure.message)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats a localized output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns its exit code.
fn emit_error(error: &CliError) -> ExitCode {
    let _ = write_stderr_line(&t!("main.error", message = error.message));
    ExitCode::from(error.code)
}
