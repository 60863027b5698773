// crates/tradedesk-cli/src/audit.rs
// ============================================================================
// Module: CLI Audit Logging
// Description: Structured audit events for command invocations and waits.
// Purpose: Emit redacted JSON-lines audit logs without a logging framework.
// Dependencies: serde, serde_json, tradedesk-config, tradedesk-core
// ============================================================================

//! ## Overview
//! Every invocation produces one `cli_invocation` event; lifecycle waits add
//! one `wait_progress` event per status poll. Events carry argument names
//! only, never values, so secrets cannot reach the log.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;
use tradedesk_config::AuditConfig;
use tradedesk_core::LifecycleState;
use tradedesk_core::Outcome;
use tradedesk_core::WaitObserver;
use tradedesk_core::WaitProgress;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Invocation audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct InvocationAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Space-separated command path.
    pub command: String,
    /// Target operation id, when the command resolved.
    pub operation: Option<String>,
    /// Names of the supplied arguments.
    pub arguments: Vec<String>,
    /// `success` or `failure`.
    pub outcome: &'static str,
    /// Error kind label on failure.
    pub error_kind: Option<&'static str>,
    /// Process exit code.
    pub exit_code: u8,
    /// Wall-clock duration of validation and dispatch.
    pub duration_ms: u128,
}

/// Inputs required to construct an invocation audit event.
pub struct InvocationAuditParams<'a> {
    /// Space-separated command path.
    pub command: String,
    /// Target operation id, when the command resolved.
    pub operation: Option<String>,
    /// Names of the supplied arguments.
    pub arguments: Vec<String>,
    /// Final outcome.
    pub outcome: &'a Outcome,
    /// Elapsed time.
    pub duration: Duration,
}

/// Lifecycle wait progress event payload.
#[derive(Debug, Clone, Serialize)]
pub struct WaitAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Space-separated command path.
    pub command: String,
    /// Status queries issued so far.
    pub attempt: u32,
    /// State every resource must reach.
    pub target: LifecycleState,
    /// Latest observed states.
    pub statuses: BTreeMap<String, LifecycleState>,
    /// Status-query failure for this attempt.
    pub error: Option<String>,
}

impl InvocationAuditEvent {
    /// Creates a new invocation event with a consistent timestamp.
    #[must_use]
    pub fn new(params: InvocationAuditParams<'_>) -> Self {
        Self {
            event: "cli_invocation",
            timestamp_ms: now_ms(),
            command: params.command,
            operation: params.operation,
            arguments: params.arguments,
            outcome: if params.outcome.is_success() { "success" } else { "failure" },
            error_kind: params.outcome.error_kind().map(|kind| kind.as_str()),
            exit_code: params.outcome.exit_code(),
            duration_ms: params.duration.as_millis(),
        }
    }
}

impl WaitAuditEvent {
    /// Creates a wait event from one poll observation.
    #[must_use]
    pub fn new(command: &str, progress: &WaitProgress) -> Self {
        Self {
            event: "wait_progress",
            timestamp_ms: now_ms(),
            command: command.to_string(),
            attempt: progress.attempt,
            target: progress.target,
            statuses: progress.statuses.clone(),
            error: progress.error.clone(),
        }
    }
}

/// Milliseconds since the Unix epoch.
fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for CLI events.
pub trait AuditSink: Send + Sync {
    /// Record an invocation event.
    fn record(&self, event: &InvocationAuditEvent);

    /// Record a wait progress event.
    fn record_wait(&self, _event: &WaitAuditEvent) {}
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, event: &InvocationAuditEvent) {
        write_event(&mut io::stderr(), event);
    }

    fn record_wait(&self, event: &WaitAuditEvent) {
        write_event(&mut io::stderr(), event);
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, event: &InvocationAuditEvent) {
        if let Ok(mut file) = self.file.lock() {
            write_event(&mut *file, event);
        }
    }

    fn record_wait(&self, event: &WaitAuditEvent) {
        if let Ok(mut file) = self.file.lock() {
            write_event(&mut *file, event);
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &InvocationAuditEvent) {}
}

/// Serializes one event as a JSON line; failures are dropped.
fn write_event<W: Write, E: Serialize>(writer: &mut W, event: &E) {
    if let Ok(payload) = serde_json::to_string(event) {
        let _ = writeln!(writer, "{payload}");
        let _ = writer.flush();
    }
}

/// Builds the sink selected by the `[audit]` section.
///
/// # Errors
///
/// Returns an error when the audit file cannot be opened.
pub fn sink_from_config(config: &AuditConfig) -> io::Result<Box<dyn AuditSink>> {
    if !config.enabled {
        return Ok(Box::new(NoopAuditSink));
    }
    match &config.path {
        Some(path) => Ok(Box::new(FileAuditSink::new(path)?)),
        None => Ok(Box::new(StderrAuditSink)),
    }
}

// ============================================================================
// SECTION: Wait Observer
// ============================================================================

/// Forwards lifecycle poll observations to an audit sink.
pub struct AuditWaitObserver<'a> {
    /// Destination sink.
    sink: &'a dyn AuditSink,
    /// Command path attached to every event.
    command: String,
}

impl<'a> AuditWaitObserver<'a> {
    /// Creates an observer for one command.
    #[must_use]
    pub const fn new(sink: &'a dyn AuditSink, command: String) -> Self {
        Self {
            sink,
            command,
        }
    }
}

impl WaitObserver for AuditWaitObserver<'_> {
    fn on_poll(&self, progress: &WaitProgress) {
        self.sink.record_wait(&WaitAuditEvent::new(&self.command, progress));
    }
}
