// crates/tradedesk-core/src/core/error.rs
// ============================================================================
// Module: Tradedesk Outcomes
// Description: Error kinds, failures, and invocation outcomes.
// Purpose: Map every failure to a stable category and process exit code.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Every invocation ends in an [`Outcome`]: a success payload forwarded
//! verbatim to the renderer, or a [`Failure`] carrying an [`ErrorKind`].
//! Exit codes are part of the public contract so scripts can branch on them;
//! they must never be renumbered.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Error Kinds
// ============================================================================

/// Failure categories with stable exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A boolean assertion command evaluated to false.
    AssertionFailed,
    /// An argument name not declared by the command.
    UnknownArgument,
    /// A required argument was not supplied.
    MissingArgument,
    /// A value failed arity, choice, or type checks.
    InvalidArgumentValue,
    /// Two or more members of one exclusive group were supplied.
    ConflictingArguments,
    /// A date range with its start after its end.
    InvalidDateRange,
    /// The gateway executed the request and reported a failure.
    GatewayError,
    /// The gateway could not be reached.
    GatewayUnavailable,
    /// A lifecycle wait expired before every resource reached its target.
    TimeoutWaitingForState,
    /// A polled resource reported the `error` lifecycle state.
    ResourceFailed,
    /// The user interrupted a lifecycle wait.
    WaitAbandoned,
    /// A command referenced an operation that was never registered.
    UnresolvedOperation,
    /// Local file, prompt, or output I/O failed.
    LocalIo,
    /// Configuration is missing or invalid.
    Configuration,
}

impl ErrorKind {
    /// Every error kind, in exit-code order.
    pub const ALL: [Self; 14] = [
        Self::AssertionFailed,
        Self::UnknownArgument,
        Self::MissingArgument,
        Self::InvalidArgumentValue,
        Self::ConflictingArguments,
        Self::InvalidDateRange,
        Self::GatewayError,
        Self::GatewayUnavailable,
        Self::TimeoutWaitingForState,
        Self::ResourceFailed,
        Self::UnresolvedOperation,
        Self::LocalIo,
        Self::Configuration,
        Self::WaitAbandoned,
    ];

    /// Returns the process exit code for this kind.
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::AssertionFailed => 1,
            Self::UnknownArgument => 2,
            Self::MissingArgument => 3,
            Self::InvalidArgumentValue => 4,
            Self::ConflictingArguments => 5,
            Self::InvalidDateRange => 6,
            Self::GatewayError => 10,
            Self::GatewayUnavailable => 11,
            Self::TimeoutWaitingForState => 12,
            Self::ResourceFailed => 13,
            Self::UnresolvedOperation => 70,
            Self::LocalIo => 74,
            Self::Configuration => 78,
            Self::WaitAbandoned => 130,
        }
    }

    /// Returns the stable snake_case label for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AssertionFailed => "assertion_failed",
            Self::UnknownArgument => "unknown_argument",
            Self::MissingArgument => "missing_argument",
            Self::InvalidArgumentValue => "invalid_argument_value",
            Self::ConflictingArguments => "conflicting_arguments",
            Self::InvalidDateRange => "invalid_date_range",
            Self::GatewayError => "gateway_error",
            Self::GatewayUnavailable => "gateway_unavailable",
            Self::TimeoutWaitingForState => "timeout_waiting_for_state",
            Self::ResourceFailed => "resource_failed",
            Self::WaitAbandoned => "wait_abandoned",
            Self::UnresolvedOperation => "unresolved_operation",
            Self::LocalIo => "local_io",
            Self::Configuration => "configuration",
        }
    }

    /// Returns true for errors detected before any remote call.
    #[must_use]
    pub const fn is_user_input(self) -> bool {
        matches!(
            self,
            Self::UnknownArgument
                | Self::MissingArgument
                | Self::InvalidArgumentValue
                | Self::ConflictingArguments
                | Self::InvalidDateRange
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Failures and Outcomes
// ============================================================================

/// Categorized failure with a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct Failure {
    /// Failure category.
    pub kind: ErrorKind,
    /// Human-readable message, passed through unchanged from its source.
    pub message: String,
}

impl Failure {
    /// Creates a new failure.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Returns the process exit code for this failure.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }
}

/// Result of dispatching one invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Structured payload returned by the operation.
    Success(Value),
    /// Categorized failure.
    Failure(Failure),
}

impl Outcome {
    /// Returns the process exit code for this outcome (0 on success).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Success(_) => 0,
            Self::Failure(failure) => failure.kind.exit_code(),
        }
    }

    /// Returns true when the outcome is a success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns the failure kind, if any.
    #[must_use]
    pub const fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure.kind),
        }
    }
}

impl From<Result<Value, Failure>> for Outcome {
    fn from(result: Result<Value, Failure>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(failure) => Self::Failure(failure),
        }
    }
}
