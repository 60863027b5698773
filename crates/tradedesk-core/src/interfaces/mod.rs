// crates/tradedesk-core/src/interfaces/mod.rs
// ============================================================================
// Module: Tradedesk Interfaces
// Description: Backend-agnostic gateway and lifecycle-status traits.
// Purpose: Define the contract between dispatch and remote collaborators.
// Dependencies: async-trait, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The [`Gateway`] is the single remote collaborator: it accepts a
//! [`GatewayRequest`] and returns a structured JSON payload or a
//! [`GatewayError`] with a machine-readable category. The
//! [`LifecycleSource`] narrows the gateway to what the lifecycle poller needs:
//! one mutating transition request and a status query.
//!
//! Implementations must be `Send + Sync`; the CLI drives them from a tokio
//! runtime.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::error::ErrorKind;
use crate::core::error::Failure;

// ============================================================================
// SECTION: Gateway Requests
// ============================================================================

/// Request method understood by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Read.
    Get,
    /// Create or trigger.
    Post,
    /// Replace or set.
    Put,
    /// Remove or stop.
    Delete,
}

impl Method {
    /// Returns the uppercase method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request body variants.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// No body.
    Empty,
    /// JSON document.
    Json(Value),
    /// Raw text (uploaded files).
    Text(String),
    /// URL-encoded form fields.
    Form(Vec<(String, String)>),
}

/// One request to the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayRequest {
    /// Request method.
    pub method: Method,
    /// Path relative to the gateway base URL, starting with `/`.
    pub path: String,
    /// Query parameters; repeated keys encode lists.
    pub query: Vec<(String, String)>,
    /// Request body.
    pub body: RequestBody,
    /// Per-request timeout override.
    pub timeout: Option<Duration>,
}

impl GatewayRequest {
    /// Creates a request with no query, body, or timeout override.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            timeout: None,
        }
    }

    /// Appends one query parameter.
    #[must_use]
    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    /// Returns every query value for `key`.
    #[must_use]
    pub fn query_values(&self, key: &str) -> Vec<&str> {
        self.query.iter().filter(|(name, _)| name == key).map(|(_, value)| value.as_str()).collect()
    }
}

// ============================================================================
// SECTION: Gateway Errors
// ============================================================================

/// Gateway invocation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Transport-level failure reaching the gateway.
    #[error("gateway unavailable: {0}")]
    Unavailable(String),
    /// The gateway executed and reported a failure.
    #[error("{message}")]
    Remote {
        /// Machine-readable error category.
        category: String,
        /// Human-readable message, passed through unchanged.
        message: String,
    },
    /// The response could not be interpreted.
    #[error("gateway protocol error: {0}")]
    Protocol(String),
    /// No gateway is configured for this process.
    #[error("gateway not configured: {0}")]
    NotConfigured(String),
}

impl GatewayError {
    /// Returns the error kind for exit-code mapping.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Unavailable(_) => ErrorKind::GatewayUnavailable,
            Self::Remote {
                ..
            }
            | Self::Protocol(_) => ErrorKind::GatewayError,
            Self::NotConfigured(_) => ErrorKind::Configuration,
        }
    }
}

impl From<GatewayError> for Failure {
    fn from(error: GatewayError) -> Self {
        let message = match &error {
            GatewayError::Remote {
                message, ..
            } => message.clone(),
            _ => error.to_string(),
        };
        Self::new(error.kind(), message)
    }
}

// ============================================================================
// SECTION: Gateway Trait
// ============================================================================

/// Remote collaborator that executes operations.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Executes one request.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the transport fails or the gateway
    /// reports a failure.
    async fn call(&self, request: GatewayRequest) -> Result<Value, GatewayError>;
}

// ============================================================================
// SECTION: Lifecycle
// ============================================================================

/// Closed set of lifecycle states reported by the status operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Transition to running in progress.
    Starting,
    /// Running.
    Running,
    /// Transition to stopped in progress.
    Stopping,
    /// Stopped.
    Stopped,
    /// Failed; terminal for any wait.
    Error,
}

impl LifecycleState {
    /// Returns the wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleState {
    type Err = GatewayError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "starting" => Ok(Self::Starting),
            "running" => Ok(Self::Running),
            "stopping" => Ok(Self::Stopping),
            "stopped" => Ok(Self::Stopped),
            "error" => Ok(Self::Error),
            other => Err(GatewayError::Protocol(format!("unknown lifecycle state '{other}'"))),
        }
    }
}

/// Requested lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    /// Start resources; target is [`LifecycleState::Running`].
    Start,
    /// Stop resources; target is [`LifecycleState::Stopped`].
    Stop,
}

impl Transition {
    /// Returns the state a wait for this transition expects.
    #[must_use]
    pub const fn target_state(self) -> LifecycleState {
        match self {
            Self::Start => LifecycleState::Running,
            Self::Stop => LifecycleState::Stopped,
        }
    }

    /// Returns the lowercase verb.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
        }
    }
}

/// Remote resources whose lifecycle can be driven and observed.
#[async_trait]
pub trait LifecycleSource: Send + Sync {
    /// Issues the mutating transition request; the gateway transitions
    /// asynchronously. An empty `resources` slice means every resource.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the request fails.
    async fn request(
        &self,
        transition: Transition,
        resources: &[String],
    ) -> Result<Value, GatewayError>;

    /// Returns the current state of each resource. An empty `resources`
    /// slice means every resource.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the status query fails.
    async fn statuses(
        &self,
        resources: &[String],
    ) -> Result<BTreeMap<String, LifecycleState>, GatewayError>;
}
