// crates/tradedesk-core/src/runtime/lifecycle.rs
// ============================================================================
// Module: Lifecycle Adapters
// Description: Start/stop adapters that drive the lifecycle poller.
// Purpose: Bind gateway lifecycle endpoints to the wait/poll protocol.
// Dependencies: async-trait, serde_json, crate::{interfaces, runtime}
// ============================================================================

//! ## Overview
//! [`GatewayLifecycle`] is a [`LifecycleSource`] backed by one gateway
//! collection endpoint: `POST` starts resources, `DELETE` stops them, and
//! `GET` reports `{id: state}`. [`LifecycleOperation`] reads the resource list
//! and wait flag from the invocation and hands both to [`await_state`].
//! [`ExistingResourceOperation`] confirms that a named resource is known to
//! the collection before delegating to another adapter.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Map;
use serde_json::Value;

use crate::core::error::ErrorKind;
use crate::core::error::Failure;
use crate::core::value::ValidatedInvocation;
use crate::interfaces::Gateway;
use crate::interfaces::GatewayError;
use crate::interfaces::GatewayRequest;
use crate::interfaces::LifecycleSource;
use crate::interfaces::LifecycleState;
use crate::interfaces::Method;
use crate::interfaces::Transition;
use crate::runtime::operation::OperationAdapter;
use crate::runtime::operation::OperationContext;
use crate::runtime::poller::await_state;

// ============================================================================
// SECTION: Gateway Lifecycle Source
// ============================================================================

/// Lifecycle source backed by a gateway collection endpoint.
pub struct GatewayLifecycle<'a> {
    /// Gateway used for every request.
    gateway: &'a dyn Gateway,
    /// Collection path, such as `/ibgrouter/gateways`.
    path: &'a str,
    /// Query key naming resources.
    resource_field: &'a str,
    /// Timeout for the mutating request.
    request_timeout: Option<Duration>,
}

impl<'a> GatewayLifecycle<'a> {
    /// Creates a lifecycle source.
    #[must_use]
    pub const fn new(gateway: &'a dyn Gateway, path: &'a str, resource_field: &'a str) -> Self {
        Self {
            gateway,
            path,
            resource_field,
            request_timeout: None,
        }
    }

    /// Sets the timeout applied to start/stop requests.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Builds a request naming the given resources.
    fn request_for(&self, method: Method, resources: &[String]) -> GatewayRequest {
        resources
            .iter()
            .fold(GatewayRequest::new(method, self.path), |request, resource| {
                request.query(self.resource_field, resource.as_str())
            })
    }
}

#[async_trait]
impl LifecycleSource for GatewayLifecycle<'_> {
    async fn request(
        &self,
        transition: Transition,
        resources: &[String],
    ) -> Result<Value, GatewayError> {
        let method = match transition {
            Transition::Start => Method::Post,
            Transition::Stop => Method::Delete,
        };
        let mut request = self.request_for(method, resources);
        request.timeout = self.request_timeout;
        self.gateway.call(request).await
    }

    async fn statuses(
        &self,
        resources: &[String],
    ) -> Result<BTreeMap<String, LifecycleState>, GatewayError> {
        let payload = self.gateway.call(self.request_for(Method::Get, resources)).await?;
        parse_statuses(&payload)
    }
}

/// Parses a `{id: state}` status payload. `null` means no resources.
///
/// # Errors
///
/// Returns [`GatewayError::Protocol`] for any other shape or an unknown state.
pub fn parse_statuses(payload: &Value) -> Result<BTreeMap<String, LifecycleState>, GatewayError> {
    let empty = Map::new();
    let entries = match payload {
        Value::Object(map) => map,
        Value::Null => &empty,
        _ => {
            return Err(GatewayError::Protocol(
                "status response must map resource ids to states".to_string(),
            ));
        }
    };
    entries
        .iter()
        .map(|(id, state)| {
            let label = state.as_str().ok_or_else(|| {
                GatewayError::Protocol(format!("status of '{id}' must be a string"))
            })?;
            Ok((id.clone(), LifecycleState::from_str(label)?))
        })
        .collect()
}

// ============================================================================
// SECTION: Lifecycle Operation
// ============================================================================

/// Start or stop adapter with optional waiting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleOperation {
    /// Requested transition.
    transition: Transition,
    /// Collection path.
    path: String,
    /// Argument (and query key) listing resources.
    resource_argument: String,
    /// Switch that requests waiting.
    wait_argument: String,
    /// Timeout for the mutating request.
    request_timeout: Option<Duration>,
}

impl LifecycleOperation {
    /// Creates a lifecycle adapter reading `resource_argument` and `wait`.
    #[must_use]
    pub fn new(transition: Transition, path: &str, resource_argument: &str) -> Self {
        Self {
            transition,
            path: path.to_string(),
            resource_argument: resource_argument.to_string(),
            wait_argument: "wait".to_string(),
            request_timeout: None,
        }
    }

    /// Sets the timeout applied to the start/stop request.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Returns the requested transition.
    #[must_use]
    pub const fn transition(&self) -> Transition {
        self.transition
    }
}

#[async_trait]
impl OperationAdapter for LifecycleOperation {
    async fn execute(
        &self,
        invocation: &ValidatedInvocation,
        context: &OperationContext<'_>,
    ) -> Result<Value, Failure> {
        let resources = invocation.strings(&self.resource_argument);
        let wait = invocation.flag(&self.wait_argument);
        let source = GatewayLifecycle::new(context.gateway, &self.path, &self.resource_argument)
            .with_request_timeout(self.request_timeout);
        let report = await_state(
            &source,
            self.transition,
            &resources,
            wait,
            context.poll,
            context.interrupt.clone(),
            context.observer,
        )
        .await?;
        if !wait {
            return Ok(report.acknowledgement);
        }
        Ok(Value::Object(
            report
                .statuses
                .into_iter()
                .map(|(id, state)| (id, Value::String(state.as_str().to_string())))
                .collect(),
        ))
    }
}

// ============================================================================
// SECTION: Existing Resource Operation
// ============================================================================

/// Adapter that fails with "no such ..." unless the status endpoint lists
/// every resource named by `argument`, then delegates to `inner`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingResourceOperation<A> {
    /// Collection path reporting `{id: state}`.
    path: String,
    /// Query key naming resources.
    resource_field: String,
    /// Argument holding the resource names; also the noun in the message.
    argument: String,
    /// Adapter run once the resources are confirmed.
    inner: A,
}

impl<A> ExistingResourceOperation<A> {
    /// Wraps `inner` with an existence check against `path`.
    #[must_use]
    pub fn new(path: &str, resource_field: &str, argument: &str, inner: A) -> Self {
        Self {
            path: path.to_string(),
            resource_field: resource_field.to_string(),
            argument: argument.to_string(),
            inner,
        }
    }
}

#[async_trait]
impl<A: OperationAdapter> OperationAdapter for ExistingResourceOperation<A> {
    async fn execute(
        &self,
        invocation: &ValidatedInvocation,
        context: &OperationContext<'_>,
    ) -> Result<Value, Failure> {
        let names = invocation.strings(&self.argument);
        let source = GatewayLifecycle::new(context.gateway, &self.path, &self.resource_field);
        let known = source.statuses(&names).await?;
        let missing: Vec<&str> =
            names.iter().filter(|name| !known.contains_key(*name)).map(String::as_str).collect();
        if !missing.is_empty() {
            return Err(Failure::new(
                ErrorKind::GatewayError,
                format!("no such {}: {}", self.argument, missing.join(", ")),
            ));
        }
        self.inner.execute(invocation, context).await
    }
}
