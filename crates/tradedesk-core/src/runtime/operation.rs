// crates/tradedesk-core/src/runtime/operation.rs
// ============================================================================
// Module: Operation Table
// Description: Explicit registration table from operation ids to adapters.
// Purpose: Resolve command targets without runtime name lookups.
// Dependencies: async-trait, serde_json, thiserror, tokio
// ============================================================================

//! ## Overview
//! Each [`OperationId`] maps to one [`OperationAdapter`]. The table is built
//! at startup and [`OperationTable::verify_registry`] checks that every leaf
//! of the command registry resolves, turning what would be a runtime lookup
//! failure into a startup check.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::watch;

use crate::core::error::ErrorKind;
use crate::core::error::Failure;
use crate::core::identifiers::OperationId;
use crate::core::registry::CommandRegistry;
use crate::core::value::ValidatedInvocation;
use crate::interfaces::Gateway;
use crate::runtime::poller::PollConfig;
use crate::runtime::poller::WaitObserver;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Operation resolution failures. These indicate a programming defect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// No adapter is registered for the operation.
    #[error("unresolved operation '{0}'")]
    Unresolved(OperationId),
    /// A command targets an operation with no adapter.
    #[error("command '{command}' targets unresolved operation '{operation}'")]
    UnresolvedCommand {
        /// Command path.
        command: String,
        /// Operation id.
        operation: OperationId,
    },
    /// The operation was registered twice.
    #[error("operation '{0}' registered twice")]
    Duplicate(OperationId),
}

impl From<ResolveError> for Failure {
    fn from(error: ResolveError) -> Self {
        Self::new(ErrorKind::UnresolvedOperation, error.to_string())
    }
}

// ============================================================================
// SECTION: Adapters
// ============================================================================

/// Execution context shared by every adapter of one invocation.
pub struct OperationContext<'a> {
    /// Remote gateway.
    pub gateway: &'a dyn Gateway,
    /// Lifecycle wait settings.
    pub poll: PollConfig,
    /// Flips to `true` when the user interrupts.
    pub interrupt: watch::Receiver<bool>,
    /// Receives lifecycle wait progress.
    pub observer: &'a dyn WaitObserver,
}

/// Builds gateway requests from a validated invocation and interprets the
/// response.
#[async_trait]
pub trait OperationAdapter: Send + Sync {
    /// Executes the operation.
    ///
    /// # Errors
    ///
    /// Returns a [`Failure`] categorized by [`ErrorKind`].
    async fn execute(
        &self,
        invocation: &ValidatedInvocation,
        context: &OperationContext<'_>,
    ) -> Result<Value, Failure>;
}

// ============================================================================
// SECTION: Operation Table
// ============================================================================

/// Registration table from operation ids to adapters.
#[derive(Default, Clone)]
pub struct OperationTable {
    /// Adapters by operation id.
    adapters: BTreeMap<OperationId, Arc<dyn OperationAdapter>>,
}

impl OperationTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an adapter.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Duplicate`] when the id is already registered.
    pub fn register(
        &mut self,
        operation: &str,
        adapter: impl OperationAdapter + 'static,
    ) -> Result<(), ResolveError> {
        let id = OperationId::new(operation);
        if self.adapters.contains_key(&id) {
            return Err(ResolveError::Duplicate(id));
        }
        self.adapters.insert(id, Arc::new(adapter));
        Ok(())
    }

    /// Resolves an operation id to its adapter.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Unresolved`] when nothing is registered.
    pub fn resolve(&self, operation: &OperationId) -> Result<Arc<dyn OperationAdapter>, ResolveError> {
        self.adapters
            .get(operation)
            .cloned()
            .ok_or_else(|| ResolveError::Unresolved(operation.clone()))
    }

    /// Returns true when the id is registered.
    #[must_use]
    pub fn contains(&self, operation: &OperationId) -> bool {
        self.adapters.contains_key(operation)
    }

    /// Returns the registered ids in sorted order.
    pub fn operations(&self) -> impl Iterator<Item = &OperationId> {
        self.adapters.keys()
    }

    /// Checks that every registry leaf resolves.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::UnresolvedCommand`] for the first leaf whose
    /// operation is missing.
    pub fn verify_registry(&self, registry: &CommandRegistry) -> Result<(), ResolveError> {
        for (path, descriptor) in registry.leaves() {
            if !self.contains(&descriptor.operation) {
                return Err(ResolveError::UnresolvedCommand {
                    command: path.to_string(),
                    operation: descriptor.operation.clone(),
                });
            }
        }
        Ok(())
    }
}
