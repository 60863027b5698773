// crates/tradedesk-core/src/runtime/dispatch.rs
// ============================================================================
// Module: Dispatcher
// Description: Resolve, invoke, and categorize one validated invocation.
// Purpose: Produce the outcome that drives rendering and the exit code.
// Dependencies: crate::runtime::operation
// ============================================================================

//! ## Overview
//! Dispatch is a single call per invocation: resolve the operation, let its
//! adapter build and send the gateway request, and wrap the result in an
//! [`Outcome`]. The dispatcher never retries; success payloads pass through
//! unchanged and remote errors keep their message.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::error::Outcome;
use crate::core::value::ValidatedInvocation;
use crate::runtime::operation::OperationContext;
use crate::runtime::operation::OperationTable;

// ============================================================================
// SECTION: Dispatch
// ============================================================================

/// Dispatches a validated invocation through the operation table.
pub async fn dispatch(
    table: &OperationTable,
    invocation: &ValidatedInvocation,
    context: &OperationContext<'_>,
) -> Outcome {
    let adapter = match table.resolve(&invocation.operation) {
        Ok(adapter) => adapter,
        Err(err) => return Outcome::Failure(err.into()),
    };
    adapter.execute(invocation, context).await.into()
}
