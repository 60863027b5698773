// crates/tradedesk-core/src/lib.rs
// ============================================================================
// Module: Tradedesk Core Library
// Description: Public API surface for the Tradedesk dispatch engine.
// Purpose: Expose command descriptors, validation, dispatch, and polling.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Tradedesk core turns a static tree of declarative command descriptors into
//! validated invocations and dispatches them to remote operations through an
//! abstract [`Gateway`]. Start/stop operations on named resources can block on
//! the [`await_state`] lifecycle poller, and fetch operations can chunk large
//! windows with the [`segment`] date splitter.
//!
//! The crate performs no network or terminal I/O. Transports, prompts, and
//! rendering live in `tradedesk-cli`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::Gateway;
pub use interfaces::GatewayError;
pub use interfaces::GatewayRequest;
pub use interfaces::LifecycleSource;
pub use interfaces::LifecycleState;
pub use interfaces::Method;
pub use interfaces::RequestBody;
pub use interfaces::Transition;
pub use runtime::AssertionOperation;
pub use runtime::BodyMapping;
pub use runtime::ConditionalOperation;
pub use runtime::ExistingResourceOperation;
pub use runtime::GatewayLifecycle;
pub use runtime::LifecycleOperation;
pub use runtime::NoopWaitObserver;
pub use runtime::OperationAdapter;
pub use runtime::OperationContext;
pub use runtime::OperationTable;
pub use runtime::PollConfig;
pub use runtime::PollError;
pub use runtime::RequestOperation;
pub use runtime::ResolveError;
pub use runtime::SegmentedOperation;
pub use runtime::WaitMachine;
pub use runtime::WaitObserver;
pub use runtime::WaitProgress;
pub use runtime::WaitReport;
pub use runtime::WaitState;
pub use runtime::await_state;
pub use runtime::dispatch;
