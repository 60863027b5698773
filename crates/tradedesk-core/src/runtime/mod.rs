// crates/tradedesk-core/src/runtime/mod.rs
// ============================================================================
// Module: Tradedesk Runtime
// Description: Operation resolution, dispatch, and lifecycle polling.
// Purpose: Turn validated invocations into gateway calls and outcomes.
// Dependencies: crate::{core, interfaces}, tokio
// ============================================================================

//! ## Overview
//! The runtime holds the explicit operation registration table, the
//! declarative request adapters, the dispatcher, and the lifecycle wait
//! state machine.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod dispatch;
pub mod lifecycle;
pub mod operation;
pub mod poller;
pub mod request;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use dispatch::dispatch;
pub use lifecycle::ExistingResourceOperation;
pub use lifecycle::GatewayLifecycle;
pub use lifecycle::LifecycleOperation;
pub use lifecycle::parse_statuses;
pub use operation::OperationAdapter;
pub use operation::OperationContext;
pub use operation::OperationTable;
pub use operation::ResolveError;
pub use poller::NoopWaitObserver;
pub use poller::PollConfig;
pub use poller::PollError;
pub use poller::WaitMachine;
pub use poller::WaitObserver;
pub use poller::WaitProgress;
pub use poller::WaitReport;
pub use poller::WaitState;
pub use poller::await_state;
pub use request::AssertionOperation;
pub use request::BodyMapping;
pub use request::ConditionalOperation;
pub use request::RequestOperation;
pub use request::SegmentedOperation;
