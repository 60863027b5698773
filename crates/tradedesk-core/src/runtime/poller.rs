// crates/tradedesk-core/src/runtime/poller.rs
// ============================================================================
// Module: Lifecycle Poller
// Description: Wait/poll protocol for start/stop operations on resources.
// Purpose: Block until resources reach a target state or a deadline passes.
// Dependencies: serde, thiserror, tokio
// ============================================================================

//! ## Overview
//! [`await_state`] issues the mutating request first, then (when waiting is
//! requested) drives a [`WaitMachine`] with status observations until the
//! machine reaches a terminal [`WaitState`]:
//!
//! ```text
//! requested -> polling -> satisfied | timed_out | errored | abandoned
//! ```
//!
//! The machine is pure: it decides transitions from observations and the
//! clock, so timeout and interrupt handling are testable without a gateway.
//! The loop keeps at most one status query outstanding and never cancels
//! the transition request it already issued.
//!
//! # Invariants
//! - The first status query is issued immediately after the request.
//! - Sleeps never overshoot the deadline.
//! - A status query still in flight at the deadline is dropped and the wait
//!   times out.
//! - Any resource in `error` ends the wait at once, for start and stop alike.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::core::error::ErrorKind;
use crate::core::error::Failure;
use crate::interfaces::GatewayError;
use crate::interfaces::LifecycleSource;
use crate::interfaces::LifecycleState;
use crate::interfaces::Transition;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Default delay between status queries.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Default overall wait deadline.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(120);

/// Poll interval and wall-clock deadline for one wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between status queries.
    pub interval: Duration,
    /// Overall deadline measured from the first status query.
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_WAIT_TIMEOUT,
        }
    }
}

// ============================================================================
// SECTION: Wait States
// ============================================================================

/// State of one lifecycle wait.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WaitState {
    /// The transition was requested; no status observed yet.
    Requested,
    /// Status queries are in flight.
    Polling {
        /// Status queries issued so far.
        attempts: u32,
    },
    /// Every resource reached the target state.
    Satisfied,
    /// The deadline passed with resources still pending.
    TimedOut {
        /// Resources not in the target state.
        pending: Vec<String>,
    },
    /// At least one resource reported `error`.
    Errored {
        /// Resources in the `error` state.
        resources: Vec<String>,
    },
    /// The caller stopped waiting.
    Abandoned {
        /// Resources not yet in the target state.
        pending: Vec<String>,
    },
}

impl WaitState {
    /// Returns true for satisfied, timed out, errored, and abandoned.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(
            self,
            Self::Requested
                | Self::Polling {
                    ..
                }
        )
    }
}

/// Snapshot passed to a [`WaitObserver`] after each status query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaitProgress {
    /// One-based status query count.
    pub attempt: u32,
    /// Target lifecycle state.
    pub target: LifecycleState,
    /// States reported by the latest successful query.
    pub statuses: BTreeMap<String, LifecycleState>,
    /// Message of the latest failed query, when the query failed.
    pub error: Option<String>,
}

/// Receives lifecycle wait progress.
pub trait WaitObserver: Send + Sync {
    /// Called after every status query.
    fn on_poll(&self, progress: &WaitProgress);
}

/// Observer that ignores progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopWaitObserver;

impl WaitObserver for NoopWaitObserver {
    fn on_poll(&self, _progress: &WaitProgress) {}
}

// ============================================================================
// SECTION: Wait Machine
// ============================================================================

/// Pure transition logic of a lifecycle wait.
#[derive(Debug, Clone)]
pub struct WaitMachine {
    /// Target lifecycle state.
    target: LifecycleState,
    /// Resources being waited on; `None` until the first status response
    /// when the caller named none.
    resources: Option<BTreeSet<String>>,
    /// Current state.
    state: WaitState,
    /// Wall-clock deadline.
    deadline: Instant,
    /// Status queries observed.
    attempts: u32,
    /// Latest successful observation.
    latest: BTreeMap<String, LifecycleState>,
    /// Latest transient failure message.
    last_error: Option<String>,
}

impl WaitMachine {
    /// Creates a machine in the `requested` state.
    #[must_use]
    pub fn new(transition: Transition, resources: &[String], started: Instant, timeout: Duration) -> Self {
        let resources = if resources.is_empty() {
            None
        } else {
            Some(resources.iter().cloned().collect())
        };
        Self {
            target: transition.target_state(),
            resources,
            state: WaitState::Requested,
            deadline: started + timeout,
            attempts: 0,
            latest: BTreeMap::new(),
            last_error: None,
        }
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> &WaitState {
        &self.state
    }

    /// Returns the wall-clock deadline.
    #[must_use]
    pub const fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Returns the latest transient failure message.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Returns the latest observed states.
    #[must_use]
    pub const fn latest(&self) -> &BTreeMap<String, LifecycleState> {
        &self.latest
    }

    /// Records a successful status observation taken at `now`.
    pub fn observe(&mut self, statuses: BTreeMap<String, LifecycleState>, now: Instant) -> &WaitState {
        if self.state.is_terminal() {
            return &self.state;
        }
        self.attempts = self.attempts.saturating_add(1);
        self.last_error = None;
        if self.resources.is_none() {
            self.resources = Some(statuses.keys().cloned().collect());
        }
        self.latest = statuses;

        let errored: Vec<String> = self
            .tracked()
            .filter(|id| self.latest.get(*id) == Some(&LifecycleState::Error))
            .cloned()
            .collect();
        self.state = if !errored.is_empty() {
            WaitState::Errored {
                resources: errored,
            }
        } else if self.pending().is_empty() {
            WaitState::Satisfied
        } else {
            self.polling_or_expired(now)
        };
        &self.state
    }

    /// Records a transient status failure taken at `now`.
    pub fn observe_failure(&mut self, message: String, now: Instant) -> &WaitState {
        if self.state.is_terminal() {
            return &self.state;
        }
        self.attempts = self.attempts.saturating_add(1);
        self.last_error = Some(message);
        self.state = self.polling_or_expired(now);
        &self.state
    }

    /// Marks the wait as abandoned by the caller.
    pub fn abandon(&mut self) -> &WaitState {
        if !self.state.is_terminal() {
            self.state = WaitState::Abandoned {
                pending: self.pending(),
            };
        }
        &self.state
    }

    /// Moves a non-terminal wait to `timed_out` once `now` reaches the deadline.
    pub fn expire(&mut self, now: Instant) -> &WaitState {
        if !self.state.is_terminal() {
            self.state = self.polling_or_expired(now);
        }
        &self.state
    }

    /// Returns how long to sleep before the next query, or `None` once the
    /// deadline has passed.
    #[must_use]
    pub fn next_delay(&self, now: Instant, interval: Duration) -> Option<Duration> {
        let remaining = self.deadline.checked_duration_since(now)?;
        if remaining.is_zero() {
            return None;
        }
        Some(interval.min(remaining))
    }

    /// Returns the resources not yet in the target state, sorted.
    #[must_use]
    pub fn pending(&self) -> Vec<String> {
        self.tracked().filter(|id| self.latest.get(*id) != Some(&self.target)).cloned().collect()
    }

    /// Returns the progress snapshot for observers.
    #[must_use]
    pub fn progress(&self) -> WaitProgress {
        WaitProgress {
            attempt: self.attempts,
            target: self.target,
            statuses: self.latest.clone(),
            error: self.last_error.clone(),
        }
    }

    /// Iterates the tracked resource ids.
    fn tracked(&self) -> impl Iterator<Item = &String> {
        self.resources.iter().flatten()
    }

    /// Returns `polling`, or `timed_out` once `now` reaches the deadline.
    fn polling_or_expired(&self, now: Instant) -> WaitState {
        if now >= self.deadline {
            WaitState::TimedOut {
                pending: self.pending(),
            }
        } else {
            WaitState::Polling {
                attempts: self.attempts,
            }
        }
    }
}

// ============================================================================
// SECTION: Results
// ============================================================================

/// Successful wait summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaitReport {
    /// Acknowledgement returned by the transition request.
    pub acknowledgement: Value,
    /// Final observed states (empty when not waiting).
    pub statuses: BTreeMap<String, LifecycleState>,
    /// Status queries issued.
    pub attempts: u32,
}

/// Lifecycle wait failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    /// The transition request itself failed.
    #[error("{0}")]
    Request(GatewayError),
    /// The deadline passed with resources still pending.
    #[error("timed out waiting for {target}: {} still pending{}", pending.join(", "), last_error.as_ref().map(|err| format!(" (last status error: {err})")).unwrap_or_default())]
    TimedOut {
        /// Target state.
        target: LifecycleState,
        /// Resources not in the target state.
        pending: Vec<String>,
        /// Latest transient status failure.
        last_error: Option<String>,
    },
    /// At least one resource reported `error`.
    #[error("resources reported error state: {}", resources.join(", "))]
    ResourceFailed {
        /// Resources in the `error` state.
        resources: Vec<String>,
    },
    /// The caller interrupted the wait.
    #[error("stopped waiting for {} ({target} was requested and has not been cancelled)", pending.join(", "))]
    Abandoned {
        /// Target state.
        target: LifecycleState,
        /// Resources not yet in the target state.
        pending: Vec<String>,
    },
}

impl From<PollError> for Failure {
    fn from(error: PollError) -> Self {
        match error {
            PollError::Request(err) => err.into(),
            PollError::TimedOut {
                ..
            } => Self::new(ErrorKind::TimeoutWaitingForState, error.to_string()),
            PollError::ResourceFailed {
                ..
            } => Self::new(ErrorKind::ResourceFailed, error.to_string()),
            PollError::Abandoned {
                ..
            } => Self::new(ErrorKind::WaitAbandoned, error.to_string()),
        }
    }
}

// ============================================================================
// SECTION: Await
// ============================================================================

/// Requests a transition and optionally waits for the target state.
///
/// # Errors
///
/// Returns [`PollError`] when the request fails, the deadline passes, a
/// resource reports `error`, or the caller interrupts.
pub async fn await_state(
    source: &dyn LifecycleSource,
    transition: Transition,
    resources: &[String],
    wait: bool,
    config: PollConfig,
    mut interrupt: watch::Receiver<bool>,
    observer: &dyn WaitObserver,
) -> Result<WaitReport, PollError> {
    let acknowledgement = source.request(transition, resources).await.map_err(PollError::Request)?;
    if !wait {
        return Ok(WaitReport {
            acknowledgement,
            statuses: BTreeMap::new(),
            attempts: 0,
        });
    }

    let mut machine = WaitMachine::new(transition, resources, Instant::now(), config.timeout);
    loop {
        let observed = tokio::select! {
            biased;
            () = interrupted(&mut interrupt) => Observation::Interrupted,
            result = source.statuses(resources) => Observation::Statuses(result),
            () = tokio::time::sleep_until(machine.deadline()) => Observation::Expired,
        };
        match observed {
            Observation::Interrupted => {
                machine.abandon();
            }
            Observation::Expired => {
                machine.expire(Instant::now());
            }
            Observation::Statuses(Ok(statuses)) => {
                machine.observe(statuses, Instant::now());
                observer.on_poll(&machine.progress());
            }
            Observation::Statuses(Err(err)) => {
                machine.observe_failure(err.to_string(), Instant::now());
                observer.on_poll(&machine.progress());
            }
        }
        if machine.state().is_terminal() {
            break;
        }
        let Some(delay) = machine.next_delay(Instant::now(), config.interval) else {
            machine.expire(Instant::now());
            break;
        };
        tokio::select! {
            biased;
            () = interrupted(&mut interrupt) => {
                machine.abandon();
                break;
            }
            () = tokio::time::sleep(delay) => {}
        }
    }

    let target = transition.target_state();
    match machine.state().clone() {
        WaitState::Satisfied => Ok(WaitReport {
            acknowledgement,
            statuses: machine.latest().clone(),
            attempts: machine.progress().attempt,
        }),
        WaitState::Errored {
            resources,
        } => Err(PollError::ResourceFailed {
            resources,
        }),
        WaitState::Abandoned {
            pending,
        } => Err(PollError::Abandoned {
            target,
            pending,
        }),
        WaitState::TimedOut {
            pending,
        } => Err(PollError::TimedOut {
            target,
            pending,
            last_error: machine.last_error().map(str::to_string),
        }),
        WaitState::Requested
        | WaitState::Polling {
            ..
        } => Err(PollError::TimedOut {
            target,
            pending: machine.pending(),
            last_error: machine.last_error().map(str::to_string),
        }),
    }
}

/// Result of one status round, raced against the interrupt and the deadline.
enum Observation {
    /// The caller interrupted while the query was in flight.
    Interrupted,
    /// The deadline passed before the query answered.
    Expired,
    /// The status query answered.
    Statuses(Result<BTreeMap<String, LifecycleState>, GatewayError>),
}

/// Resolves once the interrupt flag is set; pends forever if the sender is
/// dropped without interrupting.
async fn interrupted(interrupt: &mut watch::Receiver<bool>) {
    loop {
        if *interrupt.borrow_and_update() {
            return;
        }
        if interrupt.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
