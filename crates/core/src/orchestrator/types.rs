//! Types for the result orchestrator.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::animation::AnimationEnd;
use crate::printing::{PrintingError, PrintingResolution, PrintingState};
use crate::ui::UiClosed;

/// Errors returned when admitting an outcome.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// A session is in flight; the new outcome was dropped.
    #[error("outcome {rejected} rejected: {active} is still being finalized")]
    AlreadyInProgress { active: String, rejected: String },

    /// `start` has not been called, or `shutdown` already ran.
    #[error("orchestrator is not running")]
    NotRunning,

    /// The UI loop is gone, so nothing can be delivered.
    #[error("dispatcher error: {0}")]
    Dispatcher(#[from] UiClosed),
}

/// What happened to an admitted outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Failure outcome, handed to the delivery sink without animation or printing.
    DeliveredImmediately,
    /// A processing session was opened.
    Started(SessionId),
}

/// Identifies one processing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form is enough to tell sessions apart in logs.
        let full = self.0.simple().to_string();
        f.write_str(&full[..8])
    }
}

/// Lifecycle of the most recent session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestratorPhase {
    /// Nothing admitted yet, or the orchestrator was shut down.
    #[default]
    Idle,
    /// Session created, stages not started yet.
    Admitted,
    /// Animation and printing running.
    Running,
    /// Both stages done, delivery being enqueued.
    Joined,
    /// The last session was delivered. Ready for the next outcome.
    Delivered,
}

/// A stage finished for a given session.
#[derive(Debug)]
pub struct StageEvent {
    pub session: SessionId,
    pub completion: StageCompletion,
}

/// The typed completion each stage reports.
#[derive(Debug)]
pub enum StageCompletion {
    Animation(AnimationEnd),
    Printing(Result<PrintingResolution, PrintingError>),
}

impl StageCompletion {
    /// Stage name for logging.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Animation(_) => "animation",
            Self::Printing(_) => "printing",
        }
    }
}

/// Counters since the orchestrator was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OrchestratorCounters {
    /// Sessions opened.
    pub admitted: u64,
    /// Sessions delivered.
    pub delivered: u64,
    /// Outcomes rejected because a session was in flight.
    pub rejected: u64,
    /// Failure outcomes delivered immediately.
    pub failures_delivered: u64,
}

/// Current status of the orchestrator.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrchestratorStatus {
    /// Whether the event loop is running.
    pub running: bool,
    pub phase: OrchestratorPhase,
    /// Session in flight, if any.
    pub session: Option<SessionId>,
    /// Outcome id of the session in flight.
    pub outcome_id: Option<String>,
    pub animation_done: bool,
    pub printing_done: bool,
    pub printing_state: PrintingState,
    pub counters: OrchestratorCounters,
}
