//! The state of one outcome while it is being finalized.

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::outcome::TransactionOutcome;

use super::types::{SessionId, StageCompletion};

/// Result of recording a stage completion on a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinStatus {
    /// The other stage is still running.
    Waiting,
    /// Both stages are done: deliver now.
    Ready,
    /// This stage had already reported. Nothing changed.
    Duplicate,
}

/// Whether a session may be delivered.
pub fn join_ready(animation_done: bool, printing_done: bool) -> bool {
    animation_done && printing_done
}

/// Mutable state for the outcome in flight.
///
/// Only one exists at a time. The orchestrator keeps it behind its session
/// lock and drops it in the same critical section that enqueues delivery.
#[derive(Debug, Clone)]
pub struct ProcessingSession {
    pub id: SessionId,
    pub outcome: TransactionOutcome,
    pub animation_done: bool,
    pub printing_done: bool,
    pub admitted_at: DateTime<Utc>,
    started: Instant,
}

impl ProcessingSession {
    pub fn new(outcome: TransactionOutcome) -> Self {
        Self {
            id: SessionId::new(),
            outcome,
            animation_done: false,
            printing_done: false,
            admitted_at: Utc::now(),
            started: Instant::now(),
        }
    }

    /// Mark the stage behind `completion` as done.
    pub fn record(&mut self, completion: &StageCompletion) -> JoinStatus {
        let flag = match completion {
            StageCompletion::Animation(_) => &mut self.animation_done,
            StageCompletion::Printing(_) => &mut self.printing_done,
        };

        if *flag {
            return JoinStatus::Duplicate;
        }
        *flag = true;

        if self.is_ready() {
            JoinStatus::Ready
        } else {
            JoinStatus::Waiting
        }
    }

    pub fn is_ready(&self) -> bool {
        join_ready(self.animation_done, self.printing_done)
    }

    /// Time since admission, on the tokio clock.
    pub fn elapsed(&self) -> std::time::Duration {
        self.started.elapsed()
    }
}
