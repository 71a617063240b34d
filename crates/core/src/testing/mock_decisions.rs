//! Mock operator for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::watch;

use crate::collaborators::{DecisionProvider, PrinterError};
use crate::outcome::{PrintDecision, RecoveryChoice, TransactionOutcome};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Mock implementation of the DecisionProvider trait.
///
/// Answers come from queues filled by the test. With an empty queue the
/// operator prints everything and cancels on errors, so a test that forgets
/// to script an answer cannot loop forever.
///
/// `hold_decisions` leaves print prompts unanswered until
/// `release_decisions`, like an operator walking away from the terminal.
#[derive(Debug)]
pub struct MockDecisionProvider {
    decisions: Mutex<VecDeque<PrintDecision>>,
    recoveries: Mutex<VecDeque<RecoveryChoice>>,
    decision_requests: AtomicUsize,
    recovery_requests: AtomicUsize,
    held: watch::Sender<bool>,
}

impl Default for MockDecisionProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDecisionProvider {
    /// Create a new mock operator.
    pub fn new() -> Self {
        let (held, _) = watch::channel(false);
        Self {
            decisions: Mutex::new(VecDeque::new()),
            recoveries: Mutex::new(VecDeque::new()),
            decision_requests: AtomicUsize::new(0),
            recovery_requests: AtomicUsize::new(0),
            held,
        }
    }

    /// Queue the answer for an upcoming print prompt.
    pub fn push_decision(&self, decision: PrintDecision) {
        lock(&self.decisions).push_back(decision);
    }

    /// Queue the answer for an upcoming print error prompt.
    pub fn push_recovery(&self, choice: RecoveryChoice) {
        lock(&self.recoveries).push_back(choice);
    }

    /// Leave print prompts unanswered.
    pub fn hold_decisions(&self) {
        self.held.send_replace(true);
    }

    /// Answer held and future print prompts again.
    pub fn release_decisions(&self) {
        self.held.send_replace(false);
    }

    /// Number of print prompts shown so far.
    pub fn decision_requests(&self) -> usize {
        self.decision_requests.load(Ordering::SeqCst)
    }

    /// Number of print error prompts shown so far.
    pub fn recovery_requests(&self) -> usize {
        self.recovery_requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DecisionProvider for MockDecisionProvider {
    async fn request_decision(&self, _outcome: &TransactionOutcome) -> PrintDecision {
        self.decision_requests.fetch_add(1, Ordering::SeqCst);

        let mut held = self.held.subscribe();
        // The sender lives as long as self.
        let _ = held.wait_for(|held| !*held).await;

        lock(&self.decisions)
            .pop_front()
            .unwrap_or(PrintDecision::PrintAll)
    }

    async fn request_recovery(
        &self,
        _outcome: &TransactionOutcome,
        _error: &PrinterError,
    ) -> RecoveryChoice {
        self.recovery_requests.fetch_add(1, Ordering::SeqCst);
        lock(&self.recoveries)
            .pop_front()
            .unwrap_or(RecoveryChoice::Cancel)
    }
}
