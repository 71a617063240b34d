//! Trait definitions for the external collaborators.

use async_trait::async_trait;

use super::error::PrinterError;
use crate::outcome::{OutcomeKind, PrintDecision, PrintScope, RecoveryChoice, TransactionOutcome};

/// Receipt printer.
///
/// Formatting the receipt and talking to the hardware are the implementation's
/// business. Implementations doing blocking I/O should move it to
/// `tokio::task::spawn_blocking`.
#[async_trait]
pub trait Printer: Send + Sync {
    /// Returns the name of this printer implementation.
    fn name(&self) -> &str;

    /// Prints the receipts covered by `scope` for the given outcome.
    async fn print(&self, scope: PrintScope, outcome: &TransactionOutcome)
        -> Result<(), PrinterError>;
}

/// Operator-facing prompts that return a choice.
///
/// Prompts are not bounded in time: the future resolves whenever the
/// operator answers.
#[async_trait]
pub trait DecisionProvider: Send + Sync {
    /// Ask whether (and which) receipts to print.
    async fn request_decision(&self, outcome: &TransactionOutcome) -> PrintDecision;

    /// Ask whether to retry after a print failure.
    async fn request_recovery(
        &self,
        outcome: &TransactionOutcome,
        error: &PrinterError,
    ) -> RecoveryChoice;
}

/// Visual feedback. All calls are notifications and run on the UI loop.
pub trait Presenter: Send + Sync {
    /// Show the result mark for an approved outcome.
    fn show_animation(&self, outcome: &TransactionOutcome, kind: OutcomeKind);

    fn show_printing_progress(&self);

    fn hide_printing_progress(&self) {}

    fn show_printing_error(&self, message: &str);

    fn show_printing_success(&self);
}

/// Receives the finalized outcome. Called once per admitted outcome, on the UI loop.
pub trait DeliverySink: Send + Sync {
    fn deliver(&self, outcome: TransactionOutcome);
}
