//! Testing utilities and mock implementations of the collaborators.
//!
//! This module provides mock implementations of all collaborator traits,
//! allowing the whole finalization flow to run without a printer or a screen.
//!
//! # Example
//!
//! ```rust,ignore
//! use postpay_core::testing::{fixtures, MockDecisionProvider, MockPrinter, TestUi};
//!
//! let printer = Arc::new(MockPrinter::new());
//! let decisions = Arc::new(MockDecisionProvider::new());
//! let ui = TestUi::start();
//!
//! // Script the operator and the printer
//! decisions.push_decision(PrintDecision::CustomerOnly);
//! printer.fail_next(PrinterError::OutOfPaper);
//!
//! // Build stages with ui.handle()...
//! ```

mod mock_decisions;
mod mock_printer;
mod recording;

pub use mock_decisions::MockDecisionProvider;
pub use mock_printer::{MockPrinter, RecordedPrint};
pub use recording::{PresenterCall, RecordingPresenter, RecordingSink, TestUi};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::outcome::{OutcomeKind, PrintRequirements, TransactionOutcome};

    /// Approved sale asking for the customer copy only.
    pub fn customer_receipt(id: &str) -> TransactionOutcome {
        TransactionOutcome::approved(
            id,
            PrintRequirements {
                customer: true,
                merchant: false,
            },
        )
        .with_message("APPROVED")
    }

    /// Approved sale asking for the merchant copy only.
    pub fn merchant_receipt(id: &str) -> TransactionOutcome {
        TransactionOutcome::approved(
            id,
            PrintRequirements {
                customer: false,
                merchant: true,
            },
        )
        .with_message("APPROVED")
    }

    /// Approved sale asking for both copies.
    pub fn both_receipts(id: &str) -> TransactionOutcome {
        TransactionOutcome::approved(id, PrintRequirements::both()).with_message("APPROVED")
    }

    /// Approved sale without receipts.
    pub fn no_receipt(id: &str) -> TransactionOutcome {
        TransactionOutcome::approved(id, PrintRequirements::none()).with_message("APPROVED")
    }

    /// Host decline with the given status code.
    pub fn declined(id: &str, status_code: i32) -> TransactionOutcome {
        TransactionOutcome::failed(id, status_code, "DECLINED")
    }

    /// Completed reconciliation asking for the merchant report.
    pub fn reconciliation(id: &str) -> TransactionOutcome {
        merchant_receipt(id)
            .with_message("BATCH CLOSED")
            .with_kind(OutcomeKind::Reconciliation)
    }
}
