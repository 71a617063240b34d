//! Types for the printing stage.

use serde::Serialize;
use thiserror::Error;

use crate::collaborators::PrinterError;
use crate::outcome::PrintScope;

/// How a printing workflow ended. Exactly one per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum PrintingResolution {
    /// Receipts printed.
    Printed { scope: PrintScope, attempts: u32 },
    /// The host did not ask for any receipt.
    NotRequired,
    /// The operator chose not to print, or the stage was cancelled before printing.
    Declined,
    /// Printing failed and the operator (or a cancel) gave up on it.
    Abandoned { attempts: u32, last_error: PrinterError },
    /// Printing failed with no retry left.
    Failed { attempts: u32, last_error: PrinterError },
}

impl PrintingResolution {
    /// Whether receipts actually came out of the printer.
    pub fn printed(&self) -> bool {
        matches!(self, Self::Printed { .. })
    }

    /// Short name, used as a metrics label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Printed { .. } => "printed",
            Self::NotRequired => "not_required",
            Self::Declined => "declined",
            Self::Abandoned { .. } => "abandoned",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Where the printing workflow currently is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PrintingState {
    #[default]
    Idle,
    /// Evaluating whether the outcome needs receipts at all.
    Checking,
    /// Waiting for the operator's print decision.
    AwaitingConfirmation,
    /// A print operation is in flight.
    Printing { scope: PrintScope, attempt: u32 },
    /// The last attempt failed; waiting for retry or cancel.
    Error { attempt: u32, message: String },
    Done(PrintingResolution),
}

impl PrintingState {
    /// Whether a workflow is running (neither idle nor done).
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle | Self::Done(_))
    }

    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Checking => "checking",
            Self::AwaitingConfirmation => "awaiting_confirmation",
            Self::Printing { .. } => "printing",
            Self::Error { .. } => "error",
            Self::Done(_) => "done",
        }
    }
}

/// Errors that reject a printing request outright.
///
/// Failures of the print operation itself are not errors of the stage: they
/// end up in [`PrintingResolution::Failed`] or [`PrintingResolution::Abandoned`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PrintingError {
    /// Another print operation holds the printer.
    #[error("Printer busy, print request rejected")]
    PrinterBusy,

    /// This stage is already running a workflow.
    #[error("Printing workflow already active ({state})")]
    AlreadyActive { state: &'static str },
}
