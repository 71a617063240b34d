//! Host outcome data types.

use serde::{Deserialize, Serialize};

// ============================================================================
// Outcome Types
// ============================================================================

/// Whether the host answered a payment or a reconciliation (batch close).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    #[default]
    Transaction,
    Reconciliation,
}

impl OutcomeKind {
    /// Short lowercase name, used as a metrics label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transaction => "transaction",
            Self::Reconciliation => "reconciliation",
        }
    }
}

/// Which receipts the host asked the terminal to print.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrintRequirements {
    /// Customer copy.
    #[serde(default)]
    pub customer: bool,
    /// Merchant copy.
    #[serde(default)]
    pub merchant: bool,
}

impl PrintRequirements {
    /// Both copies.
    pub fn both() -> Self {
        Self {
            customer: true,
            merchant: true,
        }
    }

    /// No receipts at all.
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether at least one receipt has to be printed.
    pub fn any(&self) -> bool {
        self.customer || self.merchant
    }
}

/// The terminal result of a transaction or reconciliation, as reported by the host.
///
/// Immutable once received: the orchestrator owns it for one processing cycle
/// and hands it to the delivery sink unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionOutcome {
    /// Host transaction id.
    pub id: String,
    /// Host status code. Zero means approved.
    pub status_code: i32,
    /// Human readable host message.
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub print_requirements: PrintRequirements,
    #[serde(default)]
    pub kind: OutcomeKind,
}

impl TransactionOutcome {
    /// Create an approved transaction outcome.
    pub fn approved(id: impl Into<String>, print_requirements: PrintRequirements) -> Self {
        Self {
            id: id.into(),
            status_code: 0,
            message: String::new(),
            print_requirements,
            kind: OutcomeKind::Transaction,
        }
    }

    /// Create a failed outcome carrying the host's status code and message.
    pub fn failed(id: impl Into<String>, status_code: i32, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status_code,
            message: message.into(),
            print_requirements: PrintRequirements::none(),
            kind: OutcomeKind::Transaction,
        }
    }

    /// Set the host message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Set the outcome kind.
    pub fn with_kind(mut self, kind: OutcomeKind) -> Self {
        self.kind = kind;
        self
    }

    /// Whether the host approved the operation.
    pub fn is_success(&self) -> bool {
        self.status_code == 0
    }

    /// Whether the host asked for at least one receipt.
    pub fn requires_printing(&self) -> bool {
        self.print_requirements.any()
    }
}

// ============================================================================
// Printing Choices
// ============================================================================

/// The set of receipts a print operation covers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PrintScope {
    All,
    CustomerOnly,
    MerchantOnly,
}

impl PrintScope {
    /// Derive the scope the host asked for. `None` when nothing is required.
    pub fn from_requirements(requirements: &PrintRequirements) -> Option<Self> {
        match (requirements.customer, requirements.merchant) {
            (true, true) => Some(Self::All),
            (true, false) => Some(Self::CustomerOnly),
            (false, true) => Some(Self::MerchantOnly),
            (false, false) => None,
        }
    }

    pub fn includes_customer(&self) -> bool {
        matches!(self, Self::All | Self::CustomerOnly)
    }

    pub fn includes_merchant(&self) -> bool {
        matches!(self, Self::All | Self::MerchantOnly)
    }
}

/// The operator's answer to the print prompt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PrintDecision {
    PrintAll,
    CustomerOnly,
    MerchantOnly,
    Skip,
}

impl PrintDecision {
    /// Map the option list shown to the operator (in display order) to a decision.
    ///
    /// Display order is: all receipts, customer only, merchant only, do not print.
    pub fn from_option_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::PrintAll),
            1 => Some(Self::CustomerOnly),
            2 => Some(Self::MerchantOnly),
            3 => Some(Self::Skip),
            _ => None,
        }
    }

    /// Map a plain yes/no confirmation to a decision.
    pub fn from_confirmation(confirmed: bool) -> Self {
        if confirmed {
            Self::PrintAll
        } else {
            Self::Skip
        }
    }

    /// The scope to print, or `None` for `Skip`.
    pub fn scope(&self) -> Option<PrintScope> {
        match self {
            Self::PrintAll => Some(PrintScope::All),
            Self::CustomerOnly => Some(PrintScope::CustomerOnly),
            Self::MerchantOnly => Some(PrintScope::MerchantOnly),
            Self::Skip => None,
        }
    }
}

/// The operator's answer on the print error prompt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryChoice {
    Retry,
    Cancel,
}
