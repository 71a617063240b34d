//! Host outcomes and the operator choices made about them.

mod types;

pub use types::{
    OutcomeKind, PrintDecision, PrintRequirements, PrintScope, RecoveryChoice,
    TransactionOutcome,
};
