//! Animation stage configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::outcome::OutcomeKind;

/// How long the result mark stays on screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationConfig {
    /// Display time after an approved sale (milliseconds).
    #[serde(default = "default_duration")]
    pub transaction_duration_ms: u64,

    /// Display time after a completed reconciliation (milliseconds).
    #[serde(default = "default_duration")]
    pub reconciliation_duration_ms: u64,
}

fn default_duration() -> u64 {
    1200
}

impl AnimationConfig {
    /// Display time for an outcome of the given kind.
    pub fn duration_for(&self, kind: OutcomeKind) -> Duration {
        let ms = match kind {
            OutcomeKind::Transaction => self.transaction_duration_ms,
            OutcomeKind::Reconciliation => self.reconciliation_duration_ms,
        };
        Duration::from_millis(ms)
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            transaction_duration_ms: default_duration(),
            reconciliation_duration_ms: default_duration(),
        }
    }
}
