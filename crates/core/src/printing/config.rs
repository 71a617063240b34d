//! Printing stage configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the printing stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintingConfig {
    /// Ask the operator before printing.
    /// When disabled, the receipts the host asked for are printed directly.
    #[serde(default = "default_confirm")]
    pub confirm_before_printing: bool,

    /// Print attempts per outcome, including the first one.
    /// Once exhausted the stage gives up without asking the operator again.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_confirm() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    3
}

impl Default for PrintingConfig {
    fn default() -> Self {
        Self {
            confirm_before_printing: default_confirm(),
            max_attempts: default_max_attempts(),
        }
    }
}
