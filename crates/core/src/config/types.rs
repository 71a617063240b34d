use serde::{Deserialize, Serialize};

use crate::animation::AnimationConfig;
use crate::orchestrator::OrchestratorConfig;
use crate::outcome::{PrintDecision, RecoveryChoice};
use crate::printing::PrintingConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub animation: AnimationConfig,
    #[serde(default)]
    pub printing: PrintingConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub simulator: SimulatorConfig,
}

/// Simulated collaborators for running the terminal without hardware
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulatorConfig {
    /// How long one simulated print takes (milliseconds)
    #[serde(default = "default_print_duration")]
    pub print_duration_ms: u64,
    /// Number of print attempts that fail before the printer recovers
    #[serde(default)]
    pub fail_first_attempts: u32,
    /// Answer given to every print prompt
    #[serde(default = "default_auto_decision")]
    pub auto_decision: PrintDecision,
    /// Answer given to every print error prompt
    #[serde(default = "default_auto_recovery")]
    pub auto_recovery: RecoveryChoice,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            print_duration_ms: default_print_duration(),
            fail_first_attempts: 0,
            auto_decision: default_auto_decision(),
            auto_recovery: default_auto_recovery(),
        }
    }
}

fn default_print_duration() -> u64 {
    500
}

fn default_auto_decision() -> PrintDecision {
    PrintDecision::PrintAll
}

fn default_auto_recovery() -> RecoveryChoice {
    RecoveryChoice::Retry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.animation.transaction_duration_ms, 1200);
        assert!(config.printing.confirm_before_printing);
        assert_eq!(config.orchestrator.event_buffer, 16);
        assert_eq!(config.simulator.auto_decision, PrintDecision::PrintAll);
    }

    #[test]
    fn test_simulator_section() {
        let toml = r#"
[simulator]
print_duration_ms = 50
fail_first_attempts = 2
auto_decision = "customer_only"
auto_recovery = "cancel"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.simulator.print_duration_ms, 50);
        assert_eq!(config.simulator.fail_first_attempts, 2);
        assert_eq!(config.simulator.auto_decision, PrintDecision::CustomerOnly);
        assert_eq!(config.simulator.auto_recovery, RecoveryChoice::Cancel);
    }
}
