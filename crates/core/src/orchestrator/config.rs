//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the result orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Capacity of the stage event channel.
    /// Each session produces exactly two events, so small values are fine.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_event_buffer() -> usize {
    16
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            event_buffer: default_event_buffer(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.event_buffer, 16);
    }

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
            event_buffer = 4
        "#;
        let config: OrchestratorConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.event_buffer, 4);
    }
}
