use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Animation durations are not 0
/// - At least one print attempt is allowed
/// - The stage event channel has capacity
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Animation validation
    if config.animation.transaction_duration_ms == 0 {
        return Err(ConfigError::ValidationError(
            "animation.transaction_duration_ms cannot be 0".to_string(),
        ));
    }
    if config.animation.reconciliation_duration_ms == 0 {
        return Err(ConfigError::ValidationError(
            "animation.reconciliation_duration_ms cannot be 0".to_string(),
        ));
    }

    // Printing validation
    if config.printing.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "printing.max_attempts must be at least 1".to_string(),
        ));
    }

    // Orchestrator validation
    if config.orchestrator.event_buffer == 0 {
        return Err(ConfigError::ValidationError(
            "orchestrator.event_buffer cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_zero_duration_fails() {
        let mut config = Config::default();
        config.animation.reconciliation_duration_ms = 0;
        let result = validate_config(&config);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_zero_attempts_fails() {
        let mut config = Config::default();
        config.printing.max_attempts = 0;
        let err = validate_config(&config).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration validation failed: printing.max_attempts must be at least 1"
        );
    }

    #[test]
    fn test_validate_zero_event_buffer_fails() {
        let mut config = Config::default();
        config.orchestrator.event_buffer = 0;
        assert!(validate_config(&config).is_err());
    }
}
