use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix for environment overrides, e.g. `POSTPAY_PRINTING__MAX_ATTEMPTS=5`
const ENV_PREFIX: &str = "POSTPAY_";

fn env_overrides() -> Env {
    // Keys contain underscores, so sections are split on a double underscore
    Env::prefixed(ENV_PREFIX).split("__")
}

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(env_overrides())
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load defaults with environment variable overrides (no config file)
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    Figment::new()
        .merge(env_overrides())
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[printing]
confirm_before_printing = false
max_attempts = 5
"#;
        let config = load_config_from_str(toml).unwrap();
        assert!(!config.printing.confirm_before_printing);
        assert_eq!(config.printing.max_attempts, 5);
        assert_eq!(config.animation.transaction_duration_ms, 1200);
    }

    #[test]
    fn test_load_config_from_str_wrong_type() {
        let toml = r#"
[printing]
max_attempts = "three"
"#;
        let result = load_config_from_str(toml);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/postpay.toml"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[animation]
transaction_duration_ms = 800

[orchestrator]
event_buffer = 4
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.animation.transaction_duration_ms, 800);
        assert_eq!(config.animation.reconciliation_duration_ms, 1200);
        assert_eq!(config.orchestrator.event_buffer, 4);
    }

    #[test]
    fn test_env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "postpay.toml",
                r#"
[printing]
max_attempts = 2
"#,
            )?;
            jail.set_env("POSTPAY_PRINTING__MAX_ATTEMPTS", "7");
            jail.set_env("POSTPAY_PRINTING__CONFIRM_BEFORE_PRINTING", "false");

            let config = load_config(Path::new("postpay.toml")).unwrap();
            assert_eq!(config.printing.max_attempts, 7);
            assert!(!config.printing.confirm_before_printing);

            let config = load_config_from_env().unwrap();
            assert_eq!(config.printing.max_attempts, 7);
            Ok(())
        });
    }
}
