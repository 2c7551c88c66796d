//! Configuration parsing and validation for examclockd
//!
//! Supports TOML configuration with:
//! - Versioned schema
//! - Service paths and tick interval
//! - Factory default settings
//! - Session presets and an exam catalogue (built-in lists when omitted)
//! - Validation with clear error messages

mod policy;
mod presets;
mod schema;
mod validation;

pub use policy::*;
pub use presets::*;
pub use schema::*;
pub use validation::*;

use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<ValidationError> },

    #[error("Unsupported config version: {0}")]
    UnsupportedVersion(u32),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Load and validate configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<Policy> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Load the configuration if the file exists, otherwise use built-in defaults
pub fn load_config_or_default(path: impl AsRef<Path>) -> ConfigResult<Policy> {
    let path = path.as_ref();
    if path.exists() {
        load_config(path)
    } else {
        tracing::info!(path = %path.display(), "No config file, using built-in defaults");
        Ok(Policy::default())
    }
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<Policy> {
    let raw: RawConfig = toml::from_str(content)?;

    if raw.config_version != CURRENT_CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(raw.config_version));
    }

    let errors = validate_config(&raw);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    Ok(Policy::from_raw(raw))
}

/// Current supported config version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn parse_minimal_config() {
        let policy = parse_config("config_version = 1").unwrap();

        assert_eq!(policy.service.tick, Duration::from_secs(1));
        assert_eq!(policy.defaults.session_presets.len(), 10);
        assert!(!policy.exam_presets.is_empty());
    }

    #[test]
    fn defaults_layer_over_factory_settings() {
        let config = r#"
            config_version = 1

            [defaults]
            school_name = "Tamworth High School"
            show_seconds = false
        "#;

        let policy = parse_config(config).unwrap();
        assert_eq!(policy.defaults.settings.school_name, "Tamworth High School");
        assert!(!policy.defaults.settings.show_seconds);
        assert_eq!(
            policy.defaults.settings.session_title,
            "Trial HSC Examinations"
        );

        // presets are applied on top of the configured defaults
        let naplan = policy.defaults.settings_for("NAPLAN");
        assert_eq!(naplan.school_name, "Tamworth High School");
    }

    #[test]
    fn configured_presets_replace_builtins() {
        let config = r#"
            config_version = 1

            [[session_presets]]
            title = "Mock Exams"
            mode = "examinations"
        "#;

        let policy = parse_config(config).unwrap();
        assert_eq!(policy.defaults.session_presets.len(), 1);
        assert_eq!(
            policy.defaults.first_preset_title(examclock_api::SessionMode::Examinations),
            Some("Mock Exams")
        );
    }

    #[test]
    fn reject_wrong_version() {
        let result = parse_config("config_version = 99");
        assert!(matches!(result, Err(ConfigError::UnsupportedVersion(99))));
    }

    #[test]
    fn reject_invalid_values() {
        let config = r#"
            config_version = 1

            [service]
            tick_millis = 20
        "#;

        let result = parse_config(config);
        assert!(matches!(result, Err(ConfigError::ValidationFailed { .. })));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "config_version = 1").unwrap();
        writeln!(file, "[service]").unwrap();
        writeln!(file, "tick_millis = 250").unwrap();

        let policy = load_config(file.path()).unwrap();
        assert_eq!(policy.service.tick, Duration::from_millis(250));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let policy = load_config_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(policy.defaults, SessionDefaults::default());
    }
}
