use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../schema/config-v1.json");

/// Upper bound for converter and print timeouts (one day). Kept in sync with
/// the schema's `maximum`.
pub const MAX_TIMEOUT_SECS: u64 = 86_400;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

/// Semantic checks that also apply to configs built in code.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.worker_count == 0 {
        return Err(invalid("worker_count must be at least 1"));
    }

    if config.history.capacity == 0 || config.history.query_limit == 0 {
        return Err(invalid("history capacity and query_limit must be at least 1"));
    }

    if config.converter.timeout_secs == 0 || config.printer.timeout_secs == 0 {
        return Err(invalid("converter and printer timeouts must be positive"));
    }

    for (name, secs) in [
        ("converter.timeout_secs", config.converter.timeout_secs),
        ("printer.timeout_secs", config.printer.timeout_secs),
    ] {
        if secs > MAX_TIMEOUT_SECS {
            return Err(ConfigError::Validation {
                message: format!(
                    "{} must be at most {} seconds, got {}",
                    name, MAX_TIMEOUT_SECS, secs
                ),
            });
        }
    }

    if config.converter.command.trim().is_empty() {
        return Err(invalid("converter.command must not be empty"));
    }

    if config.printer.command.trim().is_empty() {
        return Err(invalid("printer.command must not be empty"));
    }

    if let Some(name) = &config.printer.name {
        if name.trim().is_empty() {
            return Err(invalid(
                "printer.name must not be empty; omit it to use the default printer",
            ));
        }
    }

    if config.upload_directory == config.work_directory {
        return Err(invalid(
            "upload_directory and work_directory must be different directories",
        ));
    }

    Ok(())
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Validation {
        message: message.to_string(),
    }
}
