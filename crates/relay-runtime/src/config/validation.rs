//! Configuration validation.

use tracing_subscriber::filter::Directive;

use super::error::{ConfigError, ConfigResult};
use super::schema::{LogOutput, LoggingConfig, RelayConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &RelayConfig) -> ConfigResult<()> {
    validate_name(&config.name)?;
    validate_logging(&config.logging)?;
    Ok(())
}

fn validate_name(name: &str) -> ConfigResult<()> {
    if name.trim().is_empty() {
        return Err(ConfigError::validation("Relay name cannot be empty"));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(ConfigError::validation(format!(
            "Relay name cannot contain whitespace: {name:?}"
        )));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::validation(
            "logging.file_path is required when logging.output is \"file\"",
        ));
    }

    for (target, level) in &logging.filters {
        if target.is_empty() {
            return Err(ConfigError::validation("Log filter target cannot be empty"));
        }
        let directive = format!("{target}={level}");
        if let Err(err) = directive.parse::<Directive>() {
            return Err(ConfigError::validation(format!(
                "Invalid log filter {directive:?}: {err}"
            )));
        }
    }

    Ok(())
}
