//! Configuration validation

use crate::error::{ConfigError, Result};

use super::types::Config;

/// Validate a loaded configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.github.branch.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "github.branch".to_string(),
            message: "branch must not be empty".to_string(),
        }
        .into());
    }

    for owner in &config.github.remotes {
        if owner.trim().is_empty() || owner.contains('/') {
            return Err(ConfigError::InvalidValue {
                field: "github.remotes".to_string(),
                message: format!("'{}' is not a valid owner name", owner),
            }
            .into());
        }
    }

    if config.build.poll_interval_secs == 0 {
        return Err(ConfigError::InvalidValue {
            field: "build.poll_interval_secs".to_string(),
            message: "poll interval must be at least 1 second".to_string(),
        }
        .into());
    }

    if config.build.timeout_secs < config.build.poll_interval_secs {
        return Err(ConfigError::InvalidValue {
            field: "build.timeout_secs".to_string(),
            message: "timeout must be at least one poll interval".to_string(),
        }
        .into());
    }

    if config.build.platforms.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "build.platforms".to_string(),
            message: "at least one platform is required".to_string(),
        }
        .into());
    }

    for (platform, name) in &config.build.artifact_names {
        if !name.ends_with(platform.artifact_extension()) {
            return Err(ConfigError::InvalidValue {
                field: "build.artifact_names".to_string(),
                message: format!(
                    "artifact name '{}' must end with {}",
                    name,
                    platform.artifact_extension()
                ),
            }
            .into());
        }
    }

    Ok(())
}
