use crate::config::Config;
use crate::error::ConfigError;

/// Validate a [`Config`], returning all detected violations.
///
/// Returns `Ok(())` when the config is valid, or `Err` with a
/// vector of every validation error found.
pub fn validate(config: &Config) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // max_sessions: 1–256
    if config.broker.max_sessions == 0 || config.broker.max_sessions > 256 {
        errors.push(ConfigError::Validation {
            field: "broker.max_sessions".to_string(),
            message: format!("must be 1\u{2013}256, got {}", config.broker.max_sessions),
        });
    }

    // command_timeout_secs: 1–300
    if config.broker.command_timeout_secs == 0 || config.broker.command_timeout_secs > 300 {
        errors.push(ConfigError::Validation {
            field: "broker.command_timeout_secs".to_string(),
            message: format!(
                "must be 1\u{2013}300, got {}",
                config.broker.command_timeout_secs,
            ),
        });
    }

    // connect_timeout_secs: 1–300
    if config.broker.connect_timeout_secs == 0 || config.broker.connect_timeout_secs > 300 {
        errors.push(ConfigError::Validation {
            field: "broker.connect_timeout_secs".to_string(),
            message: format!(
                "must be 1\u{2013}300, got {}",
                config.broker.connect_timeout_secs,
            ),
        });
    }

    // allowed_hosts: non-empty list of non-empty entries
    if config.broker.allowed_hosts.is_empty() {
        errors.push(ConfigError::Validation {
            field: "broker.allowed_hosts".to_string(),
            message: "must list at least one host".to_string(),
        });
    }
    for host in &config.broker.allowed_hosts {
        if host.trim().is_empty() {
            errors.push(ConfigError::Validation {
                field: "broker.allowed_hosts".to_string(),
                message: "entries must not be empty".to_string(),
            });
            break;
        }
    }

    // fetch_timeout_secs: 1–120
    if config.sourcemap.fetch_timeout_secs == 0 || config.sourcemap.fetch_timeout_secs > 120 {
        errors.push(ConfigError::Validation {
            field: "sourcemap.fetch_timeout_secs".to_string(),
            message: format!(
                "must be 1\u{2013}120, got {}",
                config.sourcemap.fetch_timeout_secs,
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
