use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading, parsing,
/// or validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The specified config file was not found.
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    /// Failed to create the default config file.
    #[error("failed to create default config: {0}")]
    CreateDefault(String),

    /// TOML parsing failed.
    #[error("TOML parse error: {0}")]
    Parse(String),

    /// A config value failed validation.
    #[error("validation error: {field}: {message}")]
    Validation {
        /// The dotted field path (e.g. `broker.max_sessions`).
        field: String,
        /// Human-readable description of the violation.
        message: String,
    },

    /// An I/O error occurred while reading or writing config files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display_contains_path() {
        let err = ConfigError::NotFound(PathBuf::from("/tmp/missing.toml"));
        assert!(err.to_string().contains("/tmp/missing.toml"));
    }

    #[test]
    fn parse_display() {
        let err = ConfigError::Parse("unexpected token".into());
        assert_eq!(err.to_string(), "TOML parse error: unexpected token");
    }

    #[test]
    fn validation_display_contains_field() {
        let err = ConfigError::Validation {
            field: "broker.max_sessions".into(),
            message: "must be at least 1".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("broker.max_sessions"));
        assert!(msg.contains("must be at least 1"));
    }

    #[test]
    fn io_from_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = ConfigError::from(io);
        assert!(err.to_string().contains("denied"));
    }
}
