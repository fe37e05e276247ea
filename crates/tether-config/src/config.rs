use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Log verbosity level.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Most verbose.
    Trace,
    /// Debug messages.
    Debug,
    /// Informational messages (default).
    #[default]
    Info,
    /// Warnings only.
    Warn,
    /// Errors only.
    Error,
}

/// Broker limits and target admission settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerSettings {
    /// Maximum number of concurrently connected sessions.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
    /// Per-command response deadline, in seconds.
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,
    /// WebSocket connect deadline, in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Hosts a target URL may point at. Anything else is rejected;
    /// add entries here to explicitly allow remote targets.
    #[serde(default = "default_allowed_hosts")]
    pub allowed_hosts: Vec<String>,
}

fn default_max_sessions() -> usize {
    16
}

fn default_command_timeout() -> u64 {
    5
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_allowed_hosts() -> Vec<String> {
    vec![
        "localhost".to_string(),
        "127.0.0.1".to_string(),
        "::1".to_string(),
    ]
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
            command_timeout_secs: default_command_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            allowed_hosts: default_allowed_hosts(),
        }
    }
}

/// Source-map fetching behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMapSettings {
    /// Whether external maps may be fetched over http(s).
    #[serde(default = "default_true")]
    pub fetch_http: bool,
    /// Deadline for one http(s) map fetch, in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_fetch_timeout() -> u64 {
    5
}

impl Default for SourceMapSettings {
    fn default() -> Self {
        Self {
            fetch_http: default_true(),
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogSettings {
    /// Log verbosity.
    #[serde(default)]
    pub level: LogLevel,
    /// Log file path; platform default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

/// Top-level tether configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Broker limits and admission.
    #[serde(default)]
    pub broker: BrokerSettings,
    /// Source-map fetching.
    #[serde(default)]
    pub sourcemap: SourceMapSettings,
    /// Logging.
    #[serde(default)]
    pub log: LogSettings,
}
