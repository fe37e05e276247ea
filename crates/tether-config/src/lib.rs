//! tether-config — configuration loading for the tether broker.
//!
//! Typed settings for broker limits, target admission, source-map
//! fetching, and logging, loaded from TOML with a global/project merge
//! chain and validated before use.

pub mod config;
pub mod error;
pub mod load;
pub mod merge;
pub mod validate;

// Re-export key types for convenience.
pub use config::{BrokerSettings, Config, LogLevel, LogSettings, SourceMapSettings};
pub use error::ConfigError;
pub use load::load_config;
pub use merge::merge_configs;
pub use validate::validate;
