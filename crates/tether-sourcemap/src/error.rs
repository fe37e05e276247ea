//! Source-map error types.
use thiserror::Error;

/// Errors from source-map resolution, fetching, or parsing.
#[derive(Debug, Error)]
pub enum SourceMapError {
    /// The source-map reference could not be resolved to a location.
    #[error("unresolvable source map reference: {0}")]
    InvalidReference(String),

    /// Fetching the map body failed.
    #[error("source map fetch failed: {0}")]
    Fetch(String),

    /// The map body could not be parsed.
    #[error("source map parse error: {0}")]
    Parse(String),

    /// The map declares a version other than 3.
    #[error("unsupported source map version {0}")]
    UnsupportedVersion(u64),
}
