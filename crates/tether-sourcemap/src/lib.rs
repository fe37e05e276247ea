//! tether-sourcemap — v3 source-map engine for the debugging broker.
//!
//! Resolves source-map references emitted by the inspector (inline
//! data-URLs or script-relative URLs), fetches map bodies through an
//! injected fetcher, decodes the VLQ mapping table, and answers
//! bidirectional position queries plus original-source content lookups.

pub mod consumer;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod resolve;

mod vlq;

// Re-export key types for convenience.
pub use consumer::{GeneratedPosition, OriginalPosition, SourceMapConsumer};
pub use engine::{LoadedMap, SourceMapEngine};
pub use error::SourceMapError;
pub use fetch::{DefaultFetcher, SourceMapFetcher, StaticFetcher};
pub use resolve::{resolve_reference, SourceMapReference};
