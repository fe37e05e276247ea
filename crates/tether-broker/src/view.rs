//! Idealized views returned by session operations.
//!
//! These are the broker's outputs: wire state projected through the
//! script table and source-map engine into what the controlling client
//! sees.

use serde::Serialize;

use crate::protocol::RemoteObject;

/// An original-source position resolved through a source map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OriginalLocation {
    /// Declared source path.
    pub source: String,
    /// 1-based line.
    pub line: u32,
    /// 0-based column.
    pub column: u32,
    /// Mapped identifier name, when the map carries one.
    pub name: Option<String>,
}

/// One call frame, enriched with script URL and original position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedFrame {
    /// Opaque frame handle, valid only for the current pause.
    pub call_frame_id: String,
    /// Name of the executing function; empty for top-level code.
    pub function_name: String,
    /// Script containing the execution point.
    pub script_id: String,
    /// The script's URL, when known.
    pub url: Option<String>,
    /// Generated 0-based line.
    pub line: u32,
    /// Generated 0-based column.
    pub column: u32,
    /// Scope kinds, innermost first; indexes feed scope queries.
    pub scopes: Vec<String>,
    /// Original position, when a source map resolves it.
    pub original: Option<OriginalLocation>,
}

/// The enriched call stack of a paused session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallStack {
    /// Frames, innermost first.
    pub frames: Vec<EnrichedFrame>,
    /// Asynchronous stack trace, when requested and tracked.
    pub async_stack_trace: Option<serde_json::Value>,
}

/// One scope variable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableEntry {
    /// Variable name.
    pub name: String,
    /// Its value as mirrored from the target.
    pub value: RemoteObject,
}

/// A script as listed to the controlling client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScriptInfo {
    /// Target-issued script id.
    pub script_id: String,
    /// Script URL.
    pub url: String,
    /// Whether the script is an ES module.
    pub is_module: bool,
    /// Whether a source map is loaded for it.
    pub has_source_map: bool,
    /// The declared source-map reference, as received.
    pub source_map_url: Option<String>,
}

/// Source text served for a script.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScriptSource {
    /// The text.
    pub source: String,
    /// URL or source path the text belongs to.
    pub source_url: String,
    /// True when the text is original source rather than generated.
    pub is_original: bool,
    /// The script's source-map reference, when declared.
    pub source_map_url: Option<String>,
}

/// Result of projecting a generated position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedLocation {
    /// Whether the script has a loaded source map.
    pub has_source_map: bool,
    /// The original position, when the map resolves it.
    pub original: Option<OriginalLocation>,
}
