//! Session state machine and cached target state.

use serde::{Deserialize, Serialize};

use crate::protocol::{PausedEvent, ScriptParsedEvent, WireCallFrame};

/// The lifecycle state of a debug session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// WebSocket and domain handshake in progress.
    Connecting,
    /// Handshake complete; the target has not reported execution state.
    Connected,
    /// The target is executing.
    Running,
    /// The target is stopped; a paused snapshot is present.
    Paused,
    /// The transport has ended. Terminal.
    Disconnected,
}

impl SessionState {
    /// Whether this state admits no further operations.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Disconnected)
    }

    /// The lowercase name used in errors and summaries.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Disconnected => "disconnected",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A script the target has parsed. Kept for the session's lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptRecord {
    /// Target-issued id; the table key.
    pub script_id: String,
    /// Script URL; empty for eval'd code.
    pub url: String,
    /// Declared source-map reference, as received.
    pub source_map_url: Option<String>,
    /// Script span: (start line, start column, end line, end column).
    pub span: (u32, u32, u32, u32),
    /// Content hash reported by the target.
    pub hash: Option<String>,
    /// Whether the script is an ES module.
    pub is_module: bool,
}

impl ScriptRecord {
    /// Build a record from a `scriptParsed` event.
    pub fn from_event(event: &ScriptParsedEvent) -> Self {
        Self {
            script_id: event.script_id.clone(),
            url: event.url.clone(),
            source_map_url: event.source_map_url.clone(),
            span: (
                event.start_line,
                event.start_column,
                event.end_line,
                event.end_column,
            ),
            hash: event.hash.clone(),
            is_module: event.is_module.unwrap_or(false),
        }
    }

    /// Whether the script belongs to the runtime rather than user code.
    pub fn is_internal(&self) -> bool {
        self.url.is_empty()
            || self.url.starts_with("node:")
            || self.url.starts_with("internal/")
            || self.url.contains("node_modules")
    }
}

/// The cached description of the target at its most recent pause.
///
/// Present exactly while the session is [`SessionState::Paused`];
/// replaced wholesale on every paused event. Frame and object ids in
/// here are invalid once the session leaves the paused state.
#[derive(Debug, Clone, PartialEq)]
pub struct PausedSnapshot {
    /// Why execution stopped.
    pub reason: String,
    /// Call frames, innermost first.
    pub call_frames: Vec<WireCallFrame>,
    /// Asynchronous stack trace, when tracked.
    pub async_stack_trace: Option<serde_json::Value>,
    /// Breakpoints hit at this pause.
    pub hit_breakpoints: Vec<String>,
}

impl PausedSnapshot {
    /// Build a snapshot from a `Debugger.paused` event.
    pub fn from_event(event: PausedEvent) -> Self {
        Self {
            reason: event.reason,
            call_frames: event.call_frames,
            async_stack_trace: event.async_stack_trace,
            hit_breakpoints: event.hit_breakpoints.unwrap_or_default(),
        }
    }

    /// Find a frame by its id.
    pub fn frame(&self, call_frame_id: &str) -> Option<&WireCallFrame> {
        self.call_frames
            .iter()
            .find(|f| f.call_frame_id == call_frame_id)
    }
}
