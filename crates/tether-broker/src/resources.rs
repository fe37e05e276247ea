//! Read-only resource projections of session state.
//!
//! The outer layer serves these under `debug://sessions` and
//! `debug://sessions/{id}`; serialization is its business, the shapes
//! are ours.

use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::breakpoint::BreakpointRecord;
use crate::session::DebugSession;
use crate::state::SessionState;
use crate::view::CallStack;

/// URI listing all session summaries.
pub const SESSIONS_URI: &str = "debug://sessions";

/// URI of one session's details.
pub fn session_uri(id: &str) -> String {
    format!("debug://sessions/{}", id)
}

/// One row of the session listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    /// External session id.
    pub id: String,
    /// Optional display name.
    pub name: Option<String>,
    /// Target URL.
    pub target_url: String,
    /// Current lifecycle state.
    pub state: SessionState,
    /// Creation time, seconds since the Unix epoch.
    pub created_at_unix: u64,
    /// Number of breakpoints the session tracks.
    pub breakpoint_count: usize,
    /// Pause reason, when paused.
    pub paused_reason: Option<String>,
}

/// Full detail view of one session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionDetails {
    /// The summary fields.
    #[serde(flatten)]
    pub summary: SessionSummary,
    /// All breakpoint records.
    pub breakpoints: Vec<BreakpointRecord>,
    /// The enriched call stack, when paused.
    pub call_stack: Option<CallStack>,
    /// Number of parsed scripts (internal ones included).
    pub script_count: usize,
}

/// Build the summary row for one session.
pub async fn summarize(session: &DebugSession) -> SessionSummary {
    SessionSummary {
        id: session.id().to_string(),
        name: session.name().map(str::to_string),
        target_url: session.target_url().to_string(),
        state: session.state().await,
        created_at_unix: session
            .created_at()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs(),
        breakpoint_count: session.breakpoints().await.len(),
        paused_reason: session.paused_reason().await,
    }
}

/// Build the detail view for one session.
pub async fn detail(session: &DebugSession) -> SessionDetails {
    let summary = summarize(session).await;
    let call_stack = if summary.state == SessionState::Paused {
        session.call_stack(true).await.ok()
    } else {
        None
    };
    SessionDetails {
        call_stack,
        breakpoints: session.breakpoints().await,
        script_count: session.scripts(true).await.len(),
        summary,
    }
}
