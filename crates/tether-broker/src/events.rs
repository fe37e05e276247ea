//! Session notifications for the controlling client.
//!
//! The broker publishes one broadcast stream across all sessions; the
//! outer layer subscribes and forwards to its own transport.

use serde::Serialize;

/// A state change the controlling client should hear about.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionEvent {
    /// The session this event belongs to.
    pub session_id: String,
    /// What happened.
    #[serde(flatten)]
    pub kind: SessionEventKind,
}

/// The kinds of session notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEventKind {
    /// Execution paused.
    Paused {
        /// Why execution stopped.
        reason: String,
        /// Breakpoints hit at this pause.
        hit_breakpoints: Vec<String>,
    },
    /// Execution resumed.
    Resumed,
    /// The transport ended; the session is terminal.
    Disconnected {
        /// Human-readable cause.
        reason: String,
    },
}
