//! Broker error taxonomy.

use thiserror::Error;

use crate::state::SessionState;
use tether_cdp::CdpError;
use tether_sourcemap::SourceMapError;

/// Errors returned to callers of the command surface.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// No session with the given id.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// The operation is not permitted in the session's current state.
    #[error("{operation} not allowed while session is {state}")]
    InvalidState {
        /// The rejected operation.
        operation: String,
        /// The state it was rejected in.
        state: SessionState,
    },

    /// WebSocket handshake or domain enable failed, or the transport
    /// was lost mid-command.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The target answered a command with an error.
    #[error("target error {code}: {message}")]
    Protocol {
        /// JSON-RPC error code.
        code: i64,
        /// Error message from the target.
        message: String,
    },

    /// A caller-supplied value is unusable: malformed URL, rejected
    /// host, unknown frame or scope.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// A command exceeded its per-command deadline.
    #[error("command timed out: {0}")]
    Timeout(String),

    /// The breakpoint id was not created by this session.
    #[error("breakpoint not found: {0}")]
    BreakpointNotFound(String),

    /// The script id is unknown to this session.
    #[error("script not found: {0}")]
    ScriptNotFound(String),

    /// A source-map failure surfaced to the caller.
    #[error("source map error: {0}")]
    SourceMap(#[from] SourceMapError),

    /// The registry is at its configured session capacity.
    #[error("maximum session count reached ({0})")]
    MaxSessionsReached(usize),
}

impl BrokerError {
    /// The stable machine-readable error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::SessionNotFound(_) => "SESSION_NOT_FOUND",
            Self::InvalidState { .. } => "SESSION_INVALID_STATE",
            Self::ConnectionFailed(_) => "CONNECTION_FAILED",
            Self::Protocol { .. } => "PROTOCOL_ERROR",
            Self::InvalidParameters(_) => "INVALID_PARAMETERS",
            Self::Timeout(_) => "TIMEOUT",
            Self::BreakpointNotFound(_) => "BREAKPOINT_NOT_FOUND",
            Self::ScriptNotFound(_) => "SCRIPT_NOT_FOUND",
            Self::SourceMap(_) => "SOURCE_MAP_ERROR",
            Self::MaxSessionsReached(_) => "MAX_SESSIONS_REACHED",
        }
    }
}

impl From<CdpError> for BrokerError {
    fn from(err: CdpError) -> Self {
        match err {
            CdpError::Connect(msg) => Self::ConnectionFailed(msg),
            CdpError::ConnectionLost => Self::ConnectionFailed("connection to target lost".into()),
            CdpError::Timeout { method } => Self::Timeout(method),
            CdpError::Rpc { code, message } => Self::Protocol { code, message },
            CdpError::InvalidMessage(msg) => Self::ConnectionFailed(msg),
        }
    }
}
