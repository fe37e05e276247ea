//! Inspector client error types.
use thiserror::Error;

/// Errors from inspector client operations.
#[derive(Debug, Error)]
pub enum CdpError {
    /// The WebSocket connection could not be established.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The transport closed while a command was outstanding, or a write
    /// was attempted after closure.
    #[error("connection to target lost")]
    ConnectionLost,

    /// A command did not receive a response within its deadline.
    #[error("command timed out: {method}")]
    Timeout {
        /// The protocol method that timed out.
        method: String,
    },

    /// The target answered with a JSON-RPC error object.
    #[error("target returned error {code}: {message}")]
    Rpc {
        /// The error code.
        code: i64,
        /// The error message.
        message: String,
    },

    /// An inbound frame could not be decoded.
    #[error("malformed frame: {0}")]
    InvalidMessage(String),
}
