//! tether-cdp — JSON-RPC 2.0 client for inspector WebSocket endpoints.
//!
//! This crate implements the wire half of the debugging broker: the
//! WebSocket transport with its reader/writer tasks, the JSON-RPC
//! envelope, and the command correlator that matches responses to
//! in-flight commands with per-command timeouts.

pub mod client;
pub mod dispatcher;
pub mod error;
pub mod protocol;
pub mod transport;

// Re-export key types for convenience.
pub use client::{CdpClient, DEFAULT_COMMAND_TIMEOUT};
pub use dispatcher::{DispatchResult, Dispatcher};
pub use error::CdpError;
pub use protocol::{parse_message, serialize_request, CdpMessage, RpcError};
pub use transport::{TransportEvent, TransportHandle};
