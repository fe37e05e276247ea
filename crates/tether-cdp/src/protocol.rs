//! JSON-RPC 2.0 envelope for the inspector wire protocol.
//!
//! The inspector speaks JSON-RPC over WebSocket text frames: outbound
//! requests carry `{id, method, params}`, inbound frames are either
//! responses (`{id, result}` / `{id, error}`) or method notifications
//! (`{method, params}`).

use crate::error::CdpError;

/// An inbound message from the target.
#[derive(Debug, Clone, PartialEq)]
pub enum CdpMessage {
    /// A response to a previously issued command.
    Response {
        /// The id of the command this responds to.
        id: i64,
        /// The result value (if successful).
        result: Option<serde_json::Value>,
        /// The error (if failed).
        error: Option<RpcError>,
    },
    /// A notification pushed by the target (no id).
    Event {
        /// The event method name, e.g. `Debugger.paused`.
        method: String,
        /// The event parameters.
        params: serde_json::Value,
    },
}

/// An error object in a JSON-RPC response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcError {
    /// The error code.
    pub code: i64,
    /// The error message.
    pub message: String,
}

/// Serialize an outbound command into a JSON-RPC request string.
pub fn serialize_request(id: i64, method: &str, params: &serde_json::Value) -> String {
    serde_json::json!({
        "id": id,
        "method": method,
        "params": params,
    })
    .to_string()
}

/// Parse an inbound frame into a [`CdpMessage`].
///
/// A frame with an `id` is a response; a frame with a `method` but no
/// `id` is an event. Anything else is malformed.
pub fn parse_message(text: &str) -> Result<CdpMessage, CdpError> {
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| CdpError::InvalidMessage(format!("invalid JSON: {}", e)))?;

    let has_id = value.get("id").is_some();
    let has_method = value.get("method").is_some();

    match (has_id, has_method) {
        // Response: carries the id of the originating command.
        (true, _) => {
            let id = value["id"]
                .as_i64()
                .ok_or_else(|| CdpError::InvalidMessage("id must be an integer".into()))?;
            let result = value.get("result").cloned();
            let error = value.get("error").and_then(|e| {
                Some(RpcError {
                    code: e.get("code")?.as_i64()?,
                    message: e.get("message")?.as_str()?.to_string(),
                })
            });
            Ok(CdpMessage::Response { id, result, error })
        }
        // Event: method without an id.
        (false, true) => {
            let method = value["method"]
                .as_str()
                .ok_or_else(|| CdpError::InvalidMessage("method must be a string".into()))?
                .to_string();
            let params = value
                .get("params")
                .cloned()
                .unwrap_or(serde_json::Value::Null);
            Ok(CdpMessage::Event { method, params })
        }
        (false, false) => Err(CdpError::InvalidMessage(
            "frame has neither id nor method".to_string(),
        )),
    }
}
