//! Response correlator for in-flight commands.
//!
//! Tracks pending commands by id and routes responses to waiting callers
//! via oneshot channels. Each pending entry is completed at most once;
//! dropping the map (or `cancel_all`) wakes every waiter with a closed
//! channel, which callers observe as connection loss.
use std::collections::HashMap;

use tokio::sync::oneshot;

use crate::protocol::RpcError;

/// Manages pending commands and routes responses.
pub struct Dispatcher {
    /// Map of command id to pending response sender.
    pending: HashMap<i64, oneshot::Sender<DispatchResult>>,
}

/// The outcome delivered to a waiting command.
#[derive(Debug)]
pub enum DispatchResult {
    /// Successful response with the result value.
    Success(serde_json::Value),
    /// Error response from the target.
    Error(RpcError),
}

impl Dispatcher {
    /// Create a new dispatcher with no pending commands.
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
        }
    }

    /// Register a pending command and return a receiver for its outcome.
    ///
    /// Must be called before the command is written to the transport so
    /// that a fast response cannot arrive unmatched.
    pub fn register(&mut self, id: i64) -> oneshot::Receiver<DispatchResult> {
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);
        rx
    }

    /// How many commands are pending.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Complete the pending command matching a response.
    ///
    /// A response for an unknown id (late reply after timeout, or a
    /// target bug) is logged and dropped.
    pub fn complete(&mut self, id: i64, result: Option<serde_json::Value>, error: Option<RpcError>) {
        match self.pending.remove(&id) {
            Some(sender) => {
                let outcome = match error {
                    Some(err) => DispatchResult::Error(err),
                    None => DispatchResult::Success(result.unwrap_or(serde_json::Value::Null)),
                };
                // The receiver may have been dropped (timed-out caller).
                let _ = sender.send(outcome);
            }
            None => {
                tracing::warn!("discarding response for unknown command id {}", id);
            }
        }
    }

    /// Cancel a pending command. Returns true if it was found.
    ///
    /// Used on per-command timeout so a late response is discarded via
    /// the unknown-id path.
    pub fn cancel(&mut self, id: i64) -> bool {
        self.pending.remove(&id).is_some()
    }

    /// Drop every pending entry, waking all waiters with a closed channel.
    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatcher_new_empty() {
        let disp = Dispatcher::new();
        assert_eq!(disp.pending_count(), 0);
    }

    #[tokio::test]
    async fn dispatcher_register_and_complete() {
        let mut disp = Dispatcher::new();
        let rx = disp.register(1);
        assert_eq!(disp.pending_count(), 1);

        disp.complete(1, Some(serde_json::json!({"key": "value"})), None);
        assert_eq!(disp.pending_count(), 0);

        match rx.await.unwrap() {
            DispatchResult::Success(val) => assert_eq!(val["key"], "value"),
            DispatchResult::Error(_) => panic!("expected success"),
        }
    }

    #[tokio::test]
    async fn dispatcher_complete_with_error() {
        let mut disp = Dispatcher::new();
        let rx = disp.register(1);

        disp.complete(
            1,
            None,
            Some(RpcError {
                code: -32000,
                message: "boom".into(),
            }),
        );

        match rx.await.unwrap() {
            DispatchResult::Error(err) => {
                assert_eq!(err.code, -32000);
                assert_eq!(err.message, "boom");
            }
            DispatchResult::Success(_) => panic!("expected error"),
        }
    }

    #[test]
    fn dispatcher_unknown_id_ignored() {
        let mut disp = Dispatcher::new();
        // Should not panic.
        disp.complete(999, Some(serde_json::Value::Null), None);
    }

    #[tokio::test]
    async fn dispatcher_null_result_becomes_null_value() {
        let mut disp = Dispatcher::new();
        let rx = disp.register(4);
        disp.complete(4, None, None);
        match rx.await.unwrap() {
            DispatchResult::Success(val) => assert!(val.is_null()),
            _ => panic!("expected success"),
        }
    }

    #[test]
    fn dispatcher_cancel_existing() {
        let mut disp = Dispatcher::new();
        let _rx = disp.register(1);
        assert!(disp.cancel(1));
        assert_eq!(disp.pending_count(), 0);
    }

    #[test]
    fn dispatcher_cancel_nonexistent() {
        let mut disp = Dispatcher::new();
        assert!(!disp.cancel(42));
    }

    #[tokio::test]
    async fn dispatcher_cancel_all_wakes_waiters() {
        let mut disp = Dispatcher::new();
        let rx1 = disp.register(1);
        let rx2 = disp.register(2);
        disp.cancel_all();
        assert_eq!(disp.pending_count(), 0);

        // Both waiters observe the closed channel.
        assert!(rx1.await.is_err());
        assert!(rx2.await.is_err());
    }

    #[tokio::test]
    async fn dispatcher_dropped_receiver_does_not_panic() {
        let mut disp = Dispatcher::new();
        let rx = disp.register(1);
        drop(rx);
        disp.complete(1, Some(serde_json::Value::Null), None);
    }

    #[tokio::test]
    async fn dispatcher_concurrent_out_of_order_completion() {
        let mut disp = Dispatcher::new();
        let rx1 = disp.register(1);
        let rx2 = disp.register(2);
        let rx3 = disp.register(3);

        disp.complete(3, Some(serde_json::json!("third")), None);
        disp.complete(1, Some(serde_json::json!("first")), None);
        disp.complete(2, Some(serde_json::json!("second")), None);

        match rx1.await.unwrap() {
            DispatchResult::Success(v) => assert_eq!(v, "first"),
            _ => panic!("expected success"),
        }
        match rx2.await.unwrap() {
            DispatchResult::Success(v) => assert_eq!(v, "second"),
            _ => panic!("expected success"),
        }
        match rx3.await.unwrap() {
            DispatchResult::Success(v) => assert_eq!(v, "third"),
            _ => panic!("expected success"),
        }
    }
}
