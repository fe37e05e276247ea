//! Inspector command client.
//!
//! Owns the id allocator, the shared dispatcher, and the transport write
//! half. Each command registers a pending entry before transmission,
//! awaits the response under a per-command deadline, and maps the three
//! failure shapes (target error, timeout, transport loss) onto
//! [`CdpError`].

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::time::timeout;

use crate::dispatcher::{DispatchResult, Dispatcher};
use crate::error::CdpError;
use crate::protocol::serialize_request;
use crate::transport::{self, TransportEvent, TransportHandle};

/// Default per-command response deadline.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// A connected inspector client.
pub struct CdpClient {
    next_id: AtomicI64,
    dispatcher: Arc<Mutex<Dispatcher>>,
    transport: TransportHandle,
    command_timeout: Duration,
}

impl CdpClient {
    /// Connect to an inspector WebSocket endpoint.
    ///
    /// Returns the client plus the inbound notification stream; the
    /// stream ends with a single [`TransportEvent::Closed`] item.
    pub async fn connect(
        url: &str,
        command_timeout: Duration,
    ) -> Result<(Self, mpsc::Receiver<TransportEvent>), CdpError> {
        let dispatcher = Arc::new(Mutex::new(Dispatcher::new()));
        let (transport, events) = transport::connect(url, dispatcher.clone()).await?;
        Ok((
            Self {
                next_id: AtomicI64::new(1),
                dispatcher,
                transport,
                command_timeout,
            },
            events,
        ))
    }

    /// Issue one command and await its result.
    ///
    /// Concurrent callers are fine; two commands issued by the same
    /// caller back-to-back (each awaited) reach the target in order.
    pub async fn send_command(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, CdpError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = serialize_request(id, method, &params);

        // Register before transmit so a fast response always matches.
        let rx = self.dispatcher.lock().await.register(id);

        if self.transport.send(body).await.is_err() {
            self.dispatcher.lock().await.cancel(id);
            return Err(CdpError::ConnectionLost);
        }

        match timeout(self.command_timeout, rx).await {
            Err(_elapsed) => {
                // Remove the entry; a late response will hit the
                // unknown-id path and be discarded.
                self.dispatcher.lock().await.cancel(id);
                Err(CdpError::Timeout {
                    method: method.to_string(),
                })
            }
            Ok(Err(_closed)) => Err(CdpError::ConnectionLost),
            Ok(Ok(DispatchResult::Success(value))) => Ok(value),
            Ok(Ok(DispatchResult::Error(err))) => Err(CdpError::Rpc {
                code: err.code,
                message: err.message,
            }),
        }
    }

    /// Request a best-effort clean close of the underlying socket.
    pub async fn close(&self) {
        self.transport.close().await;
    }

    /// How many commands are currently awaiting a response.
    pub async fn pending_count(&self) -> usize {
        self.dispatcher.lock().await.pending_count()
    }
}

impl std::fmt::Debug for CdpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdpClient")
            .field("next_id", &self.next_id)
            .field("command_timeout", &self.command_timeout)
            .finish()
    }
}
