//! WebSocket transport to an inspector target.
//!
//! One writer task drains an outbound channel into the socket (writes are
//! atomic per message and preserve submission order); one reader task
//! decodes inbound frames, completes pending commands through the shared
//! [`Dispatcher`], and forwards notifications to the session. When the
//! socket ends, for any reason, the reader fails every pending command and
//! emits a terminal [`TransportEvent::Closed`].

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::dispatcher::Dispatcher;
use crate::error::CdpError;
use crate::protocol::{parse_message, CdpMessage};

/// Capacity of the inbound notification channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// An item delivered on the transport's inbound channel.
#[derive(Debug)]
pub enum TransportEvent {
    /// A notification pushed by the target.
    Event {
        /// The event method name.
        method: String,
        /// The event parameters.
        params: serde_json::Value,
    },
    /// The transport has ended; no further items follow.
    Closed {
        /// Human-readable cause.
        reason: String,
    },
}

/// Outbound instructions for the writer task.
enum Outbound {
    /// A serialized request frame.
    Text(String),
    /// Initiate a clean close.
    Close,
}

/// Write half of an established transport.
#[derive(Clone)]
pub struct TransportHandle {
    outbound: mpsc::Sender<Outbound>,
}

impl TransportHandle {
    /// Queue one message for transmission.
    ///
    /// Fails with [`CdpError::ConnectionLost`] once the transport has
    /// ended.
    pub async fn send(&self, text: String) -> Result<(), CdpError> {
        self.outbound
            .send(Outbound::Text(text))
            .await
            .map_err(|_| CdpError::ConnectionLost)
    }

    /// Request a best-effort clean close of the socket.
    pub async fn close(&self) {
        let _ = self.outbound.send(Outbound::Close).await;
    }
}

/// Establish a WebSocket to `url` and spawn the reader/writer tasks.
///
/// Responses are routed through `dispatcher`; notifications and the
/// terminal close arrive on the returned receiver.
pub async fn connect(
    url: &str,
    dispatcher: Arc<Mutex<Dispatcher>>,
) -> Result<(TransportHandle, mpsc::Receiver<TransportEvent>), CdpError> {
    let (ws_stream, _response) = connect_async(url)
        .await
        .map_err(|e| CdpError::Connect(e.to_string()))?;

    let (mut sink, mut stream) = ws_stream.split();
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<Outbound>(EVENT_CHANNEL_CAPACITY);
    let (event_tx, event_rx) = mpsc::channel::<TransportEvent>(EVENT_CHANNEL_CAPACITY);
    // Dropped by the reader on exit so the writer stops accepting
    // messages the moment the socket dies.
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    // Writer task: outbound channel -> socket.
    tokio::spawn(async move {
        loop {
            tokio::select! {
                item = outbound_rx.recv() => match item {
                    Some(Outbound::Text(text)) => {
                        if sink.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    Some(Outbound::Close) => {
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    }
                    None => break,
                },
                _ = &mut shutdown_rx => break,
            }
        }
        // Dropping the receiver fails every later send().
        outbound_rx.close();
        let _ = sink.close().await;
    });

    // Reader task: socket -> dispatcher / event channel.
    tokio::spawn(async move {
        let _shutdown_tx = shutdown_tx;
        let reason = loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => match parse_message(&text) {
                    Ok(CdpMessage::Response { id, result, error }) => {
                        dispatcher.lock().await.complete(id, result, error);
                    }
                    Ok(CdpMessage::Event { method, params }) => {
                        let _ = event_tx
                            .send(TransportEvent::Event { method, params })
                            .await;
                    }
                    Err(e) => {
                        tracing::warn!("dropping malformed frame: {}", e);
                    }
                },
                // Control and binary frames carry nothing for us.
                Some(Ok(Message::Ping(_)))
                | Some(Ok(Message::Pong(_)))
                | Some(Ok(Message::Binary(_)))
                | Some(Ok(Message::Frame(_))) => {}
                Some(Ok(Message::Close(frame))) => {
                    break match frame {
                        Some(f) if !f.reason.is_empty() => f.reason.to_string(),
                        _ => "closed by target".to_string(),
                    };
                }
                Some(Err(e)) => break format!("transport error: {}", e),
                None => break "connection closed".to_string(),
            }
        };

        // Every outstanding command fails with connection loss, then the
        // terminal item is the last thing the session observes.
        dispatcher.lock().await.cancel_all();
        let _ = event_tx.send(TransportEvent::Closed { reason }).await;
    });

    Ok((
        TransportHandle {
            outbound: outbound_tx,
        },
        event_rx,
    ))
}
