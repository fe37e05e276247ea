//! End-to-end broker scenarios against a scripted mock inspector.
//!
//! The mock accepts one WebSocket connection, answers every command
//! from a method -> result table (default `{}`), pushes injected
//! notifications, and can hang up on demand.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use tether_broker::{
    BrokerError, DebugBroker, RegistryConfig, SessionEventKind, SessionRegistry, SessionState,
};
use tether_sourcemap::{SourceMapFetcher, StaticFetcher};

struct MockTarget {
    url: String,
    event_tx: mpsc::UnboundedSender<serde_json::Value>,
    close_tx: mpsc::UnboundedSender<()>,
}

impl MockTarget {
    /// Push a notification to the connected session.
    fn emit(&self, method: &str, params: serde_json::Value) {
        let _ = self
            .event_tx
            .send(serde_json::json!({ "method": method, "params": params }));
    }

    /// Drop the connection.
    fn hang_up(&self) {
        let _ = self.close_tx.send(());
    }
}

async fn start_target(
    responses: HashMap<String, serde_json::Value>,
    silent: HashSet<String>,
) -> MockTarget {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<serde_json::Value>();
    let (close_tx, mut close_rx) = mpsc::unbounded_channel::<()>();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        let (mut sink, mut source) = ws.split();
        loop {
            tokio::select! {
                msg = source.next() => match msg {
                    Some(Ok(Message::Text(text))) => {
                        let req: serde_json::Value = serde_json::from_str(&text).unwrap();
                        let method = req["method"].as_str().unwrap_or_default().to_string();
                        if silent.contains(&method) {
                            continue;
                        }
                        let result = responses
                            .get(&method)
                            .cloned()
                            .unwrap_or_else(|| serde_json::json!({}));
                        let reply = serde_json::json!({ "id": req["id"], "result": result });
                        if sink.send(Message::Text(reply.to_string())).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    _ => break,
                },
                ev = event_rx.recv() => match ev {
                    Some(notification) => {
                        if sink
                            .send(Message::Text(notification.to_string()))
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                    None => break,
                },
                _ = close_rx.recv() => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    });

    MockTarget {
        url: format!("ws://127.0.0.1:{}", addr.port()),
        event_tx,
        close_tx,
    }
}

fn broker_with_fetcher(fetcher: Arc<dyn SourceMapFetcher>) -> DebugBroker {
    let registry = SessionRegistry::new(
        RegistryConfig {
            max_sessions: 8,
            command_timeout: Duration::from_secs(2),
            connect_timeout: Duration::from_secs(2),
            ..RegistryConfig::default()
        },
        fetcher,
    );
    DebugBroker::new(Arc::new(registry))
}

fn broker() -> DebugBroker {
    broker_with_fetcher(Arc::new(StaticFetcher::new()))
}

fn responses(entries: &[(&str, serde_json::Value)]) -> HashMap<String, serde_json::Value> {
    entries
        .iter()
        .map(|(m, v)| (m.to_string(), v.clone()))
        .collect()
}

async fn wait_for_state(broker: &DebugBroker, session_id: &str, state: SessionState) {
    for _ in 0..100 {
        let sessions = broker.list_sessions().await;
        if sessions.iter().any(|s| s.id == session_id && s.state == state) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("session {} never reached {:?}", session_id, state);
}

#[tokio::test]
async fn connect_and_list() {
    let target = start_target(HashMap::new(), HashSet::new()).await;
    let broker = broker();

    let connected = broker.connect_debugger(&target.url, None).await.unwrap();
    assert!(!connected.session_id.is_empty());
    assert_eq!(connected.state, SessionState::Connected);
    assert_eq!(connected.target_url, format!("{}/", target.url));

    let sessions = broker.list_sessions().await;
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].id, connected.session_id);
    assert_eq!(sessions[0].state, SessionState::Connected);
}

#[tokio::test]
async fn disconnect_is_terminal_for_the_id() {
    let target = start_target(HashMap::new(), HashSet::new()).await;
    let broker = broker();

    let sid = broker
        .connect_debugger(&target.url, Some("t".into()))
        .await
        .unwrap()
        .session_id;

    broker.disconnect_debugger(&sid).await.unwrap();
    assert!(broker.list_sessions().await.is_empty());

    // A second disconnect reports the id as gone.
    let err = broker.disconnect_debugger(&sid).await.unwrap_err();
    assert!(matches!(err, BrokerError::SessionNotFound(_)));
}

#[tokio::test]
async fn breakpoint_lifecycle() {
    let target = start_target(
        responses(&[(
            "Debugger.setBreakpointByUrl",
            serde_json::json!({
                "breakpointId": "bp-1",
                "locations": [{"scriptId": "s-1", "lineNumber": 10, "columnNumber": 0}],
            }),
        )]),
        HashSet::new(),
    )
    .await;
    let broker = broker();
    let sid = broker
        .connect_debugger(&target.url, None)
        .await
        .unwrap()
        .session_id;

    let set = broker
        .set_breakpoint(&sid, "file:///a.js", 10, None, None)
        .await
        .unwrap();
    assert_eq!(set.breakpoint_id, "bp-1");
    assert_eq!(set.resolved.len(), 1);
    assert_eq!(set.resolved[0].script_id, "s-1");

    // A later resolve event grows the record.
    target.emit(
        "Debugger.breakpointResolved",
        serde_json::json!({
            "breakpointId": "bp-1",
            "location": {"scriptId": "s-1", "lineNumber": 10, "columnNumber": 4},
        }),
    );
    let mut resolved_count = 0;
    for _ in 0..100 {
        let listed = broker.list_breakpoints(&sid).await.unwrap();
        resolved_count = listed[0].resolved.len();
        if resolved_count == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(resolved_count, 2);

    broker.remove_breakpoint(&sid, "bp-1").await.unwrap();
    assert!(broker.list_breakpoints(&sid).await.unwrap().is_empty());

    // Removing again reports the id as unknown.
    let err = broker.remove_breakpoint(&sid, "bp-1").await.unwrap_err();
    assert!(matches!(err, BrokerError::BreakpointNotFound(_)));
}

#[tokio::test]
async fn paused_call_stack_with_source_map() {
    // Map: generated line 11 (1-based), col 0 -> src/a.ts line 6, col 2,
    // name "f". Ten empty generated lines, then one segment.
    let map = serde_json::json!({
        "version": 3,
        "sources": ["src/a.ts"],
        "names": ["f"],
        "mappings": ";;;;;;;;;;AAKEA",
        "sourcesContent": ["export function f() {}\n"],
    });
    let mut fetcher = StaticFetcher::new();
    fetcher.insert("file:///d/b.js.map", map.to_string());

    let target = start_target(HashMap::new(), HashSet::new()).await;
    let broker = broker_with_fetcher(Arc::new(fetcher));
    let sid = broker
        .connect_debugger(&target.url, None)
        .await
        .unwrap()
        .session_id;

    target.emit(
        "Debugger.scriptParsed",
        serde_json::json!({
            "scriptId": "s-1",
            "url": "file:///d/b.js",
            "sourceMapURL": "b.js.map",
        }),
    );

    // Wait for the non-blocking source-map load.
    let mut has_map = false;
    for _ in 0..100 {
        let scripts = broker.list_scripts(&sid, false).await.unwrap();
        if scripts.iter().any(|s| s.script_id == "s-1" && s.has_source_map) {
            has_map = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(has_map, "source map never loaded");

    // Pause with one frame at generated (s-1, line 10, col 0).
    target.emit(
        "Debugger.paused",
        serde_json::json!({
            "reason": "breakpoint",
            "callFrames": [{
                "callFrameId": "frame-0",
                "functionName": "f",
                "location": {"scriptId": "s-1", "lineNumber": 10, "columnNumber": 0},
                "scopeChain": [],
                "this": {"type": "undefined"},
            }],
        }),
    );
    wait_for_state(&broker, &sid, SessionState::Paused).await;

    let stack = broker.get_call_stack(&sid, true).await.unwrap();
    assert_eq!(stack.frames.len(), 1);
    let frame = &stack.frames[0];
    assert_eq!(frame.script_id, "s-1");
    assert_eq!((frame.line, frame.column), (10, 0));
    assert_eq!(frame.url.as_deref(), Some("file:///d/b.js"));

    let original = frame.original.as_ref().expect("frame should project");
    assert_eq!(original.source, "src/a.ts");
    assert_eq!((original.line, original.column), (6, 2));
    assert_eq!(original.name.as_deref(), Some("f"));

    // The same projection is reachable directly (line is 1-based here).
    let projected = broker
        .get_original_location(&sid, "s-1", 11, 0)
        .await
        .unwrap();
    assert!(projected.has_source_map);
    assert_eq!(projected.original.unwrap().line, 6);

    // Original content is served when preferred.
    let source = broker.get_script_source(&sid, "s-1", true).await.unwrap();
    assert!(source.is_original);
    assert_eq!(source.source_url, "src/a.ts");
    assert_eq!(source.source, "export function f() {}\n");
}

#[tokio::test]
async fn step_then_pause_notifies() {
    let target = start_target(HashMap::new(), HashSet::new()).await;
    let broker = broker();
    let sid = broker
        .connect_debugger(&target.url, None)
        .await
        .unwrap()
        .session_id;

    let mut events = broker.subscribe();

    target.emit(
        "Debugger.paused",
        serde_json::json!({
            "reason": "other",
            "callFrames": [{
                "callFrameId": "frame-0",
                "functionName": "",
                "location": {"scriptId": "s-1", "lineNumber": 1},
            }],
        }),
    );
    wait_for_state(&broker, &sid, SessionState::Paused).await;

    // The step ack only confirms the command.
    broker.step_over(&sid).await.unwrap();

    target.emit(
        "Debugger.paused",
        serde_json::json!({
            "reason": "step",
            "callFrames": [{
                "callFrameId": "frame-1",
                "functionName": "g",
                "location": {"scriptId": "s-1", "lineNumber": 2},
            }],
        }),
    );

    // The notification stream carries both pauses with their reasons.
    let mut reasons = Vec::new();
    while reasons.len() < 2 {
        match tokio::time::timeout(Duration::from_secs(2), events.recv()).await {
            Ok(Ok(event)) => {
                if let SessionEventKind::Paused { reason, .. } = event.kind {
                    assert_eq!(event.session_id, sid);
                    reasons.push(reason);
                }
            }
            other => panic!("notification stream stalled: {:?}", other),
        }
    }
    assert_eq!(reasons, ["other", "step"]);
    wait_for_state(&broker, &sid, SessionState::Paused).await;
}

#[tokio::test]
async fn evaluate_on_frame_surfaces_exception_details() {
    let target = start_target(
        responses(&[(
            "Debugger.evaluateOnCallFrame",
            serde_json::json!({
                "result": {"type": "undefined"},
                "exceptionDetails": {
                    "text": "ReferenceError",
                    "lineNumber": 1,
                    "columnNumber": 0,
                },
            }),
        )]),
        HashSet::new(),
    )
    .await;
    let broker = broker();
    let sid = broker
        .connect_debugger(&target.url, None)
        .await
        .unwrap()
        .session_id;

    target.emit(
        "Debugger.paused",
        serde_json::json!({
            "reason": "exception",
            "callFrames": [{
                "callFrameId": "frame-1",
                "functionName": "",
                "location": {"scriptId": "s-1", "lineNumber": 1},
            }],
        }),
    );
    wait_for_state(&broker, &sid, SessionState::Paused).await;

    let result = broker
        .evaluate_expression(&sid, "boom", Some("frame-1"), false)
        .await
        .unwrap();
    assert_eq!(result.result.object_type, "undefined");
    assert_eq!(result.exception_details.unwrap().text, "ReferenceError");

    // An unknown frame is a parameter error, not a protocol round trip.
    let err = broker
        .evaluate_expression(&sid, "x", Some("frame-404"), false)
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::InvalidParameters(_)));
}

#[tokio::test]
async fn scope_variables_skip_valueless_properties() {
    let target = start_target(
        responses(&[(
            "Runtime.getProperties",
            serde_json::json!({
                "result": [
                    {"name": "x", "value": {"type": "number", "value": 41}},
                    {"name": "lazy"},
                ],
            }),
        )]),
        HashSet::new(),
    )
    .await;
    let broker = broker();
    let sid = broker
        .connect_debugger(&target.url, None)
        .await
        .unwrap()
        .session_id;

    target.emit(
        "Debugger.paused",
        serde_json::json!({
            "reason": "breakpoint",
            "callFrames": [{
                "callFrameId": "frame-0",
                "functionName": "f",
                "location": {"scriptId": "s-1", "lineNumber": 3},
                "scopeChain": [
                    {"type": "local", "object": {"type": "object", "objectId": "scope-0"}},
                ],
            }],
        }),
    );
    wait_for_state(&broker, &sid, SessionState::Paused).await;

    let variables = broker
        .get_scope_variables(&sid, "frame-0", 0)
        .await
        .unwrap();
    assert_eq!(variables.len(), 1);
    assert_eq!(variables[0].name, "x");

    // Out-of-range scope index is rejected locally.
    let err = broker
        .get_scope_variables(&sid, "frame-0", 3)
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::InvalidParameters(_)));
}

#[tokio::test]
async fn set_variable_value_aborts_on_exception() {
    let target = start_target(
        responses(&[(
            "Debugger.evaluateOnCallFrame",
            serde_json::json!({
                "result": {"type": "undefined"},
                "exceptionDetails": {"text": "SyntaxError"},
            }),
        )]),
        HashSet::new(),
    )
    .await;
    let broker = broker();
    let sid = broker
        .connect_debugger(&target.url, None)
        .await
        .unwrap()
        .session_id;

    target.emit(
        "Debugger.paused",
        serde_json::json!({
            "reason": "breakpoint",
            "callFrames": [{
                "callFrameId": "frame-0",
                "functionName": "f",
                "location": {"scriptId": "s-1", "lineNumber": 3},
                "scopeChain": [
                    {"type": "local", "object": {"type": "object", "objectId": "scope-0"}},
                ],
            }],
        }),
    );
    wait_for_state(&broker, &sid, SessionState::Paused).await;

    let err = broker
        .set_variable_value(&sid, "frame-0", 0, "x", "][")
        .await
        .unwrap_err();
    match err {
        BrokerError::Protocol { message, .. } => assert_eq!(message, "SyntaxError"),
        other => panic!("expected Protocol error, got {:?}", other),
    }
}

#[tokio::test]
async fn transport_loss_cancels_outstanding_commands() {
    let silent: HashSet<String> = ["Debugger.resume".to_string()].into_iter().collect();
    let target = start_target(HashMap::new(), silent).await;
    let broker = broker();
    let sid = broker
        .connect_debugger(&target.url, None)
        .await
        .unwrap()
        .session_id;

    target.emit(
        "Debugger.paused",
        serde_json::json!({
            "reason": "other",
            "callFrames": [],
        }),
    );
    wait_for_state(&broker, &sid, SessionState::Paused).await;

    // Start a resume that will never be acked, then drop the socket.
    let pending_broker = broker.clone();
    let pending_sid = sid.clone();
    let pending =
        tokio::spawn(async move { pending_broker.resume_execution(&pending_sid).await });
    tokio::time::sleep(Duration::from_millis(100)).await;
    target.hang_up();

    let err = pending.await.unwrap().unwrap_err();
    assert!(matches!(err, BrokerError::ConnectionFailed(_)));

    // The reaper drops the session; later commands miss.
    for _ in 0..100 {
        if broker.list_sessions().await.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(broker.list_sessions().await.is_empty());
    let err = broker.pause_execution(&sid).await.unwrap_err();
    assert!(matches!(err, BrokerError::SessionNotFound(_)));
}

#[tokio::test]
async fn resume_from_connected_runs_waiting_target() {
    let target = start_target(HashMap::new(), HashSet::new()).await;
    let broker = broker();
    let sid = broker
        .connect_debugger(&target.url, None)
        .await
        .unwrap()
        .session_id;

    // CONNECTED -> runIfWaitingForDebugger -> RUNNING.
    let state = broker.resume_execution(&sid).await.unwrap();
    assert_eq!(state, SessionState::Running);

    // Steps are rejected while running.
    let err = broker.step_over(&sid).await.unwrap_err();
    assert!(matches!(err, BrokerError::InvalidState { .. }));
    assert_eq!(err.code(), "SESSION_INVALID_STATE");
}

#[tokio::test]
async fn list_scripts_filters_internal_urls() {
    let target = start_target(HashMap::new(), HashSet::new()).await;
    let broker = broker();
    let sid = broker
        .connect_debugger(&target.url, None)
        .await
        .unwrap()
        .session_id;

    for (id, url) in [
        ("1", "file:///app/index.js"),
        ("2", "node:internal/bootstrap"),
        ("3", "internal/per_context/primordials.js"),
        ("4", "file:///app/node_modules/lib/index.js"),
        ("5", ""),
    ] {
        target.emit(
            "Debugger.scriptParsed",
            serde_json::json!({ "scriptId": id, "url": url }),
        );
    }

    let mut visible = Vec::new();
    for _ in 0..100 {
        let all = broker.list_scripts(&sid, true).await.unwrap();
        if all.len() == 5 {
            visible = broker.list_scripts(&sid, false).await.unwrap();
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].url, "file:///app/index.js");
}
