//! The per-target session aggregate.
//!
//! One session binds an external id to one WebSocket conversation with
//! an inspector. It owns the command client, the event loop that keeps
//! the cached state current, the breakpoint and script tables, and the
//! source-map engine. All cached state lives behind one async mutex,
//! touched only by the event loop and the operation handlers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::sync::{broadcast, mpsc, Mutex};
use url::Url;

use tether_cdp::{CdpClient, TransportEvent};
use tether_sourcemap::{SourceMapEngine, SourceMapFetcher};

use crate::breakpoint::{BreakpointRecord, BreakpointTable, RequestedLocation, ResolvedLocation};
use crate::error::BrokerError;
use crate::events::{SessionEvent, SessionEventKind};
use crate::protocol::{
    BreakpointResolvedEvent, CallArgument, EvaluateResult, GetPropertiesResult,
    GetScriptSourceResult, PausedEvent, PauseOnExceptionsState, ScriptParsedEvent,
    SetBreakpointByUrlResult,
};
use crate::state::{PausedSnapshot, ScriptRecord, SessionState};
use crate::view::{
    CallStack, EnrichedFrame, OriginalLocation, ProjectedLocation, ScriptInfo, ScriptSource,
    VariableEntry,
};

/// A stepping granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// Step over the current statement.
    Over,
    /// Step into the next call.
    Into,
    /// Step out of the current function.
    Out,
}

impl StepKind {
    /// The protocol method implementing this step.
    pub fn method(&self) -> &'static str {
        match self {
            Self::Over => "Debugger.stepOver",
            Self::Into => "Debugger.stepInto",
            Self::Out => "Debugger.stepOut",
        }
    }

    /// The operation name used in errors.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Over => "step_over",
            Self::Into => "step_into",
            Self::Out => "step_out",
        }
    }
}

/// Everything needed to establish one session.
pub(crate) struct SessionSeed {
    pub id: String,
    pub name: Option<String>,
    pub url: Url,
    pub command_timeout: Duration,
    pub connect_timeout: Duration,
    pub events: broadcast::Sender<SessionEvent>,
    pub reap: mpsc::UnboundedSender<String>,
    pub fetcher: Arc<dyn SourceMapFetcher>,
}

/// State cached from the target's event stream.
struct SessionInner {
    state: SessionState,
    scripts: HashMap<String, ScriptRecord>,
    breakpoints: BreakpointTable,
    paused: Option<PausedSnapshot>,
}

/// One live conversation with an inspector target.
pub struct DebugSession {
    id: String,
    name: Option<String>,
    target_url: String,
    created_at: SystemTime,
    client: CdpClient,
    inner: Mutex<SessionInner>,
    events: broadcast::Sender<SessionEvent>,
    source_maps: Arc<SourceMapEngine>,
}

impl DebugSession {
    /// Connect, spawn the event loop, and perform the domain handshake.
    ///
    /// The session is returned only after `Debugger.enable` and
    /// `Runtime.enable` both acked; any failure closes the socket and
    /// surfaces as `CONNECTION_FAILED`.
    pub(crate) async fn connect(seed: SessionSeed) -> Result<Arc<Self>, BrokerError> {
        let connect_attempt = CdpClient::connect(seed.url.as_str(), seed.command_timeout);
        let (client, transport_events) =
            match tokio::time::timeout(seed.connect_timeout, connect_attempt).await {
                Ok(Ok(pair)) => pair,
                Ok(Err(e)) => return Err(BrokerError::ConnectionFailed(e.to_string())),
                Err(_) => {
                    return Err(BrokerError::ConnectionFailed(format!(
                        "connect to {} timed out",
                        seed.url
                    )))
                }
            };

        let session = Arc::new(Self {
            id: seed.id,
            name: seed.name,
            target_url: seed.url.to_string(),
            created_at: SystemTime::now(),
            client,
            inner: Mutex::new(SessionInner {
                state: SessionState::Connecting,
                scripts: HashMap::new(),
                breakpoints: BreakpointTable::new(),
                paused: None,
            }),
            events: seed.events,
            source_maps: Arc::new(SourceMapEngine::new(seed.fetcher)),
        });

        // The event loop must run before the handshake: targets flood
        // scriptParsed notifications as soon as the debugger enables.
        tokio::spawn(run_event_loop(
            session.clone(),
            transport_events,
            seed.reap,
        ));

        for method in ["Debugger.enable", "Runtime.enable"] {
            if let Err(e) = session.client.send_command(method, serde_json::json!({})).await {
                session.client.close().await;
                return Err(BrokerError::ConnectionFailed(format!("{}: {}", method, e)));
            }
        }

        {
            let mut inner = session.inner.lock().await;
            if inner.state == SessionState::Connecting {
                inner.state = SessionState::Connected;
            }
        }
        tracing::info!(session = %session.id, url = %session.target_url, "session connected");

        Ok(session)
    }

    /// The external session id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The optional display name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The target URL this session is bound to.
    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    /// When the session was created.
    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// The current lifecycle state.
    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state
    }

    /// The reason of the current pause, when paused.
    pub async fn paused_reason(&self) -> Option<String> {
        self.inner
            .lock()
            .await
            .paused
            .as_ref()
            .map(|p| p.reason.clone())
    }

    // -- breakpoints --------------------------------------------------------

    /// Create a breakpoint by URL. `line` is 0-based, per the wire.
    ///
    /// No pre-validation against known scripts, and no de-duplication:
    /// a second identical request creates a second target-side
    /// breakpoint.
    pub async fn set_breakpoint(
        &self,
        url: &str,
        line: u32,
        column: Option<u32>,
        condition: Option<String>,
    ) -> Result<BreakpointRecord, BrokerError> {
        require_live(self.state().await, "set_breakpoint")?;

        let mut params = serde_json::json!({ "url": url, "lineNumber": line });
        if let Some(column) = column {
            params["columnNumber"] = column.into();
        }
        if let Some(condition) = &condition {
            params["condition"] = serde_json::Value::String(condition.clone());
        }

        let value = self
            .client
            .send_command("Debugger.setBreakpointByUrl", params)
            .await?;
        let result: SetBreakpointByUrlResult = parse_result(value)?;

        let record = BreakpointRecord {
            id: result.breakpoint_id,
            requested: RequestedLocation {
                url: url.to_string(),
                line,
                column,
                condition,
            },
            enabled: true,
            resolved: result
                .locations
                .iter()
                .map(ResolvedLocation::from_wire)
                .collect(),
        };

        self.inner.lock().await.breakpoints.insert(record.clone());
        Ok(record)
    }

    /// Remove a breakpoint this session created.
    pub async fn remove_breakpoint(&self, breakpoint_id: &str) -> Result<(), BrokerError> {
        require_live(self.state().await, "remove_breakpoint")?;

        if !self.inner.lock().await.breakpoints.contains(breakpoint_id) {
            return Err(BrokerError::BreakpointNotFound(breakpoint_id.to_string()));
        }

        self.client
            .send_command(
                "Debugger.removeBreakpoint",
                serde_json::json!({ "breakpointId": breakpoint_id }),
            )
            .await?;

        self.inner.lock().await.breakpoints.remove(breakpoint_id);
        Ok(())
    }

    /// All breakpoint records, in creation order.
    pub async fn breakpoints(&self) -> Vec<BreakpointRecord> {
        self.inner.lock().await.breakpoints.all().to_vec()
    }

    // -- execution control --------------------------------------------------

    /// Resume execution.
    ///
    /// From PAUSED this issues `Debugger.resume`; from CONNECTED it
    /// issues `Runtime.runIfWaitingForDebugger` (targets started with
    /// `--inspect-brk` wait for it). Returns the new state.
    pub async fn resume(&self) -> Result<SessionState, BrokerError> {
        match self.state().await {
            SessionState::Paused => {
                self.client
                    .send_command("Debugger.resume", serde_json::json!({}))
                    .await?;
                let mut inner = self.inner.lock().await;
                if inner.state == SessionState::Paused {
                    inner.state = SessionState::Running;
                    inner.paused = None;
                }
                Ok(SessionState::Running)
            }
            SessionState::Connected => {
                self.client
                    .send_command("Runtime.runIfWaitingForDebugger", serde_json::json!({}))
                    .await?;
                let mut inner = self.inner.lock().await;
                if inner.state == SessionState::Connected {
                    inner.state = SessionState::Running;
                }
                Ok(SessionState::Running)
            }
            state => Err(BrokerError::InvalidState {
                operation: "resume_execution".into(),
                state,
            }),
        }
    }

    /// Ask the target to pause. The PAUSED transition arrives via the
    /// subsequent `Debugger.paused` event, not this ack.
    pub async fn pause(&self) -> Result<(), BrokerError> {
        let state = self.state().await;
        if !matches!(state, SessionState::Connected | SessionState::Running) {
            return Err(BrokerError::InvalidState {
                operation: "pause_execution".into(),
                state,
            });
        }
        self.client
            .send_command("Debugger.pause", serde_json::json!({}))
            .await?;
        Ok(())
    }

    /// Step. The ack only confirms the command; callers that need the
    /// resulting pause must observe the paused notification.
    pub async fn step(&self, kind: StepKind) -> Result<(), BrokerError> {
        require_paused(self.state().await, kind.operation())?;
        self.client
            .send_command(kind.method(), serde_json::json!({}))
            .await?;
        Ok(())
    }

    // -- inspection ---------------------------------------------------------

    /// The enriched call stack of the current pause.
    pub async fn call_stack(&self, include_async: bool) -> Result<CallStack, BrokerError> {
        // Gather wire frames and script URLs under the lock, then do
        // source-map projection without holding it.
        let (wire_frames, urls, async_trace) = {
            let inner = self.inner.lock().await;
            require_paused(inner.state, "get_call_stack")?;
            let snapshot = inner.paused.as_ref().ok_or(BrokerError::InvalidState {
                operation: "get_call_stack".into(),
                state: inner.state,
            })?;
            let urls: Vec<Option<String>> = snapshot
                .call_frames
                .iter()
                .map(|f| {
                    inner
                        .scripts
                        .get(&f.location.script_id)
                        .map(|s| s.url.clone())
                })
                .collect();
            let async_trace = if include_async {
                snapshot.async_stack_trace.clone()
            } else {
                None
            };
            (snapshot.call_frames.clone(), urls, async_trace)
        };

        let mut frames = Vec::with_capacity(wire_frames.len());
        for (frame, url) in wire_frames.into_iter().zip(urls) {
            let line = frame.location.line_number;
            let column = frame.location.column_number.unwrap_or(0);
            // Wire lines are 0-based; the map speaks 1-based lines.
            let original = match self.source_maps.consumer(&frame.location.script_id).await {
                Some(consumer) => {
                    consumer
                        .original_position(line + 1, column)
                        .map(|p| OriginalLocation {
                            source: p.source,
                            line: p.line,
                            column: p.column,
                            name: p.name,
                        })
                }
                None => None,
            };
            frames.push(EnrichedFrame {
                call_frame_id: frame.call_frame_id,
                function_name: frame.function_name,
                script_id: frame.location.script_id,
                url,
                line,
                column,
                scopes: frame
                    .scope_chain
                    .iter()
                    .map(|s| s.scope_type.clone())
                    .collect(),
                original,
            });
        }

        Ok(CallStack {
            frames,
            async_stack_trace: async_trace,
        })
    }

    /// Evaluate an expression, on a call frame (requires PAUSED) or in
    /// the global context. Exception details ride along with the
    /// result; they are not an error.
    pub async fn evaluate(
        &self,
        expression: &str,
        call_frame_id: Option<&str>,
        return_by_value: bool,
    ) -> Result<EvaluateResult, BrokerError> {
        match call_frame_id {
            Some(frame_id) => {
                {
                    let inner = self.inner.lock().await;
                    require_paused(inner.state, "evaluate_expression")?;
                    let known = inner
                        .paused
                        .as_ref()
                        .map(|p| p.frame(frame_id).is_some())
                        .unwrap_or(false);
                    if !known {
                        return Err(BrokerError::InvalidParameters(format!(
                            "unknown call frame: {}",
                            frame_id
                        )));
                    }
                }
                let value = self
                    .client
                    .send_command(
                        "Debugger.evaluateOnCallFrame",
                        serde_json::json!({
                            "callFrameId": frame_id,
                            "expression": expression,
                            "returnByValue": return_by_value,
                        }),
                    )
                    .await?;
                parse_result(value)
            }
            None => {
                require_live(self.state().await, "evaluate_expression")?;
                let value = self
                    .client
                    .send_command(
                        "Runtime.evaluate",
                        serde_json::json!({
                            "expression": expression,
                            "returnByValue": return_by_value,
                        }),
                    )
                    .await?;
                parse_result(value)
            }
        }
    }

    /// Fetch the variables of one scope of one frame of the current
    /// pause. Accessor properties without a value are skipped.
    pub async fn scope_variables(
        &self,
        call_frame_id: &str,
        scope_index: usize,
    ) -> Result<Vec<VariableEntry>, BrokerError> {
        let object_id = {
            let inner = self.inner.lock().await;
            require_paused(inner.state, "get_scope_variables")?;
            let frame = inner
                .paused
                .as_ref()
                .and_then(|p| p.frame(call_frame_id))
                .ok_or_else(|| {
                    BrokerError::InvalidParameters(format!(
                        "unknown call frame: {}",
                        call_frame_id
                    ))
                })?;
            let scope = frame.scope_chain.get(scope_index).ok_or_else(|| {
                BrokerError::InvalidParameters(format!(
                    "frame {} has no scope index {}",
                    call_frame_id, scope_index
                ))
            })?;
            scope.object.object_id.clone().ok_or_else(|| {
                BrokerError::InvalidParameters(format!(
                    "scope {} of frame {} has no inspectable object",
                    scope_index, call_frame_id
                ))
            })?
        };

        let value = self
            .client
            .send_command(
                "Runtime.getProperties",
                serde_json::json!({ "objectId": object_id, "ownProperties": true }),
            )
            .await?;
        let properties: GetPropertiesResult = parse_result(value)?;

        Ok(properties
            .result
            .into_iter()
            .filter_map(|p| p.value.map(|value| VariableEntry { name: p.name, value }))
            .collect())
    }

    /// Assign a variable in a scope of a paused frame.
    ///
    /// Two-phase: the new value expression is evaluated on the frame
    /// first; if that throws, the assignment is not attempted and the
    /// exception text is surfaced as a protocol error.
    pub async fn set_variable_value(
        &self,
        call_frame_id: &str,
        scope_index: usize,
        variable_name: &str,
        new_value: &str,
    ) -> Result<(), BrokerError> {
        {
            let inner = self.inner.lock().await;
            require_paused(inner.state, "set_variable_value")?;
            let frame = inner
                .paused
                .as_ref()
                .and_then(|p| p.frame(call_frame_id))
                .ok_or_else(|| {
                    BrokerError::InvalidParameters(format!(
                        "unknown call frame: {}",
                        call_frame_id
                    ))
                })?;
            if frame.scope_chain.get(scope_index).is_none() {
                return Err(BrokerError::InvalidParameters(format!(
                    "frame {} has no scope index {}",
                    call_frame_id, scope_index
                )));
            }
        }

        let value = self
            .client
            .send_command(
                "Debugger.evaluateOnCallFrame",
                serde_json::json!({
                    "callFrameId": call_frame_id,
                    "expression": new_value,
                    "returnByValue": false,
                }),
            )
            .await?;
        let evaluated: EvaluateResult = parse_result(value)?;

        if let Some(details) = evaluated.exception_details {
            return Err(BrokerError::Protocol {
                code: -32000,
                message: details.text,
            });
        }

        let argument = CallArgument::from_remote_object(&evaluated.result);
        self.client
            .send_command(
                "Debugger.setVariableValue",
                serde_json::json!({
                    "scopeNumber": scope_index,
                    "variableName": variable_name,
                    "newValue": argument,
                    "callFrameId": call_frame_id,
                }),
            )
            .await?;
        Ok(())
    }

    /// Set the pause-on-exceptions mode. Returns the new mode.
    pub async fn set_pause_on_exceptions(
        &self,
        state: PauseOnExceptionsState,
    ) -> Result<PauseOnExceptionsState, BrokerError> {
        require_live(self.state().await, "set_pause_on_exceptions")?;
        self.client
            .send_command(
                "Debugger.setPauseOnExceptions",
                serde_json::json!({ "state": state }),
            )
            .await?;
        Ok(state)
    }

    // -- scripts and source maps --------------------------------------------

    /// Project a generated position onto original source.
    /// `line` is 1-based here (the source-map convention); `column`
    /// is 0-based.
    pub async fn original_location(
        &self,
        script_id: &str,
        line: u32,
        column: u32,
    ) -> Result<ProjectedLocation, BrokerError> {
        {
            let inner = self.inner.lock().await;
            require_live(inner.state, "get_original_location")?;
            if !inner.scripts.contains_key(script_id) {
                return Err(BrokerError::ScriptNotFound(script_id.to_string()));
            }
        }

        match self.source_maps.consumer(script_id).await {
            Some(consumer) => Ok(ProjectedLocation {
                has_source_map: true,
                original: consumer
                    .original_position(line, column)
                    .map(|p| OriginalLocation {
                        source: p.source,
                        line: p.line,
                        column: p.column,
                        name: p.name,
                    }),
            }),
            None => Ok(ProjectedLocation {
                has_source_map: false,
                original: None,
            }),
        }
    }

    /// Fetch script source, preferring mapped original content when
    /// asked and available, falling back to the target's generated
    /// source.
    pub async fn script_source(
        &self,
        script_id: &str,
        prefer_original: bool,
    ) -> Result<ScriptSource, BrokerError> {
        let record = {
            let inner = self.inner.lock().await;
            require_live(inner.state, "get_script_source")?;
            inner
                .scripts
                .get(script_id)
                .cloned()
                .ok_or_else(|| BrokerError::ScriptNotFound(script_id.to_string()))?
        };

        if prefer_original {
            if let Some(consumer) = self.source_maps.consumer(script_id).await {
                if let Some(first) = consumer.sources().first() {
                    if let Some(content) = consumer.source_content(first) {
                        return Ok(ScriptSource {
                            source: content.to_string(),
                            source_url: first.clone(),
                            is_original: true,
                            source_map_url: record.source_map_url.clone(),
                        });
                    }
                }
            }
        }

        let value = self
            .client
            .send_command(
                "Debugger.getScriptSource",
                serde_json::json!({ "scriptId": script_id }),
            )
            .await?;
        let result: GetScriptSourceResult = parse_result(value)?;
        Ok(ScriptSource {
            source: result.script_source,
            source_url: record.url,
            is_original: false,
            source_map_url: record.source_map_url,
        })
    }

    /// List parsed scripts, hiding runtime-internal ones unless asked.
    pub async fn scripts(&self, include_internal: bool) -> Vec<ScriptInfo> {
        let mut records: Vec<ScriptRecord> = {
            let inner = self.inner.lock().await;
            inner
                .scripts
                .values()
                .filter(|s| include_internal || !s.is_internal())
                .cloned()
                .collect()
        };
        records.sort_by(|a, b| {
            let ka = (a.script_id.parse::<u64>().ok(), a.script_id.clone());
            let kb = (b.script_id.parse::<u64>().ok(), b.script_id.clone());
            ka.cmp(&kb)
        });

        let mut infos = Vec::with_capacity(records.len());
        for record in records {
            let has_source_map = self.source_maps.has_map(&record.script_id).await;
            infos.push(ScriptInfo {
                script_id: record.script_id,
                url: record.url,
                is_module: record.is_module,
                has_source_map,
                source_map_url: record.source_map_url,
            });
        }
        infos
    }

    // -- teardown -----------------------------------------------------------

    /// Best-effort close. The terminal transition also happens here so
    /// callers observe DISCONNECTED immediately, without waiting for
    /// the socket teardown to round-trip.
    pub async fn disconnect(&self) {
        {
            let mut inner = self.inner.lock().await;
            inner.state = SessionState::Disconnected;
            inner.paused = None;
        }
        self.client.close().await;
        tracing::info!(session = %self.id, "session disconnected");
    }

    // -- event handling -----------------------------------------------------

    async fn handle_event(&self, method: &str, params: serde_json::Value) {
        match method {
            "Debugger.paused" => match serde_json::from_value::<PausedEvent>(params) {
                Ok(event) => {
                    let snapshot = PausedSnapshot::from_event(event);
                    let reason = snapshot.reason.clone();
                    let hit_breakpoints = snapshot.hit_breakpoints.clone();
                    {
                        let mut inner = self.inner.lock().await;
                        if inner.state.is_terminal() {
                            return;
                        }
                        inner.state = SessionState::Paused;
                        inner.paused = Some(snapshot);
                    }
                    self.publish(SessionEventKind::Paused {
                        reason,
                        hit_breakpoints,
                    });
                }
                Err(e) => tracing::warn!("dropping malformed paused event: {}", e),
            },
            "Debugger.resumed" => {
                {
                    let mut inner = self.inner.lock().await;
                    if inner.state.is_terminal() {
                        return;
                    }
                    inner.paused = None;
                    inner.state = SessionState::Running;
                }
                self.publish(SessionEventKind::Resumed);
            }
            "Debugger.scriptParsed" => match serde_json::from_value::<ScriptParsedEvent>(params) {
                Ok(event) => {
                    let record = ScriptRecord::from_event(&event);
                    self.inner
                        .lock()
                        .await
                        .scripts
                        .insert(record.script_id.clone(), record);

                    // Source-map loading must not block the event
                    // stream.
                    if let Some(map_url) =
                        event.source_map_url.filter(|u| !u.is_empty())
                    {
                        let engine = self.source_maps.clone();
                        let script_id = event.script_id;
                        let script_url = event.url;
                        tokio::spawn(async move {
                            if let Err(e) =
                                engine.load(&script_id, &script_url, &map_url).await
                            {
                                tracing::warn!(
                                    script = %script_id,
                                    "source map load failed: {}",
                                    e
                                );
                            }
                        });
                    }
                }
                Err(e) => tracing::warn!("dropping malformed scriptParsed event: {}", e),
            },
            "Debugger.breakpointResolved" => {
                match serde_json::from_value::<BreakpointResolvedEvent>(params) {
                    Ok(event) => {
                        let location = ResolvedLocation::from_wire(&event.location);
                        let appended = self
                            .inner
                            .lock()
                            .await
                            .breakpoints
                            .append_resolved(&event.breakpoint_id, location);
                        if !appended {
                            tracing::debug!(
                                "resolve for unknown breakpoint {}",
                                event.breakpoint_id
                            );
                        }
                    }
                    Err(e) => {
                        tracing::warn!("dropping malformed breakpointResolved event: {}", e)
                    }
                }
            }
            other => tracing::debug!("ignoring event {}", other),
        }
    }

    async fn handle_closed(&self, reason: &str) {
        let was_live = {
            let mut inner = self.inner.lock().await;
            let was_live = !inner.state.is_terminal();
            inner.state = SessionState::Disconnected;
            inner.paused = None;
            was_live
        };
        // An explicit disconnect already told the caller; only an
        // unexpected loss is worth a notification.
        if was_live {
            tracing::warn!(session = %self.id, "transport closed: {}", reason);
            self.publish(SessionEventKind::Disconnected {
                reason: reason.to_string(),
            });
        }
    }

    fn publish(&self, kind: SessionEventKind) {
        let _ = self.events.send(SessionEvent {
            session_id: self.id.clone(),
            kind,
        });
    }
}

impl std::fmt::Debug for DebugSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebugSession")
            .field("id", &self.id)
            .field("target_url", &self.target_url)
            .finish_non_exhaustive()
    }
}

/// Consume the transport stream until it closes, then trigger the reap.
async fn run_event_loop(
    session: Arc<DebugSession>,
    mut events: mpsc::Receiver<TransportEvent>,
    reap: mpsc::UnboundedSender<String>,
) {
    while let Some(item) = events.recv().await {
        match item {
            TransportEvent::Event { method, params } => {
                session.handle_event(&method, params).await;
            }
            TransportEvent::Closed { reason } => {
                session.handle_closed(&reason).await;
                let _ = reap.send(session.id.clone());
                return;
            }
        }
    }
}

fn require_live(state: SessionState, operation: &str) -> Result<(), BrokerError> {
    if state.is_terminal() {
        return Err(BrokerError::InvalidState {
            operation: operation.to_string(),
            state,
        });
    }
    Ok(())
}

fn require_paused(state: SessionState, operation: &str) -> Result<(), BrokerError> {
    if state != SessionState::Paused {
        return Err(BrokerError::InvalidState {
            operation: operation.to_string(),
            state,
        });
    }
    Ok(())
}

fn parse_result<T: serde::de::DeserializeOwned>(
    value: serde_json::Value,
) -> Result<T, BrokerError> {
    serde_json::from_value(value).map_err(|e| BrokerError::Protocol {
        code: -32700,
        message: format!("unexpected result shape: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_kind_methods() {
        assert_eq!(StepKind::Over.method(), "Debugger.stepOver");
        assert_eq!(StepKind::Into.method(), "Debugger.stepInto");
        assert_eq!(StepKind::Out.method(), "Debugger.stepOut");
        assert_eq!(StepKind::Over.operation(), "step_over");
    }

    #[test]
    fn require_live_rejects_terminal() {
        assert!(require_live(SessionState::Connected, "op").is_ok());
        assert!(require_live(SessionState::Running, "op").is_ok());
        assert!(require_live(SessionState::Paused, "op").is_ok());
        let err = require_live(SessionState::Disconnected, "set_breakpoint").unwrap_err();
        assert!(matches!(err, BrokerError::InvalidState { .. }));
        assert!(err.to_string().contains("set_breakpoint"));
    }

    #[test]
    fn require_paused_rejects_everything_else() {
        assert!(require_paused(SessionState::Paused, "op").is_ok());
        for state in [
            SessionState::Connecting,
            SessionState::Connected,
            SessionState::Running,
            SessionState::Disconnected,
        ] {
            assert!(require_paused(state, "step_over").is_err());
        }
    }

    #[test]
    fn parse_result_shape_error_is_protocol() {
        let err =
            parse_result::<GetScriptSourceResult>(serde_json::json!({"wrong": true})).unwrap_err();
        assert!(matches!(err, BrokerError::Protocol { .. }));
    }
}
