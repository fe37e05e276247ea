//! Line-delimited JSON adapter over the command surface.
//!
//! The delegated outer layer: one JSON request per line on stdin, one
//! JSON response per line on stdout, session notifications interleaved
//! as `{"notification": …}` lines. Nothing here knows the protocol;
//! it is serde in, serde out.

use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{broadcast, mpsc};

use tether_broker::{BrokerError, DebugBroker, PauseOnExceptionsState};

fn default_true() -> bool {
    true
}

/// One request line: an optional client sequence number plus the
/// command.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    seq: Option<u64>,
    #[serde(flatten)]
    request: Request,
}

/// The commands the adapter accepts, mirroring the command surface.
#[derive(Debug, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
enum Request {
    ConnectDebugger {
        url: String,
        name: Option<String>,
    },
    DisconnectDebugger {
        session_id: String,
    },
    SetBreakpoint {
        session_id: String,
        url: String,
        line: u32,
        column: Option<u32>,
        condition: Option<String>,
    },
    RemoveBreakpoint {
        session_id: String,
        breakpoint_id: String,
    },
    ListBreakpoints {
        session_id: String,
    },
    ResumeExecution {
        session_id: String,
    },
    StepOver {
        session_id: String,
    },
    StepInto {
        session_id: String,
    },
    StepOut {
        session_id: String,
    },
    PauseExecution {
        session_id: String,
    },
    GetCallStack {
        session_id: String,
        #[serde(default = "default_true")]
        include_async: bool,
    },
    EvaluateExpression {
        session_id: String,
        expression: String,
        call_frame_id: Option<String>,
        #[serde(default)]
        return_by_value: bool,
    },
    GetScopeVariables {
        session_id: String,
        call_frame_id: String,
        #[serde(default)]
        scope_index: usize,
    },
    SetVariableValue {
        session_id: String,
        call_frame_id: String,
        #[serde(default)]
        scope_index: usize,
        variable_name: String,
        new_value: String,
    },
    SetPauseOnExceptions {
        session_id: String,
        state: PauseOnExceptionsState,
    },
    GetOriginalLocation {
        session_id: String,
        script_id: String,
        line: u32,
        #[serde(default)]
        column: u32,
    },
    GetScriptSource {
        session_id: String,
        script_id: String,
        #[serde(default)]
        prefer_original: bool,
    },
    ListScripts {
        session_id: String,
        #[serde(default)]
        include_internal: bool,
    },
    ListSessions,
    GetSessionDetails {
        session_id: String,
    },
}

/// Drive the adapter until the reader ends.
pub async fn run<R, W>(broker: DebugBroker, reader: R, writer: W) -> anyhow::Result<()>
where
    R: tokio::io::AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    // All output funnels through one channel so responses and
    // notifications never interleave mid-line.
    let (out_tx, mut out_rx) = mpsc::channel::<String>(64);
    tokio::spawn(async move {
        let mut writer = writer;
        while let Some(line) = out_rx.recv().await {
            if writer.write_all(line.as_bytes()).await.is_err() {
                break;
            }
            if writer.write_all(b"\n").await.is_err() {
                break;
            }
            if writer.flush().await.is_err() {
                break;
            }
        }
    });

    // Forward session notifications as they arrive.
    let mut events = broker.subscribe();
    let notify_tx = out_tx.clone();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let line = serde_json::json!({ "notification": event }).to_string();
                    if notify_tx.send(line).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("notification stream lagged, skipped {}", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let response = handle_line(&broker, line).await;
        if out_tx.send(response.to_string()).await.is_err() {
            break;
        }
    }
    Ok(())
}

async fn handle_line(broker: &DebugBroker, line: &str) -> serde_json::Value {
    match serde_json::from_str::<Envelope>(line) {
        Ok(envelope) => {
            let seq = envelope.seq;
            match dispatch(broker, envelope.request).await {
                Ok(result) => serde_json::json!({
                    "seq": seq,
                    "ok": true,
                    "result": result,
                }),
                Err(e) => serde_json::json!({
                    "seq": seq,
                    "ok": false,
                    "error": { "code": e.code(), "message": e.to_string() },
                }),
            }
        }
        Err(e) => serde_json::json!({
            "ok": false,
            "error": {
                "code": "INVALID_PARAMETERS",
                "message": format!("unparseable request: {}", e),
            },
        }),
    }
}

async fn dispatch(
    broker: &DebugBroker,
    request: Request,
) -> Result<serde_json::Value, BrokerError> {
    let success = serde_json::json!({ "success": true });
    match request {
        Request::ConnectDebugger { url, name } => {
            to_json(broker.connect_debugger(&url, name).await?)
        }
        Request::DisconnectDebugger { session_id } => {
            broker.disconnect_debugger(&session_id).await?;
            Ok(success)
        }
        Request::SetBreakpoint {
            session_id,
            url,
            line,
            column,
            condition,
        } => to_json(
            broker
                .set_breakpoint(&session_id, &url, line, column, condition)
                .await?,
        ),
        Request::RemoveBreakpoint {
            session_id,
            breakpoint_id,
        } => {
            broker.remove_breakpoint(&session_id, &breakpoint_id).await?;
            Ok(success)
        }
        Request::ListBreakpoints { session_id } => {
            to_json(broker.list_breakpoints(&session_id).await?)
        }
        Request::ResumeExecution { session_id } => {
            to_json(broker.resume_execution(&session_id).await?)
        }
        Request::StepOver { session_id } => {
            broker.step_over(&session_id).await?;
            Ok(success)
        }
        Request::StepInto { session_id } => {
            broker.step_into(&session_id).await?;
            Ok(success)
        }
        Request::StepOut { session_id } => {
            broker.step_out(&session_id).await?;
            Ok(success)
        }
        Request::PauseExecution { session_id } => {
            broker.pause_execution(&session_id).await?;
            Ok(success)
        }
        Request::GetCallStack {
            session_id,
            include_async,
        } => to_json(broker.get_call_stack(&session_id, include_async).await?),
        Request::EvaluateExpression {
            session_id,
            expression,
            call_frame_id,
            return_by_value,
        } => to_json(
            broker
                .evaluate_expression(
                    &session_id,
                    &expression,
                    call_frame_id.as_deref(),
                    return_by_value,
                )
                .await?,
        ),
        Request::GetScopeVariables {
            session_id,
            call_frame_id,
            scope_index,
        } => to_json(
            broker
                .get_scope_variables(&session_id, &call_frame_id, scope_index)
                .await?,
        ),
        Request::SetVariableValue {
            session_id,
            call_frame_id,
            scope_index,
            variable_name,
            new_value,
        } => {
            broker
                .set_variable_value(
                    &session_id,
                    &call_frame_id,
                    scope_index,
                    &variable_name,
                    &new_value,
                )
                .await?;
            Ok(success)
        }
        Request::SetPauseOnExceptions { session_id, state } => {
            to_json(broker.set_pause_on_exceptions(&session_id, state).await?)
        }
        Request::GetOriginalLocation {
            session_id,
            script_id,
            line,
            column,
        } => to_json(
            broker
                .get_original_location(&session_id, &script_id, line, column)
                .await?,
        ),
        Request::GetScriptSource {
            session_id,
            script_id,
            prefer_original,
        } => to_json(
            broker
                .get_script_source(&session_id, &script_id, prefer_original)
                .await?,
        ),
        Request::ListScripts {
            session_id,
            include_internal,
        } => to_json(broker.list_scripts(&session_id, include_internal).await?),
        Request::ListSessions => to_json(broker.list_sessions().await),
        Request::GetSessionDetails { session_id } => {
            to_json(broker.get_session_details(&session_id).await?)
        }
    }
}

fn to_json<T: serde::Serialize>(value: T) -> Result<serde_json::Value, BrokerError> {
    Ok(serde_json::to_value(value).unwrap_or(serde_json::Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tether_broker::{RegistryConfig, SessionRegistry};
    use tether_sourcemap::StaticFetcher;

    fn test_broker() -> DebugBroker {
        let registry = SessionRegistry::new(
            RegistryConfig::default(),
            Arc::new(StaticFetcher::new()),
        );
        DebugBroker::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn handle_line_rejects_garbage() {
        let broker = test_broker();
        let response = handle_line(&broker, "not json").await;
        assert_eq!(response["ok"], false);
        assert_eq!(response["error"]["code"], "INVALID_PARAMETERS");
    }

    #[tokio::test]
    async fn handle_line_rejects_unknown_command() {
        let broker = test_broker();
        let response = handle_line(&broker, r#"{"command":"frobnicate"}"#).await;
        assert_eq!(response["ok"], false);
    }

    #[tokio::test]
    async fn handle_line_echoes_seq() {
        let broker = test_broker();
        let response = handle_line(&broker, r#"{"seq":7,"command":"list_sessions"}"#).await;
        assert_eq!(response["seq"], 7);
        assert_eq!(response["ok"], true);
        assert!(response["result"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn handle_line_maps_broker_errors() {
        let broker = test_broker();
        let response = handle_line(
            &broker,
            r#"{"command":"pause_execution","session_id":"missing"}"#,
        )
        .await;
        assert_eq!(response["ok"], false);
        assert_eq!(response["error"]["code"], "SESSION_NOT_FOUND");
    }

    #[tokio::test]
    async fn run_processes_lines_and_ends_on_eof() {
        let broker = test_broker();
        let input = b"{\"command\":\"list_sessions\"}\n".to_vec();
        let reader = tokio::io::BufReader::new(std::io::Cursor::new(input));
        let writer = Vec::new();
        // The writer moves into a task; this only checks clean shutdown.
        run(broker, reader, writer).await.unwrap();
    }
}
