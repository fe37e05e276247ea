//! The typed command surface.
//!
//! A thin, stateless dispatcher over the session registry: every
//! command resolves its session and delegates. This is the contract
//! the outer tool-call layer adapts; it carries no protocol knowledge
//! of its own.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;

use crate::breakpoint::{BreakpointRecord, ResolvedLocation};
use crate::error::BrokerError;
use crate::events::SessionEvent;
use crate::protocol::{EvaluateResult, PauseOnExceptionsState};
use crate::registry::SessionRegistry;
use crate::resources::{self, SessionDetails, SessionSummary};
use crate::session::StepKind;
use crate::state::SessionState;
use crate::view::{CallStack, ProjectedLocation, ScriptInfo, ScriptSource, VariableEntry};

/// Result of `connect_debugger`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectResult {
    /// The issued session id.
    pub session_id: String,
    /// State after the handshake.
    pub state: SessionState,
    /// The connected target URL.
    pub target_url: String,
}

/// Result of `set_breakpoint`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetBreakpointResult {
    /// Target-issued breakpoint id.
    pub breakpoint_id: String,
    /// Locations resolved so far; more may arrive via events.
    pub resolved: Vec<ResolvedLocation>,
}

/// The debugging broker's command surface.
#[derive(Debug, Clone)]
pub struct DebugBroker {
    registry: Arc<SessionRegistry>,
}

impl DebugBroker {
    /// Build the surface over an injected registry.
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// The underlying registry.
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Connect to a target and install a session.
    pub async fn connect_debugger(
        &self,
        url: &str,
        name: Option<String>,
    ) -> Result<ConnectResult, BrokerError> {
        let session = self.registry.create(url, name).await?;
        Ok(ConnectResult {
            session_id: session.id().to_string(),
            state: session.state().await,
            target_url: session.target_url().to_string(),
        })
    }

    /// Tear down a session. A second call for the same id reports
    /// `SESSION_NOT_FOUND`.
    pub async fn disconnect_debugger(&self, session_id: &str) -> Result<(), BrokerError> {
        let session = self.registry.remove(session_id).await?;
        session.disconnect().await;
        Ok(())
    }

    /// Set a breakpoint by URL; `line` is 0-based.
    pub async fn set_breakpoint(
        &self,
        session_id: &str,
        url: &str,
        line: u32,
        column: Option<u32>,
        condition: Option<String>,
    ) -> Result<SetBreakpointResult, BrokerError> {
        let record = self
            .registry
            .get(session_id)
            .await?
            .set_breakpoint(url, line, column, condition)
            .await?;
        Ok(SetBreakpointResult {
            breakpoint_id: record.id,
            resolved: record.resolved,
        })
    }

    /// Remove a breakpoint by its id.
    pub async fn remove_breakpoint(
        &self,
        session_id: &str,
        breakpoint_id: &str,
    ) -> Result<(), BrokerError> {
        self.registry
            .get(session_id)
            .await?
            .remove_breakpoint(breakpoint_id)
            .await
    }

    /// List the session's breakpoint records.
    pub async fn list_breakpoints(
        &self,
        session_id: &str,
    ) -> Result<Vec<BreakpointRecord>, BrokerError> {
        Ok(self.registry.get(session_id).await?.breakpoints().await)
    }

    /// Resume execution; returns the new state.
    pub async fn resume_execution(&self, session_id: &str) -> Result<SessionState, BrokerError> {
        self.registry.get(session_id).await?.resume().await
    }

    /// Step over the current statement.
    pub async fn step_over(&self, session_id: &str) -> Result<(), BrokerError> {
        self.registry.get(session_id).await?.step(StepKind::Over).await
    }

    /// Step into the next call.
    pub async fn step_into(&self, session_id: &str) -> Result<(), BrokerError> {
        self.registry.get(session_id).await?.step(StepKind::Into).await
    }

    /// Step out of the current function.
    pub async fn step_out(&self, session_id: &str) -> Result<(), BrokerError> {
        self.registry.get(session_id).await?.step(StepKind::Out).await
    }

    /// Ask the target to pause.
    pub async fn pause_execution(&self, session_id: &str) -> Result<(), BrokerError> {
        self.registry.get(session_id).await?.pause().await
    }

    /// The enriched call stack of the current pause.
    pub async fn get_call_stack(
        &self,
        session_id: &str,
        include_async: bool,
    ) -> Result<CallStack, BrokerError> {
        self.registry
            .get(session_id)
            .await?
            .call_stack(include_async)
            .await
    }

    /// Evaluate an expression on a frame or in the global context.
    pub async fn evaluate_expression(
        &self,
        session_id: &str,
        expression: &str,
        call_frame_id: Option<&str>,
        return_by_value: bool,
    ) -> Result<EvaluateResult, BrokerError> {
        self.registry
            .get(session_id)
            .await?
            .evaluate(expression, call_frame_id, return_by_value)
            .await
    }

    /// Variables of one scope of one paused frame.
    pub async fn get_scope_variables(
        &self,
        session_id: &str,
        call_frame_id: &str,
        scope_index: usize,
    ) -> Result<Vec<VariableEntry>, BrokerError> {
        self.registry
            .get(session_id)
            .await?
            .scope_variables(call_frame_id, scope_index)
            .await
    }

    /// Assign a variable in a scope of a paused frame.
    pub async fn set_variable_value(
        &self,
        session_id: &str,
        call_frame_id: &str,
        scope_index: usize,
        variable_name: &str,
        new_value: &str,
    ) -> Result<(), BrokerError> {
        self.registry
            .get(session_id)
            .await?
            .set_variable_value(call_frame_id, scope_index, variable_name, new_value)
            .await
    }

    /// Set the pause-on-exceptions mode; returns the new mode.
    pub async fn set_pause_on_exceptions(
        &self,
        session_id: &str,
        state: PauseOnExceptionsState,
    ) -> Result<PauseOnExceptionsState, BrokerError> {
        self.registry
            .get(session_id)
            .await?
            .set_pause_on_exceptions(state)
            .await
    }

    /// Project a generated position; `line` is 1-based, `column`
    /// 0-based.
    pub async fn get_original_location(
        &self,
        session_id: &str,
        script_id: &str,
        line: u32,
        column: u32,
    ) -> Result<ProjectedLocation, BrokerError> {
        self.registry
            .get(session_id)
            .await?
            .original_location(script_id, line, column)
            .await
    }

    /// Fetch script source, optionally preferring mapped original
    /// content.
    pub async fn get_script_source(
        &self,
        session_id: &str,
        script_id: &str,
        prefer_original: bool,
    ) -> Result<ScriptSource, BrokerError> {
        self.registry
            .get(session_id)
            .await?
            .script_source(script_id, prefer_original)
            .await
    }

    /// List parsed scripts.
    pub async fn list_scripts(
        &self,
        session_id: &str,
        include_internal: bool,
    ) -> Result<Vec<ScriptInfo>, BrokerError> {
        Ok(self
            .registry
            .get(session_id)
            .await?
            .scripts(include_internal)
            .await)
    }

    /// Summaries of every tracked session, oldest first.
    pub async fn list_sessions(&self) -> Vec<SessionSummary> {
        let mut summaries = Vec::new();
        for session in self.registry.list().await {
            summaries.push(resources::summarize(&session).await);
        }
        summaries
    }

    /// Full details of one session.
    pub async fn get_session_details(
        &self,
        session_id: &str,
    ) -> Result<SessionDetails, BrokerError> {
        let session = self.registry.get(session_id).await?;
        Ok(resources::detail(&session).await)
    }

    /// Subscribe to session notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.registry.subscribe()
    }
}
