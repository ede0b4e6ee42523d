//! Agent loop
//!
//! ```text
//! user message
//!    │
//!    ▼
//! provider.complete ──► no tool calls ──► Completed
//!    │ tool calls
//!    ▼
//! for each call:  unknown ─► error result
//!                 finish  ─► Finished
//!                 gated   ─► Granted / AutoApproved ─► execute
//!                            Denied                 ─► denial result
//!                            Unknown                ─► Suspended (interactive)
//!                                                      rejection   (autonomous)
//!    │
//!    └──► next iteration, up to max_iterations ──► Exhausted
//! ```

use crate::context::{AgentContext, ReviewMode};
use crate::delegation::{FinishArgs, FINISH_TOOL_NAME};
use crate::interrupt::{
    Decision, InterruptError, InterruptRecord, InterruptRequest, InterruptStore, EXPIRED_REASON,
};
use crate::session::{PendingTurn, Session};
use chrono::{DateTime, Utc};
use orca_foundation::{Error, PermissionStatus, Result};
use orca_provider::ToolCall;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Events emitted while a turn runs
#[derive(Debug, Clone)]
pub enum AgentEvent {
    /// Assistant text for this iteration
    Text(String),

    ToolStart {
        tool_name: String,
        tool_call_id: String,
    },

    ToolComplete {
        tool_name: String,
        tool_call_id: String,
        result: String,
        success: bool,
    },

    /// A gated action is waiting on review
    Suspended(InterruptRequest),

    Done {
        response: String,
    },
}

/// How a turn ended
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The model replied without tool calls
    Completed { response: String },
    /// A gated action is waiting on a reviewer
    Suspended(InterruptRequest),
    /// The finish tool was called
    Finished {
        result: String,
        summary: Option<String>,
    },
    /// Iteration cap reached
    Exhausted { last_output: String },
}

impl TurnOutcome {
    pub fn is_suspended(&self) -> bool {
        matches!(self, Self::Suspended(_))
    }
}

#[derive(Debug, Error)]
pub enum ResumeError {
    #[error(transparent)]
    Interrupt(#[from] InterruptError),

    #[error(transparent)]
    Agent(#[from] Error),
}

enum Dispatch {
    Continue,
    Finish {
        result: String,
        summary: Option<String>,
    },
    Suspend(InterruptRecord),
}

/// The agent
pub struct Agent {
    ctx: Arc<AgentContext>,
    interrupts: Arc<InterruptStore>,
    events: Option<mpsc::Sender<AgentEvent>>,
}

impl Agent {
    pub fn new(ctx: AgentContext) -> Self {
        Self::with_interrupts(ctx, Arc::new(InterruptStore::new()))
    }

    pub fn with_interrupts(ctx: AgentContext, interrupts: Arc<InterruptStore>) -> Self {
        Self {
            ctx: Arc::new(ctx),
            interrupts,
            events: None,
        }
    }

    pub fn with_events(mut self, tx: mpsc::Sender<AgentEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn context(&self) -> &AgentContext {
        &self.ctx
    }

    pub fn interrupts(&self) -> &Arc<InterruptStore> {
        &self.interrupts
    }

    /// Outstanding reviews, oldest first
    pub fn pending(&self) -> Vec<InterruptRequest> {
        self.interrupts.pending()
    }

    /// Run one user turn
    pub async fn run(&self, session: &mut Session, user_message: &str) -> Result<TurnOutcome> {
        if let Some(id) = session.pending_interrupt() {
            return Err(Error::Agent(format!(
                "Session {} is waiting on review {}",
                session.id, id
            )));
        }

        info!("Agent turn started for session {}", session.id);
        session.history.add_user(user_message);
        self.drive(session, 0).await
    }

    /// Continue a suspended turn with the reviewer's decision
    pub async fn resume(
        &self,
        session: &mut Session,
        interrupt_id: &str,
        decision: Decision,
    ) -> std::result::Result<TurnOutcome, ResumeError> {
        self.resume_with(session, interrupt_id, decision, false).await
    }

    /// Approve, and let the same action run without review for the rest of
    /// the process lifetime
    pub async fn approve_for_session(
        &self,
        session: &mut Session,
        interrupt_id: &str,
    ) -> std::result::Result<TurnOutcome, ResumeError> {
        self.resume_with(session, interrupt_id, Decision::Approve, true).await
    }

    async fn resume_with(
        &self,
        session: &mut Session,
        interrupt_id: &str,
        decision: Decision,
        remember: bool,
    ) -> std::result::Result<TurnOutcome, ResumeError> {
        if session.pending_interrupt() != Some(interrupt_id) {
            return Err(match self.interrupts.state(interrupt_id) {
                Some(crate::interrupt::InterruptState::Pending) => {
                    InterruptError::SessionMismatch(interrupt_id.to_string())
                }
                Some(crate::interrupt::InterruptState::Resolved(_)) => {
                    InterruptError::AlreadyResolved(interrupt_id.to_string())
                }
                None => InterruptError::NotFound(interrupt_id.to_string()),
            }
            .into());
        }

        let record = self.interrupts.resolve(interrupt_id, &decision)?;
        if remember {
            self.grant_session(&record.call);
        }
        let turn = session
            .take_pending(interrupt_id)
            .ok_or_else(|| InterruptError::NotFound(interrupt_id.to_string()))?;

        info!("Resuming session {} with {}", session.id, decision.kind());
        Ok(self.continue_turn(session, turn, decision).await?)
    }

    /// Auto-reject the session's pending review if it is older than the
    /// configured expiry
    pub async fn sweep_expired(
        &self,
        session: &mut Session,
        now: DateTime<Utc>,
    ) -> std::result::Result<Option<TurnOutcome>, ResumeError> {
        let Some(expiry) = self.ctx.review_expiry else {
            return Ok(None);
        };
        let Some(id) = session.pending_interrupt().map(str::to_string) else {
            return Ok(None);
        };

        let max_age = chrono::Duration::from_std(expiry)
            .map_err(|e| Error::Config(format!("Invalid review expiry: {}", e)))?;
        if !self.interrupts.expired_ids(now, max_age).contains(&id) {
            return Ok(None);
        }

        self.interrupts.expire(&id)?;
        let turn = session
            .take_pending(&id)
            .ok_or_else(|| InterruptError::NotFound(id.clone()))?;

        Ok(Some(
            self.continue_turn(session, turn, Decision::reject(EXPIRED_REASON))
                .await?,
        ))
    }

    fn grant_session(&self, call: &ToolCall) {
        let action = self
            .ctx
            .tools
            .get(&call.name)
            .and_then(|tool| tool.required_permission(&call.arguments));
        if let Some(action) = action {
            info!("Granted for this session: {}", action.description());
            self.ctx.permissions.grant_session(&call.name, action);
        }
    }

    async fn continue_turn(
        &self,
        session: &mut Session,
        turn: PendingTurn,
        decision: Decision,
    ) -> Result<TurnOutcome> {
        let call = turn.call;
        match decision {
            Decision::Approve => self.execute(session, &call, call.arguments.clone(), false).await,
            Decision::Edit { arguments } => self.execute(session, &call, arguments, true).await,
            Decision::Reject { reason } => {
                let content = format!("Rejected by reviewer: {}", reason);
                self.record_result(session, &call, content, false).await;
            }
        }

        if let Some(outcome) = self.dispatch_all(session, turn.remaining, turn.iterations).await? {
            return Ok(outcome);
        }
        self.drive(session, turn.iterations).await
    }

    async fn drive(&self, session: &mut Session, mut iterations: usize) -> Result<TurnOutcome> {
        let tools = self.ctx.tool_definitions();

        loop {
            if iterations >= self.ctx.max_iterations {
                warn!(
                    "Session {} hit the iteration cap ({})",
                    session.id, self.ctx.max_iterations
                );
                return Ok(TurnOutcome::Exhausted {
                    last_output: session.history.last_output(),
                });
            }
            iterations += 1;
            debug!("Iteration {} for session {}", iterations, session.id);

            let system_prompt = session
                .history
                .system_prompt()
                .unwrap_or(&self.ctx.system_prompt)
                .to_string();
            let response = self
                .ctx
                .provider
                .complete(session.history.messages(), &tools, Some(system_prompt.as_str()))
                .await?;

            if !response.content.is_empty() {
                self.emit(AgentEvent::Text(response.content.clone())).await;
            }
            session.history.add(response.to_message());

            if response.tool_calls.is_empty() {
                self.emit(AgentEvent::Done {
                    response: response.content.clone(),
                })
                .await;
                return Ok(TurnOutcome::Completed {
                    response: response.content,
                });
            }

            let calls = response.tool_calls.into_iter().collect();
            if let Some(outcome) = self.dispatch_all(session, calls, iterations).await? {
                return Ok(outcome);
            }
        }
    }

    /// Dispatch calls in order; `Some` when the turn has to stop
    async fn dispatch_all(
        &self,
        session: &mut Session,
        mut calls: VecDeque<ToolCall>,
        iterations: usize,
    ) -> Result<Option<TurnOutcome>> {
        while let Some(call) = calls.pop_front() {
            match self.dispatch(session, &call).await {
                Dispatch::Continue => {}
                Dispatch::Finish { result, summary } => {
                    for skipped in calls {
                        self.record_result(
                            session,
                            &skipped,
                            "Skipped: the task already finished".to_string(),
                            true,
                        )
                        .await;
                    }
                    info!("Session {} finished", session.id);
                    return Ok(Some(TurnOutcome::Finished { result, summary }));
                }
                Dispatch::Suspend(record) => {
                    let request = self.interrupts.suspend(record);
                    session.suspend(PendingTurn {
                        interrupt_id: request.id.clone(),
                        call,
                        remaining: calls,
                        iterations,
                    });
                    self.emit(AgentEvent::Suspended(request.clone())).await;
                    return Ok(Some(TurnOutcome::Suspended(request)));
                }
            }
        }
        Ok(None)
    }

    async fn dispatch(&self, session: &mut Session, call: &ToolCall) -> Dispatch {
        let Some(tool) = self.ctx.tools.get(&call.name) else {
            warn!("Model called unknown tool: {}", call.name);
            let content = format!("Tool not found: {}", call.name);
            self.record_result(session, call, content, false).await;
            return Dispatch::Continue;
        };

        if call.name == FINISH_TOOL_NAME {
            match serde_json::from_value::<FinishArgs>(call.arguments.clone()) {
                Ok(args) => {
                    self.record_result(session, call, "Task finished".to_string(), true).await;
                    return Dispatch::Finish {
                        result: args.result,
                        summary: args.summary,
                    };
                }
                Err(e) => {
                    let content = format!("Invalid finish arguments: {}", e);
                    self.record_result(session, call, content, false).await;
                    return Dispatch::Continue;
                }
            }
        }

        if let Some(action) = tool.required_permission(&call.arguments) {
            match self.ctx.permissions.check(&call.name, &action) {
                PermissionStatus::Granted | PermissionStatus::AutoApproved => {}
                PermissionStatus::Denied => {
                    info!("Denied by policy: {}", action.description());
                    let content = format!("Permission denied: {}", action.description());
                    self.record_result(session, call, content, false).await;
                    return Dispatch::Continue;
                }
                PermissionStatus::Unknown => match self.ctx.review {
                    ReviewMode::Interactive => {
                        return Dispatch::Suspend(InterruptRecord::new(
                            session.id.clone(),
                            call.clone(),
                            action.description(),
                            self.ctx.permissions.allowed_decisions(&call.name),
                        ));
                    }
                    ReviewMode::Autonomous => {
                        info!("No reviewer for {}; rejecting", action.description());
                        let content = format!(
                            "Rejected: '{}' needs review and no reviewer is available here. \
                             Finish with what you have or try an action that needs no approval.",
                            action.description()
                        );
                        self.record_result(session, call, content, false).await;
                        return Dispatch::Continue;
                    }
                },
            }
        }

        self.execute(session, call, call.arguments.clone(), false).await;
        Dispatch::Continue
    }

    async fn execute(
        &self,
        session: &mut Session,
        call: &ToolCall,
        arguments: Value,
        edited: bool,
    ) {
        let Some(tool) = self.ctx.tools.get(&call.name) else {
            let content = format!("Tool not found: {}", call.name);
            self.record_result(session, call, content, false).await;
            return;
        };

        info!("Executing tool: {}", call.name);
        self.emit(AgentEvent::ToolStart {
            tool_name: call.name.clone(),
            tool_call_id: call.id.clone(),
        })
        .await;

        let tool_ctx = self.ctx.tool_context(&session.id, &call.id);
        let (mut content, success) = match tool.execute(arguments, &tool_ctx).await {
            Ok(result) => (result.content().to_string(), result.success),
            Err(e) => (e.to_string(), false),
        };
        if edited {
            content = format!("(arguments edited by reviewer)\n{}", content);
        }

        self.record_result(session, call, content, success).await;
    }

    async fn record_result(
        &self,
        session: &mut Session,
        call: &ToolCall,
        content: String,
        success: bool,
    ) {
        self.emit(AgentEvent::ToolComplete {
            tool_name: call.name.clone(),
            tool_call_id: call.id.clone(),
            result: content.clone(),
            success,
        })
        .await;
        session.history.add_tool_result(&call.id, content, !success);
    }

    async fn emit(&self, event: AgentEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event).await;
        }
    }
}
