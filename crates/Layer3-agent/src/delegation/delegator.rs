//! Delegator - runs sub-agents to completion and reports back
//!
//! A delegation is synchronous from the parent's point of view: the child
//! agent runs in autonomous mode until it finishes, stops, or fails, its
//! history is saved in the task store under the task id, and a
//! `DelegationReport` is returned. Delegating again with the same task id
//! continues from the saved history.

use super::finish::FinishTool;
use super::ASK_SUBAGENTS_TOOL_NAME;
use crate::agent::{Agent, TurnOutcome};
use crate::context::AgentContext;
use crate::history::MessageHistory;
use crate::session::Session;
use chrono::Utc;
use orca_core::ToolRegistry;
use orca_foundation::{Error, PermissionService, Result};
use orca_provider::Provider;
use orca_task::{DelegationReport, SubAgentRegistry, SubAgentSpec, TaskRecord, TaskStore};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Default turn cap for a sub-agent without its own
pub const DEFAULT_SUBAGENT_MAX_TURNS: usize = 30;

const TASK_NAME_MAX_CHARS: usize = 60;

/// One delegation, as the parent model asks for it
#[derive(Debug, Clone, Deserialize)]
pub struct DelegationRequest {
    /// Existing task to continue, or the id to use for a new one
    #[serde(default)]
    pub task_id: Option<String>,

    #[serde(rename = "subagent_id")]
    pub subagent: String,

    #[serde(default)]
    pub task_name: Option<String>,

    #[serde(rename = "task_description")]
    pub description: String,

    #[serde(default)]
    pub context: Option<String>,

    #[serde(default)]
    pub data_transfer: Option<Value>,
}

impl DelegationRequest {
    pub fn new(subagent: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            task_id: None,
            subagent: subagent.into(),
            task_name: None,
            description: description.into(),
            context: None,
            data_transfer: None,
        }
    }

    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    pub fn with_task_name(mut self, name: impl Into<String>) -> Self {
        self.task_name = Some(name.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data_transfer = Some(data);
        self
    }

    /// `task_name`, or the first non-empty line of the description
    pub fn display_name(&self) -> String {
        if let Some(name) = self.task_name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.to_string();
        }
        let first = self
            .description
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("task");
        if first.chars().count() > TASK_NAME_MAX_CHARS {
            let cut: String = first.chars().take(TASK_NAME_MAX_CHARS).collect();
            format!("{}...", cut)
        } else {
            first.to_string()
        }
    }

    fn message(&self, heading: &str) -> String {
        let mut message = format!(
            "# {}: {}\n\n{}\n",
            heading,
            self.display_name(),
            self.description
        );
        if let Some(context) = self.context.as_deref().filter(|c| !c.trim().is_empty()) {
            message.push_str(&format!("\n## Context\n{}\n", context));
        }
        if let Some(data) = self.data_transfer.as_ref().filter(|d| !d.is_null()) {
            let rendered = serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string());
            message.push_str(&format!("\n## Data\n```json\n{}\n```\n", rendered));
        }
        message
    }
}

/// Task ids with a delegation currently running
struct InFlight<'a> {
    tasks: &'a Mutex<HashSet<String>>,
    task_id: String,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.tasks.lock().remove(&self.task_id);
    }
}

pub struct Delegator {
    provider: Arc<dyn Provider>,
    /// Parent's tools; narrowed per sub-agent
    tools: ToolRegistry,
    permissions: Arc<PermissionService>,
    store: Arc<TaskStore>,
    subagents: SubAgentRegistry,
    working_dir: PathBuf,
    max_turns: usize,
    in_flight: Mutex<HashSet<String>>,
}

impl Delegator {
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: ToolRegistry,
        permissions: Arc<PermissionService>,
        store: Arc<TaskStore>,
        working_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            provider,
            tools,
            permissions,
            store,
            subagents: SubAgentRegistry::with_builtins(),
            working_dir: working_dir.into(),
            max_turns: DEFAULT_SUBAGENT_MAX_TURNS,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_subagents(mut self, subagents: SubAgentRegistry) -> Self {
        self.subagents = subagents;
        self
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn subagents(&self) -> &SubAgentRegistry {
        &self.subagents
    }

    pub fn store(&self) -> &Arc<TaskStore> {
        &self.store
    }

    /// Run one delegation
    ///
    /// Usage errors (unknown sub-agent, task already running) are `Err`;
    /// everything that happens once the sub-agent starts is in the report.
    pub async fn delegate(
        &self,
        request: DelegationRequest,
        tool_call_id: Option<&str>,
    ) -> Result<DelegationReport> {
        let spec = self.subagents.get(&request.subagent).cloned().ok_or_else(|| {
            Error::InvalidInput(format!(
                "Unknown sub-agent '{}'. Available: {}",
                request.subagent,
                self.subagents.ids().join(", ")
            ))
        })?;

        let (task_id, existing) = match request.task_id.as_deref().filter(|id| !id.is_empty()) {
            Some(id) => (id.to_string(), self.store.get(id).await),
            None => (self.store.allocate_id(tool_call_id).await, None),
        };
        let _guard = self.claim(&task_id)?;

        let (history, message) = match existing.filter(TaskRecord::has_snapshot) {
            Some(record) => match MessageHistory::from_snapshot(record.snapshot) {
                Ok(history) => {
                    info!("Resuming task {} with sub-agent {}", task_id, spec.id);
                    (history, request.message("Follow-up"))
                }
                Err(e) => {
                    warn!("Task {} has an unusable snapshot: {}", task_id, e);
                    return Ok(DelegationReport::failed(
                        &task_id,
                        format!("Cannot resume task {}: {}", task_id, e),
                    ));
                }
            },
            None => {
                info!("Starting task {} with sub-agent {}", task_id, spec.id);
                self.store.write(TaskRecord::seed(&task_id, &spec.id)).await?;
                let history = if spec.system_prompt.trim().is_empty() {
                    MessageHistory::new()
                } else {
                    MessageHistory::with_system_prompt(spec.system_prompt.clone())
                };
                (history, request.message("Task"))
            }
        };

        let agent = Agent::new(self.child_context(&spec));
        let mut session = Session::with_history(task_id.clone(), history);

        let report = match agent.run(&mut session, &message).await {
            Ok(TurnOutcome::Finished { result, summary }) => {
                DelegationReport::completed(&task_id, result, summary)
            }
            Ok(TurnOutcome::Completed { response }) if !response.trim().is_empty() => {
                DelegationReport::incomplete(&task_id, response)
            }
            Ok(TurnOutcome::Completed { .. }) => {
                DelegationReport::incomplete(&task_id, session.history.last_output())
            }
            Ok(TurnOutcome::Exhausted { last_output }) => {
                DelegationReport::incomplete(&task_id, last_output)
            }
            Ok(TurnOutcome::Suspended(request)) => DelegationReport::incomplete(
                &task_id,
                format!("Stopped waiting on review of: {}", request.description),
            ),
            Err(e) => {
                warn!("Task {} failed: {}", task_id, e);
                DelegationReport::failed(&task_id, e.to_string())
            }
        };

        let record = TaskRecord {
            task_id: task_id.clone(),
            subagent: spec.id.clone(),
            status: report.status.into(),
            snapshot: session.history.snapshot(),
            updated_at: Utc::now(),
        };
        if let Err(e) = self.store.write(record).await {
            warn!("Failed to save task {}: {}", task_id, e);
        }

        info!("Task {} ended: {}", task_id, report.status.text());
        Ok(report)
    }

    fn claim(&self, task_id: &str) -> Result<InFlight<'_>> {
        if !self.in_flight.lock().insert(task_id.to_string()) {
            return Err(Error::InvalidInput(format!(
                "Task {} is already running",
                task_id
            )));
        }
        Ok(InFlight {
            tasks: &self.in_flight,
            task_id: task_id.to_string(),
        })
    }

    fn child_context(&self, spec: &SubAgentSpec) -> AgentContext {
        let mut tools = self
            .tools
            .narrowed(|name| name != ASK_SUBAGENTS_TOOL_NAME && spec.allows(name));
        tools.register(Arc::new(FinishTool::new()));

        AgentContext::new(
            Arc::clone(&self.provider),
            tools,
            Arc::clone(&self.permissions),
            self.working_dir.clone(),
        )
        .with_max_iterations(spec.max_turns.unwrap_or(self.max_turns))
        .autonomous()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_from_tool_input() {
        let request: DelegationRequest = serde_json::from_value(json!({
            "subagent_id": "explore",
            "task_description": "Find TODO comments\nin src/",
            "data_transfer": {"paths": ["src"]}
        }))
        .unwrap();

        assert_eq!(request.subagent, "explore");
        assert!(request.task_id.is_none());
        assert_eq!(request.display_name(), "Find TODO comments");
    }

    #[test]
    fn test_display_name_truncates() {
        let request = DelegationRequest::new("general", "x".repeat(100));
        assert_eq!(request.display_name().chars().count(), TASK_NAME_MAX_CHARS + 3);

        let named = DelegationRequest::new("general", "whatever").with_task_name("find TODOs");
        assert_eq!(named.display_name(), "find TODOs");
    }

    #[test]
    fn test_message_sections() {
        let message = DelegationRequest::new("general", "Count lines")
            .with_context("only rust files")
            .with_data(json!({"dir": "src"}))
            .message("Task");

        assert!(message.starts_with("# Task: Count lines"));
        assert!(message.contains("## Context\nonly rust files"));
        assert!(message.contains("```json\n{\n  \"dir\": \"src\"\n}\n```"));
    }
}
