//! Ask Subagents Tool - delegate a task to a named sub-agent

use super::delegator::{DelegationRequest, Delegator};
use super::ASK_SUBAGENTS_TOOL_NAME;
use async_trait::async_trait;
use orca_foundation::{PermissionAction, Result, Tool, ToolContext, ToolMeta, ToolResult};
use orca_task::DelegationStatus;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

pub struct AskSubagentsTool {
    delegator: Arc<Delegator>,
}

impl AskSubagentsTool {
    pub fn new(delegator: Arc<Delegator>) -> Self {
        Self { delegator }
    }

    fn subagent_list(&self) -> String {
        self.delegator
            .subagents()
            .iter()
            .map(|spec| format!("- {}: {}", spec.id, spec.description))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl Tool for AskSubagentsTool {
    fn name(&self) -> &str {
        ASK_SUBAGENTS_TOOL_NAME
    }

    fn meta(&self) -> ToolMeta {
        ToolMeta::new(ASK_SUBAGENTS_TOOL_NAME)
            .display_name("Ask Subagents")
            .description(format!(
                "Delegate a self-contained task to a sub-agent and wait for its report. \
                 Pass the task_id from an earlier report to continue that task.\n\
                 Available sub-agents:\n{}",
                self.subagent_list()
            ))
            .category("delegation")
    }

    fn schema(&self) -> Value {
        let ids: Vec<&str> = self.delegator.subagents().ids();
        json!({
            "type": "object",
            "properties": {
                "subagent_id": { "type": "string", "enum": ids, "description": "Sub-agent to run" },
                "task_description": { "type": "string", "description": "What the sub-agent should do" },
                "task_name": { "type": "string", "description": "Short name (defaults to the first line of the description)" },
                "task_id": { "type": "string", "description": "Task id from an earlier report, to continue it" },
                "context": { "type": "string", "description": "Background the sub-agent needs" },
                "data_transfer": { "description": "Structured data handed to the sub-agent" }
            },
            "required": ["subagent_id", "task_description"]
        })
    }

    fn required_permission(&self, _input: &Value) -> Option<PermissionAction> {
        None
    }

    async fn execute(&self, input: Value, context: &dyn ToolContext) -> Result<ToolResult> {
        let request: DelegationRequest = match serde_json::from_value(input) {
            Ok(request) => request,
            Err(e) => return Ok(ToolResult::error(format!("Invalid input: {}", e))),
        };
        debug!("Delegating to {}: {}", request.subagent, request.display_name());

        let report = match self.delegator.delegate(request, context.tool_call_id()).await {
            Ok(report) => report,
            Err(e) => return Ok(ToolResult::error(e.to_string())),
        };

        let result = if report.status == DelegationStatus::Failed {
            ToolResult::error(report.to_string())
        } else {
            ToolResult::success(report.to_string())
        };
        Ok(result
            .with_metadata("task_id", json!(report.task_id))
            .with_metadata("status", json!(report.status)))
    }
}
