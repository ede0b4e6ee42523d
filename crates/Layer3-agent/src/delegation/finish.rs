//! Finish Tool - how a sub-agent hands its result back
//!
//! The agent loop intercepts calls to this tool; `execute` only runs if the
//! tool is called outside a loop.

use async_trait::async_trait;
use orca_foundation::{PermissionAction, Result, Tool, ToolContext, ToolMeta, ToolResult};
use serde::Deserialize;
use serde_json::{json, Value};

pub const FINISH_TOOL_NAME: &str = "finish";

#[derive(Debug, Clone, Deserialize)]
pub struct FinishArgs {
    pub result: String,

    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Default)]
pub struct FinishTool;

impl FinishTool {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for FinishTool {
    fn name(&self) -> &str {
        FINISH_TOOL_NAME
    }

    fn meta(&self) -> ToolMeta {
        ToolMeta::new(FINISH_TOOL_NAME)
            .display_name("Finish")
            .description(
                "Call when the task is done. `result` is handed back to the agent that \
                 delegated the task; `summary` is an optional one-line recap.",
            )
            .category("delegation")
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "result": { "type": "string", "description": "Final result of the task" },
                "summary": { "type": "string", "description": "One-line summary" }
            },
            "required": ["result"]
        })
    }

    fn required_permission(&self, _input: &Value) -> Option<PermissionAction> {
        None
    }

    async fn execute(&self, _input: Value, _context: &dyn ToolContext) -> Result<ToolResult> {
        Ok(ToolResult::success("Task finished"))
    }
}
