//! Tool interface
//!
//! Tools are implemented in Layer2-core (builtins) and Layer3-agent
//! (`ask_subagents`, `finish`). The agent loop looks them up by name, asks each
//! for the action it needs reviewed, then executes it with a `ToolContext`.

use crate::permission::PermissionAction;
use crate::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

// ============================================================================
// Tool metadata
// ============================================================================

#[derive(Debug, Clone)]
pub struct ToolMeta {
    /// Unique name the model calls the tool by
    pub name: String,
    pub display_name: String,
    pub description: String,
    /// filesystem, execute, delegation, ...
    pub category: String,
}

impl ToolMeta {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            description: String::new(),
            category: "general".to_string(),
        }
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn category(mut self, cat: impl Into<String>) -> Self {
        self.category = cat.into();
        self
    }
}

// ============================================================================
// Tool result
// ============================================================================

/// Result of `Tool::execute`
///
/// A failed result is still a normal value: its text goes back to the model
/// as an error tool message.
#[derive(Debug, Clone)]
pub struct ToolExecutionResult {
    pub success: bool,
    pub output: String,
    pub error: Option<String>,
    pub metadata: HashMap<String, Value>,
}

impl ToolExecutionResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
            metadata: HashMap::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(message.into()),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Text handed back to the model
    pub fn content(&self) -> &str {
        if self.success {
            &self.output
        } else {
            self.error.as_deref().unwrap_or("Unknown error")
        }
    }
}

pub type ToolResult = ToolExecutionResult;

// ============================================================================
// Tool / ToolContext
// ============================================================================

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn meta(&self) -> ToolMeta;

    /// JSON schema of the input object
    fn schema(&self) -> Value;

    async fn execute(&self, input: Value, context: &dyn ToolContext) -> Result<ToolResult>;

    /// Action that must pass review before `execute` runs with this input.
    /// `None` means the call is never gated.
    fn required_permission(&self, input: &Value) -> Option<PermissionAction>;
}

pub trait ToolContext: Send + Sync {
    fn working_dir(&self) -> &Path;

    fn session_id(&self) -> &str;

    /// Id of the tool call being executed, if any
    fn tool_call_id(&self) -> Option<&str> {
        None
    }
}
