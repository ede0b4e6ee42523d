//! Write Tool - create or overwrite a file
//!
//! Gated: every write asks for `FileWrite` on the resolved path.

use super::resolve_path;
use async_trait::async_trait;
use orca_foundation::{Error, PermissionAction, Result, Tool, ToolContext, ToolMeta, ToolResult};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct WriteInput {
    pub path: String,

    pub content: String,
}

pub struct WriteTool;

impl WriteTool {
    pub const NAME: &'static str = "write_file";

    pub fn new() -> Self {
        Self
    }
}

impl Default for WriteTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for WriteTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn meta(&self) -> ToolMeta {
        ToolMeta::new(Self::NAME)
            .display_name("Write File")
            .description("Write content to a file (creates or overwrites)")
            .category("filesystem")
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "File path, absolute or relative to the working directory" },
                "content": { "type": "string", "description": "Full file content" }
            },
            "required": ["path", "content"]
        })
    }

    fn required_permission(&self, input: &Value) -> Option<PermissionAction> {
        let path = input.get("path")?.as_str()?;
        Some(PermissionAction::FileWrite {
            path: path.to_string(),
        })
    }

    async fn execute(&self, input: Value, context: &dyn ToolContext) -> Result<ToolResult> {
        let parsed: WriteInput = serde_json::from_value(input)
            .map_err(|e| Error::InvalidInput(format!("Invalid input: {}", e)))?;
        let path = resolve_path(context, &parsed.path);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &parsed.content).await?;

        Ok(ToolResult::success(format!(
            "Wrote {} bytes to {}",
            parsed.content.len(),
            path.display()
        ))
        .with_metadata("path", json!(path.display().to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::context::RuntimeContext;

    #[tokio::test]
    async fn test_writes_relative_to_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RuntimeContext::new("s1", dir.path());

        let result = WriteTool::new()
            .execute(json!({"path": "notes/a.txt", "content": "hello"}), &ctx)
            .await
            .unwrap();

        assert!(result.success);
        let written = std::fs::read_to_string(dir.path().join("notes/a.txt")).unwrap();
        assert_eq!(written, "hello");
    }

    #[test]
    fn test_permission_uses_requested_path() {
        let action = WriteTool::new().required_permission(&json!({"path": "a.txt", "content": ""}));
        assert_eq!(
            action,
            Some(PermissionAction::FileWrite {
                path: "a.txt".into()
            })
        );
    }
}
