//! Read Tool - read a text file
//!
//! Output carries line numbers (cat -n style) and supports offset/limit.

use super::resolve_path;
use async_trait::async_trait;
use orca_foundation::{Error, PermissionAction, Result, Tool, ToolContext, ToolMeta, ToolResult};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct ReadInput {
    pub path: String,

    /// First line to return (1-based)
    #[serde(default)]
    pub offset: Option<usize>,

    #[serde(default)]
    pub limit: Option<usize>,
}

pub struct ReadTool;

impl ReadTool {
    pub const NAME: &'static str = "read_file";

    const DEFAULT_LIMIT: usize = 2000;

    pub fn new() -> Self {
        Self
    }

    fn number_lines(content: &str, offset: usize, limit: usize) -> String {
        let start = offset.max(1);
        content
            .lines()
            .enumerate()
            .skip(start - 1)
            .take(limit)
            .map(|(i, line)| format!("{:>6}\t{}\n", i + 1, line))
            .collect()
    }
}

impl Default for ReadTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for ReadTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn meta(&self) -> ToolMeta {
        ToolMeta::new(Self::NAME)
            .display_name("Read File")
            .description("Read a text file with line numbers")
            .category("filesystem")
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "File path, absolute or relative to the working directory" },
                "offset": { "type": "integer", "description": "First line to read (1-based)" },
                "limit": { "type": "integer", "description": "Maximum number of lines (default 2000)" }
            },
            "required": ["path"]
        })
    }

    fn required_permission(&self, _input: &Value) -> Option<PermissionAction> {
        None
    }

    async fn execute(&self, input: Value, context: &dyn ToolContext) -> Result<ToolResult> {
        let parsed: ReadInput = serde_json::from_value(input)
            .map_err(|e| Error::InvalidInput(format!("Invalid input: {}", e)))?;
        let path = resolve_path(context, &parsed.path);

        if path.is_dir() {
            return Ok(ToolResult::error(format!(
                "Cannot read directory: {}",
                path.display()
            )));
        }
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) => {
                return Ok(ToolResult::error(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let output = Self::number_lines(
            &content,
            parsed.offset.unwrap_or(1),
            parsed.limit.unwrap_or(Self::DEFAULT_LIMIT),
        );
        Ok(ToolResult::success(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_lines() {
        let text = "a\nb\nc\n";
        assert_eq!(ReadTool::number_lines(text, 1, 10), "     1\ta\n     2\tb\n     3\tc\n");
        assert_eq!(ReadTool::number_lines(text, 2, 1), "     2\tb\n");
    }
}
