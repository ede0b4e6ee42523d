//! Tool definitions for model function calling

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Definition of a tool that the model may call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDef {
    pub name: String,

    pub description: String,

    /// JSON Schema of the input object
    pub parameters: Value,
}

impl ToolDef {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Names of required parameters, if the schema lists any
    pub fn required(&self) -> Vec<&str> {
        self.parameters
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_required() {
        let def = ToolDef::new(
            "write_file",
            "Write a file",
            json!({
                "type": "object",
                "properties": { "path": {"type": "string"}, "content": {"type": "string"} },
                "required": ["path", "content"]
            }),
        );
        assert_eq!(def.required(), vec!["path", "content"]);
        assert!(ToolDef::new("x", "", json!({})).required().is_empty());
    }
}
