//! Message history management

use orca_foundation::{Error, Result};
use orca_provider::{Message, MessageRole, ToolCall};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message history for one session or sub-task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageHistory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    system_prompt: Option<String>,

    #[serde(default)]
    messages: Vec<Message>,
}

impl MessageHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system_prompt(prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: Some(prompt.into()),
            messages: vec![],
        }
    }

    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.system_prompt = Some(prompt.into());
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    pub fn add_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    pub fn add_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
    }

    pub fn add_assistant_with_tools(
        &mut self,
        content: impl Into<String>,
        tool_calls: Vec<ToolCall>,
    ) {
        self.messages
            .push(Message::assistant_with_tools(content, tool_calls));
    }

    pub fn add_tool_result(
        &mut self,
        tool_call_id: impl Into<String>,
        content: impl Into<String>,
        is_error: bool,
    ) {
        self.messages
            .push(Message::tool_result(tool_call_id, content, is_error));
    }

    pub fn add(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn last_assistant(&self) -> Option<&Message> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::Assistant)
    }

    /// Best text to show for how this history ended
    pub fn last_output(&self) -> String {
        if let Some(message) = self.last_assistant() {
            if !message.content.trim().is_empty() {
                return message.content.clone();
            }
            if let Some(call) = message.tool_calls().first() {
                return format!(
                    "(last action was a call to `{}` with {})",
                    call.name, call.arguments
                );
            }
        }
        self.last()
            .map(|m| m.text().to_string())
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| "(no output)".to_string())
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    /// Opaque value stored in the task store
    pub fn snapshot(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn from_snapshot(snapshot: Value) -> Result<Self> {
        if !snapshot.is_object() {
            return Err(Error::InvalidInput(
                "Malformed task snapshot: expected an object".to_string(),
            ));
        }
        serde_json::from_value(snapshot)
            .map_err(|e| Error::InvalidInput(format!("Malformed task snapshot: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snapshot_restores_history() {
        let mut history = MessageHistory::with_system_prompt("be brief");
        history.add_user("find TODOs");
        history.add_assistant("two found");

        let restored = MessageHistory::from_snapshot(history.snapshot()).unwrap();
        assert_eq!(restored, history);
        assert_eq!(restored.system_prompt(), Some("be brief"));
    }

    #[test]
    fn test_malformed_snapshot() {
        assert!(MessageHistory::from_snapshot(json!("garbage")).is_err());
        assert!(MessageHistory::from_snapshot(json!({"messages": 3})).is_err());
    }

    #[test]
    fn test_last_output_falls_back_to_tool_call() {
        let mut history = MessageHistory::new();
        history.add_assistant_with_tools(
            "",
            vec![ToolCall::new("c1", "terminal", json!({"command": "ls"}))],
        );
        assert!(history.last_output().contains("`terminal`"));

        assert_eq!(MessageHistory::new().last_output(), "(no output)");
    }
}
