//! Scripted provider - replays canned assistant turns in order
//!
//! Used by tests and by the CLI when no live model is wired in. Every request
//! is recorded so callers can assert on what the model was shown.
//!
//! Script file format (JSON array):
//!
//! ```json
//! [
//!   { "content": "", "toolCalls": [{ "id": "call_1", "name": "terminal", "arguments": { "command": "ls" } }] },
//!   { "content": "All done." },
//!   { "error": "upstream unavailable" }
//! ]
//! ```

use crate::error::ProviderError;
use crate::r#trait::{Provider, ProviderResponse};
use crate::{Message, ToolDef};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::VecDeque;
use std::path::Path;
use tracing::debug;

/// One scripted turn
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScriptedTurn {
    Fail { error: String },
    Respond(ProviderResponse),
}

/// What the provider was asked
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub messages: Vec<Message>,
    pub tool_names: Vec<String>,
    pub system_prompt: Option<String>,
}

pub struct ScriptedProvider {
    turns: Mutex<VecDeque<ScriptedTurn>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedProvider {
    pub fn new(turns: impl IntoIterator<Item = ScriptedTurn>) -> Self {
        Self {
            turns: Mutex::new(turns.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn from_responses(responses: impl IntoIterator<Item = ProviderResponse>) -> Self {
        Self::new(responses.into_iter().map(ScriptedTurn::Respond))
    }

    pub fn from_file(path: &Path) -> Result<Self, ProviderError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ProviderError::NotConfigured(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let turns: Vec<ScriptedTurn> = serde_json::from_str(&content)
            .map_err(|e| ProviderError::ParseError(format!("{}: {}", path.display(), e)))?;
        Ok(Self::new(turns))
    }

    /// Queue more turns at the end
    pub fn push(&self, turn: ScriptedTurn) {
        self.turns.lock().push_back(turn);
    }

    pub fn remaining(&self) -> usize {
        self.turns.lock().len()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDef],
        system_prompt: Option<&str>,
    ) -> Result<ProviderResponse, ProviderError> {
        let served = {
            let mut requests = self.requests.lock();
            requests.push(RecordedRequest {
                messages: messages.to_vec(),
                tool_names: tools.iter().map(|t| t.name.clone()).collect(),
                system_prompt: system_prompt.map(str::to_string),
            });
            requests.len() - 1
        };

        let turn = self.turns.lock().pop_front();
        debug!("Scripted turn {} ({} message(s) in context)", served, messages.len());
        match turn {
            Some(ScriptedTurn::Respond(response)) => Ok(response),
            Some(ScriptedTurn::Fail { error }) => Err(ProviderError::RequestFailed(error)),
            None => Err(ProviderError::ScriptExhausted(served)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ToolCall;
    use serde_json::json;

    #[tokio::test]
    async fn test_replays_in_order_and_records() {
        let provider = ScriptedProvider::from_responses([
            ProviderResponse::tool_calls("", vec![ToolCall::new("c1", "terminal", json!({}))]),
            ProviderResponse::text("done"),
        ]);
        let tools = vec![ToolDef::new("terminal", "", json!({}))];

        let first = provider
            .complete(&[Message::user("go")], &tools, Some("sys"))
            .await
            .unwrap();
        assert_eq!(first.tool_calls[0].name, "terminal");

        let second = provider.complete(&[], &[], None).await.unwrap();
        assert_eq!(second.content, "done");
        assert_eq!(
            provider.complete(&[], &[], None).await,
            Err(ProviderError::ScriptExhausted(2))
        );

        let requests = provider.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].tool_names, vec!["terminal"]);
        assert_eq!(requests[0].system_prompt.as_deref(), Some("sys"));
    }

    #[test]
    fn test_parse_script() {
        let turns: Vec<ScriptedTurn> = serde_json::from_value(json!([
            { "content": "", "toolCalls": [{ "id": "c1", "name": "terminal", "arguments": { "command": "ls" } }] },
            { "content": "hello" },
            { "error": "boom" }
        ]))
        .unwrap();

        assert!(matches!(&turns[0], ScriptedTurn::Respond(r) if r.tool_calls.len() == 1));
        assert!(matches!(&turns[1], ScriptedTurn::Respond(r) if r.content == "hello"));
        assert_eq!(turns[2], ScriptedTurn::Fail { error: "boom".into() });
    }
}
