//! Agent context - shared state for agent execution

use orca_core::{RuntimeContext, ToolRegistry};
use orca_foundation::PermissionService;
use orca_provider::{Provider, ToolDef};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default iteration cap for one turn
pub const DEFAULT_MAX_ITERATIONS: usize = 50;

/// How gated actions with no standing policy are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewMode {
    /// Suspend and wait for a reviewer
    #[default]
    Interactive,
    /// No reviewer is attached; reject and tell the model why
    Autonomous,
}

/// Context shared across agent execution
pub struct AgentContext {
    /// Model invocation
    pub provider: Arc<dyn Provider>,

    /// Tools the model may call
    pub tools: ToolRegistry,

    /// Review policy
    pub permissions: Arc<PermissionService>,

    /// Working directory
    pub working_dir: PathBuf,

    /// Used when the history carries no prompt of its own
    pub system_prompt: String,

    pub max_iterations: usize,

    pub review: ReviewMode,

    /// Pending reviews older than this are auto-rejected
    pub review_expiry: Option<Duration>,
}

impl AgentContext {
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: ToolRegistry,
        permissions: Arc<PermissionService>,
        working_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            provider,
            tools,
            permissions,
            working_dir: working_dir.into(),
            system_prompt: default_system_prompt(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            review: ReviewMode::default(),
            review_expiry: None,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn autonomous(mut self) -> Self {
        self.review = ReviewMode::Autonomous;
        self
    }

    pub fn with_review_expiry(mut self, expiry: Option<Duration>) -> Self {
        self.review_expiry = expiry;
        self
    }

    /// Tool definitions for the model
    pub fn tool_definitions(&self) -> Vec<ToolDef> {
        self.tools.definitions()
    }

    /// Tool context for one call
    pub fn tool_context(&self, session_id: &str, tool_call_id: &str) -> RuntimeContext {
        RuntimeContext::new(session_id, self.working_dir.clone()).for_call(tool_call_id)
    }
}

fn default_system_prompt() -> String {
    r#"You are Orca, a coding agent working inside the user's project.

Use the tools you are given to inspect files, edit them and run commands.
Some actions need the user's approval; if one is rejected, read the reason
and adjust instead of retrying the same action.
Keep answers short and concrete."#
        .to_string()
}
