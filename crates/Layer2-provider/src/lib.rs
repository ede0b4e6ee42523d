//! # orca-provider
//!
//! Model invocation interface for Orca.
//!
//! ## Features
//! - Message model shared by the agent loop and sub-agents
//! - `Provider` trait: one assistant turn per call
//! - Scripted provider that replays canned turns (tests, offline runs)

pub mod error;
pub mod message;
pub mod providers;
pub mod tool_def;
pub mod r#trait;

pub use message::{Message, MessageRole, ToolCall, ToolResult};
pub use r#trait::{FinishReason, Provider, ProviderResponse, TokenUsage};
pub use tool_def::ToolDef;

pub use error::ProviderError;

pub use providers::scripted::{RecordedRequest, ScriptedProvider, ScriptedTurn};
