//! Core interfaces shared by every layer
//!
//! - `traits.rs`: `Tool`, `ToolContext`, `ToolMeta`, `ToolResult`

mod traits;

pub use traits::{Tool, ToolContext, ToolExecutionResult, ToolMeta, ToolResult};
