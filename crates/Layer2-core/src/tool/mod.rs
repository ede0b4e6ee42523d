//! Tool system
//!
//! - `registry`: name lookup for every tool the agent can call
//! - `context`: `ToolContext` implementation used at execution time
//! - `builtin`: `read_file`, `write_file`, `terminal`

pub mod builtin;
pub mod context;
pub mod registry;

pub use builtin::{ReadTool, TerminalTool, WriteTool};
pub use context::RuntimeContext;
pub use registry::ToolRegistry;
