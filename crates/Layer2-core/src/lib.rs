//! orca-core: tool runtime for Orca
//!
//! Layer2 - the tools an agent can call and the registry that resolves them.
//!
//! ```ignore
//! use orca_core::{RuntimeContext, ToolRegistry};
//!
//! let processes = Arc::new(ProcessManager::default());
//! let registry = ToolRegistry::with_builtins(processes);
//! let ctx = RuntimeContext::new("session-1", std::env::current_dir()?);
//!
//! let tool = registry.get("terminal").unwrap();
//! let result = tool.execute(json!({ "command": "ls" }), &ctx).await?;
//! ```

pub mod tool;

pub use tool::{ReadTool, RuntimeContext, TerminalTool, ToolRegistry, WriteTool};
