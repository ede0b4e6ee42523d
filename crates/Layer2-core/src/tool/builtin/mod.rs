//! Builtin Tools
//!
//! ### Filesystem
//! - `read_file` - read a file with line numbers
//! - `write_file` - create or overwrite a file (gated)
//!
//! ### Execute
//! - `terminal` - foreground / background shell commands (gated when running a command)

pub mod read;
pub mod terminal;
pub mod write;

pub use read::ReadTool;
pub use terminal::TerminalTool;
pub use write::WriteTool;

use orca_foundation::{Tool, ToolContext};
use orca_task::ProcessManager;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Every builtin tool, sharing one process manager
pub fn all_tools(processes: Arc<ProcessManager>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(ReadTool::new()) as Arc<dyn Tool>,
        Arc::new(WriteTool::new()),
        Arc::new(TerminalTool::new(processes)),
    ]
}

/// Relative paths are taken from the context's working directory
pub(crate) fn resolve_path(context: &dyn ToolContext, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        context.working_dir().join(path)
    }
}
