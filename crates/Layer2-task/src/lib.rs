//! # orca-task
//!
//! Execution bookkeeping for Orca.
//!
//! ## Features
//!
//! - Shell commands in the foreground (with timeout) or background
//! - Drainable, bounded output buffers per background process
//! - Task store keyed by task id for resumable sub-agent work
//! - Sub-agent definitions and the delegation report format

pub mod process;
pub mod store;
pub mod subagent;

pub use process::{
    DrainedOutput, ForegroundOutcome, OutputBuffer, ProcessManager, ProcessStatus, ProcessSummary,
    NO_NEW_OUTPUT,
};
pub use store::{TaskRecord, TaskStatus, TaskStore, TASKS_FILE};
pub use subagent::{DelegationReport, DelegationStatus, SubAgentRegistry, SubAgentSpec};
