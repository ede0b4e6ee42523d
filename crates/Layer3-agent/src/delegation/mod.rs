//! Delegation to sub-agents

mod ask;
mod delegator;
mod finish;

pub use ask::AskSubagentsTool;
pub use delegator::{DelegationRequest, Delegator, DEFAULT_SUBAGENT_MAX_TURNS};
pub use finish::{FinishArgs, FinishTool, FINISH_TOOL_NAME};

pub const ASK_SUBAGENTS_TOOL_NAME: &str = "ask_subagents";
