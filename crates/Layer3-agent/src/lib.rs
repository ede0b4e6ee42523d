//! # orca-agent
//!
//! Agent loop for Orca.
//!
//! ## Components
//!
//! - **Agent**: single `while(tool_call)` loop over a `MessageHistory`
//! - **Interrupts**: gated actions suspend the turn until a reviewer
//!   approves, rejects or edits them, exactly once
//! - **Delegation**: `ask_subagents` runs a named sub-agent to completion and
//!   returns a report; the task id makes the work resumable
//!
//! ## Usage
//!
//! ```ignore
//! use orca_agent::{Agent, AgentContext, Decision, Session, TurnOutcome};
//!
//! let agent = Agent::new(AgentContext::new(provider, tools, permissions, cwd));
//! let mut session = Session::new();
//!
//! let mut outcome = agent.run(&mut session, "Write hello.txt").await?;
//! while let TurnOutcome::Suspended(request) = outcome {
//!     outcome = agent.resume(&mut session, &request.id, Decision::Approve).await?;
//! }
//! ```

pub mod agent;
pub mod context;
pub mod delegation;
pub mod history;
pub mod interrupt;
pub mod session;

pub use agent::{Agent, AgentEvent, ResumeError, TurnOutcome};
pub use context::{AgentContext, ReviewMode, DEFAULT_MAX_ITERATIONS};
pub use delegation::{
    AskSubagentsTool, DelegationRequest, Delegator, FinishArgs, FinishTool,
    ASK_SUBAGENTS_TOOL_NAME, DEFAULT_SUBAGENT_MAX_TURNS, FINISH_TOOL_NAME,
};
pub use history::MessageHistory;
pub use interrupt::{
    Decision, InterruptError, InterruptRecord, InterruptRequest, InterruptState, InterruptStore,
    EXPIRED_REASON,
};
pub use session::Session;
