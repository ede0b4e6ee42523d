//! Sub-agent definitions and the report handed back to the parent
//!
//! - `spec`: named sub-agents with their prompt, tool set and turn limit
//! - `report`: success / warning / failure report embedding the task id

mod report;
mod spec;

pub use report::{DelegationReport, DelegationStatus};
pub use spec::{SubAgentRegistry, SubAgentSpec};
