//! Managed shell processes
//!
//! - `manager`: foreground and background runs, drain, kill
//! - `buffer`: bounded per-stream output buffers

mod buffer;
mod manager;

pub use buffer::OutputBuffer;
pub use manager::{
    DrainedOutput, ForegroundOutcome, ProcessManager, ProcessStatus, ProcessSummary,
    NO_NEW_OUTPUT,
};
