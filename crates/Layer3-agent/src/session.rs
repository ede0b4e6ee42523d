//! Conversation sessions

use crate::history::MessageHistory;
use chrono::{DateTime, Utc};
use orca_provider::ToolCall;
use std::collections::VecDeque;
use uuid::Uuid;

/// Continuation of a turn that stopped on a review
#[derive(Debug, Clone)]
pub(crate) struct PendingTurn {
    pub interrupt_id: String,
    pub call: ToolCall,
    /// Calls from the same assistant message not yet dispatched
    pub remaining: VecDeque<ToolCall>,
    /// Iterations already used by this turn
    pub iterations: usize,
}

/// A conversation session
#[derive(Debug, Clone)]
pub struct Session {
    /// Unique session ID
    pub id: String,

    pub history: MessageHistory,

    pub created_at: DateTime<Utc>,

    pending: Option<PendingTurn>,
}

impl Session {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self::with_history(id, MessageHistory::new())
    }

    pub fn with_history(id: impl Into<String>, history: MessageHistory) -> Self {
        Self {
            id: id.into(),
            history,
            created_at: Utc::now(),
            pending: None,
        }
    }

    /// Waiting on a reviewer
    pub fn is_suspended(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_interrupt(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.interrupt_id.as_str())
    }

    pub(crate) fn suspend(&mut self, turn: PendingTurn) {
        self.pending = Some(turn);
    }

    pub(crate) fn take_pending(&mut self, interrupt_id: &str) -> Option<PendingTurn> {
        if self.pending_interrupt() == Some(interrupt_id) {
            self.pending.take()
        } else {
            None
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
