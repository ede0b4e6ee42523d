//! Interrupts - gated tool actions waiting on a reviewer
//!
//! A suspended action lives here until exactly one decision resolves it.
//! Resolved ids are kept as tombstones so a second decision for the same
//! id is told apart from an id that never existed.

use chrono::{DateTime, Duration, Utc};
use orca_foundation::DecisionKind;
use orca_provider::ToolCall;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

/// Reason attached to interrupts rejected by expiry
pub const EXPIRED_REASON: &str = "review expired";

/// A reviewer's answer to a suspended action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Decision {
    /// Run the action as proposed
    Approve,
    /// Don't run it; the reason goes back to the model
    Reject { reason: String },
    /// Run it with replacement arguments
    Edit { arguments: Value },
}

impl Decision {
    pub fn reject(reason: impl Into<String>) -> Self {
        Self::Reject {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> DecisionKind {
        match self {
            Self::Approve => DecisionKind::Approve,
            Self::Reject { .. } => DecisionKind::Reject,
            Self::Edit { .. } => DecisionKind::Edit,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum InterruptError {
    #[error("No pending review with id {0}")]
    NotFound(String),

    #[error("Review {0} was already resolved")]
    AlreadyResolved(String),

    #[error("Decision '{decision}' is not allowed here (allowed: {allowed})")]
    DecisionNotAllowed { decision: DecisionKind, allowed: String },

    #[error("Review {0} belongs to another session")]
    SessionMismatch(String),
}

/// What the caller sees when a turn suspends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterruptRequest {
    pub id: String,
    pub session_id: String,
    pub tool_name: String,
    pub arguments: Value,
    pub description: String,
    /// Ordered approve, reject, edit
    pub allowed_decisions: Vec<DecisionKind>,
    pub created_at: DateTime<Utc>,
}

impl InterruptRequest {
    pub fn allows(&self, kind: DecisionKind) -> bool {
        self.allowed_decisions.contains(&kind)
    }
}

/// Stored interrupt
#[derive(Debug, Clone)]
pub struct InterruptRecord {
    pub id: String,
    pub session_id: String,
    pub call: ToolCall,
    pub description: String,
    pub allowed: HashSet<DecisionKind>,
    pub created_at: DateTime<Utc>,
}

impl InterruptRecord {
    pub fn new(
        session_id: impl Into<String>,
        call: ToolCall,
        description: impl Into<String>,
        allowed: HashSet<DecisionKind>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.into(),
            call,
            description: description.into(),
            allowed,
            created_at: Utc::now(),
        }
    }

    pub fn request(&self) -> InterruptRequest {
        let allowed_decisions = [DecisionKind::Approve, DecisionKind::Reject, DecisionKind::Edit]
            .into_iter()
            .filter(|kind| self.allowed.contains(kind))
            .collect();

        InterruptRequest {
            id: self.id.clone(),
            session_id: self.session_id.clone(),
            tool_name: self.call.name.clone(),
            arguments: self.call.arguments.clone(),
            description: self.description.clone(),
            allowed_decisions,
            created_at: self.created_at,
        }
    }

    fn allowed_list(&self) -> String {
        self.request()
            .allowed_decisions
            .iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Where an interrupt id stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptState {
    Pending,
    Resolved(DecisionKind),
}

#[derive(Default)]
struct Inner {
    pending: HashMap<String, InterruptRecord>,
    resolved: HashMap<String, DecisionKind>,
}

/// Table of suspended actions
#[derive(Default)]
pub struct InterruptStore {
    inner: Mutex<Inner>,
}

impl InterruptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new suspended action
    pub fn suspend(&self, record: InterruptRecord) -> InterruptRequest {
        let request = record.request();
        info!(
            "Suspended {} ({}) for review as {}",
            record.call.name, record.description, record.id
        );
        self.inner.lock().pending.insert(record.id.clone(), record);
        request
    }

    pub fn state(&self, id: &str) -> Option<InterruptState> {
        let inner = self.inner.lock();
        if inner.pending.contains_key(id) {
            return Some(InterruptState::Pending);
        }
        inner.resolved.get(id).map(|kind| InterruptState::Resolved(*kind))
    }

    pub fn get(&self, id: &str) -> Option<InterruptRecord> {
        self.inner.lock().pending.get(id).cloned()
    }

    /// Consume the interrupt with `decision`
    ///
    /// A decision outside the record's allowed set is refused and the record
    /// stays pending.
    pub fn resolve(
        &self,
        id: &str,
        decision: &Decision,
    ) -> Result<InterruptRecord, InterruptError> {
        let mut inner = self.inner.lock();

        let Some(record) = inner.pending.get(id) else {
            return Err(if inner.resolved.contains_key(id) {
                InterruptError::AlreadyResolved(id.to_string())
            } else {
                InterruptError::NotFound(id.to_string())
            });
        };

        let kind = decision.kind();
        if !record.allowed.contains(&kind) {
            return Err(InterruptError::DecisionNotAllowed {
                decision: kind,
                allowed: record.allowed_list(),
            });
        }

        let record = Self::take(&mut inner, id, kind)?;
        debug!("Resolved review {} with {}", id, kind);
        Ok(record)
    }

    /// Consume the interrupt as rejected, regardless of its allowed set
    pub fn expire(&self, id: &str) -> Result<InterruptRecord, InterruptError> {
        let mut inner = self.inner.lock();
        let record = Self::take(&mut inner, id, DecisionKind::Reject)?;
        info!("Review {} expired", id);
        Ok(record)
    }

    fn take(
        inner: &mut Inner,
        id: &str,
        kind: DecisionKind,
    ) -> Result<InterruptRecord, InterruptError> {
        match inner.pending.remove(id) {
            Some(record) => {
                inner.resolved.insert(id.to_string(), kind);
                Ok(record)
            }
            None if inner.resolved.contains_key(id) => {
                Err(InterruptError::AlreadyResolved(id.to_string()))
            }
            None => Err(InterruptError::NotFound(id.to_string())),
        }
    }

    /// Pending interrupts, oldest first
    pub fn pending(&self) -> Vec<InterruptRequest> {
        let mut pending: Vec<_> = self
            .inner
            .lock()
            .pending
            .values()
            .map(InterruptRecord::request)
            .collect();
        pending.sort_by_key(|r| r.created_at);
        pending
    }

    /// Ids of pending interrupts created at or before `now - max_age`
    pub fn expired_ids(&self, now: DateTime<Utc>, max_age: Duration) -> Vec<String> {
        self.inner
            .lock()
            .pending
            .values()
            .filter(|r| r.created_at + max_age <= now)
            .map(|r| r.id.clone())
            .collect()
    }
}
