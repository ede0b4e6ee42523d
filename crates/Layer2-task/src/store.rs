//! Task store - last known state of every delegated sub-task
//!
//! Keyed by task id. A write replaces one key and leaves every other key
//! alone. With persistence on, the whole map is saved to `tasks.json`
//! after each write.

use crate::subagent::DelegationStatus;
use chrono::{DateTime, Utc};
use orca_foundation::{JsonStore, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// Persisted file name
pub const TASKS_FILE: &str = "tasks.json";

/// Where a delegated task stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    InProgress,
    Completed,
    Incomplete,
    Failed,
}

impl From<DelegationStatus> for TaskStatus {
    fn from(status: DelegationStatus) -> Self {
        match status {
            DelegationStatus::Completed => Self::Completed,
            DelegationStatus::Incomplete => Self::Incomplete,
            DelegationStatus::Failed => Self::Failed,
        }
    }
}

/// One delegated sub-task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub task_id: String,
    pub subagent: String,
    pub status: TaskStatus,
    /// Opaque execution snapshot; only the delegation layer knows its shape
    pub snapshot: Value,
    pub updated_at: DateTime<Utc>,
}

impl TaskRecord {
    /// Empty seed written when a task is first delegated
    pub fn seed(task_id: impl Into<String>, subagent: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            subagent: subagent.into(),
            status: TaskStatus::InProgress,
            snapshot: Value::Null,
            updated_at: Utc::now(),
        }
    }

    pub fn has_snapshot(&self) -> bool {
        !self.snapshot.is_null()
    }
}

/// task id -> record
pub struct TaskStore {
    records: Arc<RwLock<HashMap<String, TaskRecord>>>,
    persistence: Option<JsonStore>,
    /// Serializes saves so the file always reflects the latest map
    save_lock: Mutex<()>,
}

impl TaskStore {
    /// In-memory only
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            persistence: None,
            save_lock: Mutex::new(()),
        }
    }

    /// Backed by `tasks.json` in `store`; existing records are loaded
    pub fn persistent(store: JsonStore) -> Result<Self> {
        let records: HashMap<String, TaskRecord> =
            store.load_optional(TASKS_FILE)?.unwrap_or_default();
        info!(
            "Loaded {} task(s) from {}",
            records.len(),
            store.file_path(TASKS_FILE).display()
        );
        Ok(Self {
            records: Arc::new(RwLock::new(records)),
            persistence: Some(store),
            save_lock: Mutex::new(()),
        })
    }

    pub async fn get(&self, task_id: &str) -> Option<TaskRecord> {
        self.records.read().await.get(task_id).cloned()
    }

    pub async fn contains(&self, task_id: &str) -> bool {
        self.records.read().await.contains_key(task_id)
    }

    /// Replace the record under `record.task_id`; other keys are untouched
    pub async fn write(&self, mut record: TaskRecord) -> Result<()> {
        record.updated_at = Utc::now();
        let task_id = record.task_id.clone();
        self.records.write().await.insert(task_id.clone(), record);
        debug!("Task {} snapshot written", task_id);
        self.save().await
    }

    /// `preferred` when it is not taken yet, otherwise a fresh UUID
    pub async fn allocate_id(&self, preferred: Option<&str>) -> String {
        let records = self.records.read().await;
        match preferred {
            Some(id) if !id.is_empty() && !records.contains_key(id) => id.to_string(),
            _ => loop {
                let id = Uuid::new_v4().to_string();
                if !records.contains_key(&id) {
                    break id;
                }
            },
        }
    }

    /// Most recently updated first
    pub async fn list(&self) -> Vec<TaskRecord> {
        let mut records: Vec<_> = self.records.read().await.values().cloned().collect();
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        records
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    async fn save(&self) -> Result<()> {
        let Some(store) = &self.persistence else {
            return Ok(());
        };
        let _guard = self.save_lock.lock().await;
        let records = self.records.read().await.clone();
        store.save(TASKS_FILE, &records)
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}
