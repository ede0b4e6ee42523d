use crate::storage::JsonStore;
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Config file name
pub const ORCA_CONFIG_FILE: &str = "config.json";

/// Orca settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrcaConfig {
    pub shell: ShellSettings,
    pub process: ProcessSettings,
    pub review: ReviewSettings,
    pub agent: AgentSettings,
    pub delegation: DelegationSettings,
    pub task_store: TaskStoreSettings,
}

impl OrcaConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Global then project, merged
    pub fn load(project_root: &Path) -> Result<Self> {
        let mut merged = Value::Object(Default::default());

        if let Ok(global) = JsonStore::global() {
            if let Some(value) = global.load_optional::<Value>(ORCA_CONFIG_FILE)? {
                merge_values(&mut merged, value);
            }
        }
        let project = JsonStore::project(project_root);
        if let Some(value) = project.load_optional::<Value>(ORCA_CONFIG_FILE)? {
            debug!("Applying project config from {}", project.base_dir().display());
            merge_values(&mut merged, value);
        }

        Ok(serde_json::from_value(merged)?)
    }

    pub fn save_project(&self, project_root: &Path) -> Result<()> {
        JsonStore::project(project_root).save(ORCA_CONFIG_FILE, self)
    }
}

/// Deep merge: objects merge per key, everything else is replaced
fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                merge_values(base.entry(key).or_insert(Value::Null), value);
            }
        }
        (base, overlay) => *base = overlay,
    }
}

// ============================================================================
// Sections
// ============================================================================

/// Shell used for `terminal` commands
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellSettings {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for ShellSettings {
    fn default() -> Self {
        #[cfg(target_os = "windows")]
        {
            Self {
                program: "cmd".to_string(),
                args: vec!["/C".to_string()],
            }
        }
        #[cfg(not(target_os = "windows"))]
        {
            Self {
                program: "/bin/bash".to_string(),
                args: vec!["-c".to_string()],
            }
        }
    }
}

/// How a drain filter treats lines that do not match
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Non-matching lines stay buffered for a later drain
    #[default]
    Retain,
    /// Non-matching lines are cleared with the rest of the buffer
    Discard,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessSettings {
    pub foreground_timeout_secs: u64,
    pub filter_mode: FilterMode,
}

impl ProcessSettings {
    pub fn foreground_timeout(&self) -> Duration {
        Duration::from_secs(self.foreground_timeout_secs)
    }
}

impl Default for ProcessSettings {
    fn default() -> Self {
        Self {
            foreground_timeout_secs: 120,
            filter_mode: FilterMode::Retain,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReviewSettings {
    /// Pending reviews older than this are rejected. `None` waits forever.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire_after_secs: Option<u64>,
}

impl ReviewSettings {
    pub fn expire_after(&self) -> Option<Duration> {
        self.expire_after_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentSettings {
    pub max_iterations: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self { max_iterations: 50 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DelegationSettings {
    /// Turn limit for a sub-agent without its own
    pub max_turns: usize,
    /// Extra sub-agents on top of the builtin ones
    pub subagents: Vec<SubAgentConfig>,
}

impl Default for DelegationSettings {
    fn default() -> Self {
        Self {
            max_turns: 30,
            subagents: Vec::new(),
        }
    }
}

/// A sub-agent defined in config
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubAgentConfig {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub system_prompt: String,
    /// Empty means every tool the parent may hand down
    #[serde(default)]
    pub allowed_tools: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_turns: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskStoreSettings {
    /// Save task snapshots to `.orca/tasks.json`
    pub persist: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = OrcaConfig::default();
        assert_eq!(config.process.foreground_timeout_secs, 120);
        assert_eq!(config.process.filter_mode, FilterMode::Retain);
        assert!(config.review.expire_after().is_none());
        assert_eq!(config.agent.max_iterations, 50);
        #[cfg(not(target_os = "windows"))]
        assert_eq!(config.shell.program, "/bin/bash");
    }

    #[test]
    fn test_partial_json() {
        let config: OrcaConfig = serde_json::from_value(json!({
            "process": { "filterMode": "discard" },
            "review": { "expireAfterSecs": 600 }
        }))
        .unwrap();

        assert_eq!(config.process.filter_mode, FilterMode::Discard);
        assert_eq!(config.process.foreground_timeout_secs, 120);
        assert_eq!(config.review.expire_after(), Some(Duration::from_secs(600)));
    }

    #[test]
    fn test_merge_values_overrides_per_key() {
        let mut base = json!({ "process": { "foregroundTimeoutSecs": 30, "filterMode": "discard" } });
        merge_values(&mut base, json!({ "process": { "foregroundTimeoutSecs": 5 } }));

        assert_eq!(base["process"]["foregroundTimeoutSecs"], 5);
        assert_eq!(base["process"]["filterMode"], "discard");
    }

    #[test]
    fn test_load_project_config() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::project(dir.path());
        store
            .save(
                ORCA_CONFIG_FILE,
                &json!({ "delegation": { "maxTurns": 7, "subagents": [{ "id": "reviewer" }] } }),
            )
            .unwrap();

        let config = OrcaConfig::load(dir.path()).unwrap();
        assert_eq!(config.delegation.max_turns, 7);
        assert_eq!(config.delegation.subagents[0].id, "reviewer");
    }
}
