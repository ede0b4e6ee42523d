//! `permissions.json` - grants, denies and review decision sets
//!
//! Loaded from the global config dir first, then the project's `.orca/`;
//! the two are merged.

use super::decision::DecisionKind;
use super::service::PermissionAction;
use crate::storage::JsonStore;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Settings file name
pub const PERMISSIONS_FILE: &str = "permissions.json";

/// Permission settings file layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionSettings {
    /// Permanently granted actions
    #[serde(default)]
    pub grants: HashSet<PermissionGrant>,

    /// Patterns that are always refused
    #[serde(default)]
    pub denies: HashSet<PermissionDeny>,

    /// Approve everything not denied
    #[serde(default)]
    pub auto_approve: bool,

    /// Tools approved without review
    #[serde(default)]
    pub auto_approve_tools: HashSet<String>,

    /// Per-tool decisions a reviewer may give. Tools not listed get all three.
    #[serde(default)]
    pub decisions: HashMap<String, HashSet<DecisionKind>>,
}

/// Stored grant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct PermissionGrant {
    /// Tool name (e.g. "terminal", "write_file")
    pub tool: String,

    pub action_type: PermissionActionType,

    /// Pattern, e.g. "/home/user/project/**"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

/// Deny pattern
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct PermissionDeny {
    pub tool: String,

    pub pattern: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Action type without its payload, for storage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PermissionActionType {
    Execute,
    FileWrite,
}

impl From<&PermissionAction> for PermissionActionType {
    fn from(action: &PermissionAction) -> Self {
        match action {
            PermissionAction::Execute { .. } => Self::Execute,
            PermissionAction::FileWrite { .. } => Self::FileWrite,
        }
    }
}

impl PermissionSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Global + project merged
    pub fn load(project_root: &Path) -> Result<Self> {
        let mut settings: Self = JsonStore::global()
            .map(|store| store.load_or_default(PERMISSIONS_FILE))
            .unwrap_or_default();
        let project = JsonStore::project(project_root);
        if let Some(project) = project.load_optional::<Self>(PERMISSIONS_FILE)? {
            settings.merge(project);
        }
        Ok(settings)
    }

    /// Save into the project's `.orca/`
    pub fn save_project(&self, project_root: &Path) -> Result<()> {
        JsonStore::project(project_root).save(PERMISSIONS_FILE, self)
    }

    pub fn add_grant(&mut self, grant: PermissionGrant) {
        self.grants.insert(grant);
    }

    pub fn add_deny(&mut self, deny: PermissionDeny) {
        self.denies.insert(deny);
    }

    pub fn is_granted(&self, tool: &str, action: &PermissionAction) -> bool {
        let action_type = PermissionActionType::from(action);
        let value = Self::extract_pattern(action);

        self.grants
            .iter()
            .filter(|g| g.tool == tool && g.action_type == action_type)
            .any(|g| match &g.pattern {
                Some(pattern) => Self::pattern_matches(pattern, &value),
                None => true,
            })
    }

    pub fn is_denied(&self, tool: &str, action: &PermissionAction) -> bool {
        let value = Self::extract_pattern(action);
        self.denies
            .iter()
            .any(|d| d.tool == tool && Self::pattern_matches(&d.pattern, &value))
    }

    pub fn is_auto_approved(&self, tool: &str) -> bool {
        self.auto_approve || self.auto_approve_tools.contains(tool)
    }

    /// Decisions a reviewer may give for `tool`
    pub fn allowed_decisions(&self, tool: &str) -> HashSet<DecisionKind> {
        match self.decisions.get(tool) {
            Some(set) if !set.is_empty() => set.clone(),
            _ => DecisionKind::all(),
        }
    }

    /// Merge `other` on top of `self`
    pub fn merge(&mut self, other: PermissionSettings) {
        self.grants.extend(other.grants);
        self.denies.extend(other.denies);
        self.auto_approve = self.auto_approve || other.auto_approve;
        self.auto_approve_tools.extend(other.auto_approve_tools);
        self.decisions.extend(other.decisions);
    }

    fn extract_pattern(action: &PermissionAction) -> String {
        match action {
            PermissionAction::Execute { command } => command.clone(),
            PermissionAction::FileWrite { path } => path.clone(),
        }
    }

    fn pattern_matches(pattern: &str, value: &str) -> bool {
        if pattern == "**" || pattern == "*" {
            return true;
        }
        if let Some(prefix) = pattern.strip_suffix("/**") {
            return value.starts_with(prefix);
        }
        if let Some(prefix) = pattern.strip_suffix("/*") {
            let rest = value[prefix.len()..].trim_start_matches('/');
            return value.starts_with(prefix) && !rest.contains('/');
        }
        match glob::Pattern::new(pattern) {
            Ok(glob) => glob.matches(value),
            Err(_) => pattern == value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_pattern() {
        let mut settings = PermissionSettings::new();
        settings.add_grant(PermissionGrant {
            tool: "write_file".to_string(),
            action_type: PermissionActionType::FileWrite,
            pattern: Some("/home/user/project/**".to_string()),
        });

        assert!(settings.is_granted(
            "write_file",
            &PermissionAction::FileWrite {
                path: "/home/user/project/src/main.rs".to_string()
            }
        ));
        assert!(!settings.is_granted(
            "write_file",
            &PermissionAction::FileWrite {
                path: "/etc/passwd".to_string()
            }
        ));
    }

    #[test]
    fn test_glob_command_grant() {
        let mut settings = PermissionSettings::new();
        settings.add_grant(PermissionGrant {
            tool: "terminal".to_string(),
            action_type: PermissionActionType::Execute,
            pattern: Some("cargo *".to_string()),
        });

        let allowed = PermissionAction::Execute {
            command: "cargo test".to_string(),
        };
        let other = PermissionAction::Execute {
            command: "curl example.com".to_string(),
        };
        assert!(settings.is_granted("terminal", &allowed));
        assert!(!settings.is_granted("terminal", &other));
    }

    #[test]
    fn test_deny() {
        let mut settings = PermissionSettings::new();
        settings.add_deny(PermissionDeny {
            tool: "terminal".to_string(),
            pattern: "rm -rf /**".to_string(),
            reason: Some("Dangerous command".to_string()),
        });

        assert!(settings.is_denied(
            "terminal",
            &PermissionAction::Execute {
                command: "rm -rf /".to_string()
            }
        ));
    }

    #[test]
    fn test_parse_decisions() {
        let json = r#"{
            "autoApproveTools": ["read_file"],
            "decisions": { "terminal": ["approve", "reject"] }
        }"#;
        let settings: PermissionSettings = serde_json::from_str(json).unwrap();

        assert!(settings.is_auto_approved("read_file"));
        let terminal = settings.allowed_decisions("terminal");
        assert_eq!(terminal.len(), 2);
        assert!(!terminal.contains(&DecisionKind::Edit));
    }

    #[test]
    fn test_load_merges_project() {
        let dir = tempfile::tempdir().unwrap();
        let project = PermissionSettings {
            auto_approve_tools: ["terminal".to_string()].into_iter().collect(),
            ..Default::default()
        };
        project.save_project(dir.path()).unwrap();

        let loaded = PermissionSettings::load(dir.path()).unwrap();
        assert!(loaded.is_auto_approved("terminal"));
    }
}
