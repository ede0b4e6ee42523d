//! Permission service for Orca
//!
//! Answers "may this tool action run now?" for the agent loop. An `Unknown`
//! status means the action needs a reviewer; the loop turns it into an
//! interrupt using the decision set from [`PermissionService::allowed_decisions`].

use super::decision::DecisionKind;
use super::settings::PermissionSettings;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::RwLock;

/// Types of permission actions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PermissionAction {
    /// Execute a shell command
    Execute { command: String },

    /// Write to a file
    FileWrite { path: String },
}

impl PermissionAction {
    /// Get a human-readable description
    pub fn description(&self) -> String {
        match self {
            Self::Execute { command } => format!("Execute: {}", command),
            Self::FileWrite { path } => format!("Write file: {}", path),
        }
    }
}

/// Permission check result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    /// Permission granted
    Granted,

    /// Permission denied (in deny list)
    Denied,

    /// Not decided yet - needs review
    Unknown,

    /// Auto-approved (tool or global auto-approve)
    AutoApproved,
}

/// Permission service managing grants and queries
pub struct PermissionService {
    /// Session grants as (tool, action), in memory only
    session_grants: RwLock<HashSet<(String, PermissionAction)>>,

    /// Persistent settings
    settings: RwLock<PermissionSettings>,
}

impl PermissionService {
    /// Create a new permission service with default settings
    pub fn new() -> Self {
        Self::with_settings(PermissionSettings::default())
    }

    /// Create with loaded settings
    pub fn with_settings(settings: PermissionSettings) -> Self {
        Self {
            session_grants: RwLock::new(HashSet::new()),
            settings: RwLock::new(settings),
        }
    }

    /// Load settings from storage (global + project merged)
    pub fn load(project_root: &Path) -> Result<Self> {
        let settings = PermissionSettings::load(project_root)?;
        Ok(Self::with_settings(settings))
    }

    /// Check permission status for an action
    pub fn check(&self, tool_name: &str, action: &PermissionAction) -> PermissionStatus {
        if let Ok(settings) = self.settings.read() {
            // deny list wins over everything else
            if settings.is_denied(tool_name, action) {
                return PermissionStatus::Denied;
            }
            if settings.is_auto_approved(tool_name) {
                return PermissionStatus::AutoApproved;
            }
            if settings.is_granted(tool_name, action) {
                return PermissionStatus::Granted;
            }
        }

        if let Ok(grants) = self.session_grants.read() {
            if grants.contains(&(tool_name.to_string(), action.clone())) {
                return PermissionStatus::Granted;
            }
        }

        PermissionStatus::Unknown
    }

    /// Decisions a reviewer may return for this tool's actions
    pub fn allowed_decisions(&self, tool_name: &str) -> HashSet<DecisionKind> {
        self.settings
            .read()
            .map(|s| s.allowed_decisions(tool_name))
            .unwrap_or_else(|_| DecisionKind::all())
    }

    /// Let `action` run without review until the process exits
    pub fn grant_session(&self, tool_name: &str, action: PermissionAction) {
        if let Ok(mut grants) = self.session_grants.write() {
            grants.insert((tool_name.to_string(), action));
        }
    }
}

impl Default for PermissionService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::PermissionDeny;
    use std::collections::HashMap;

    #[test]
    fn test_unknown_until_granted() {
        let service = PermissionService::new();
        let action = PermissionAction::Execute {
            command: "ls".to_string(),
        };

        assert_eq!(service.check("terminal", &action), PermissionStatus::Unknown);
        service.grant_session("terminal", action.clone());
        assert_eq!(service.check("terminal", &action), PermissionStatus::Granted);

        // grants are per tool and per exact action
        let other = PermissionAction::Execute {
            command: "ls -la".to_string(),
        };
        assert_eq!(service.check("terminal", &other), PermissionStatus::Unknown);
    }

    #[test]
    fn test_deny_beats_auto_approve() {
        let mut settings = PermissionSettings {
            auto_approve: true,
            ..Default::default()
        };
        settings.add_deny(PermissionDeny {
            tool: "terminal".to_string(),
            pattern: "rm -rf /**".to_string(),
            reason: None,
        });
        let service = PermissionService::with_settings(settings);

        let rm = PermissionAction::Execute {
            command: "rm -rf /".to_string(),
        };
        let ls = PermissionAction::Execute {
            command: "ls".to_string(),
        };
        assert_eq!(service.check("terminal", &rm), PermissionStatus::Denied);
        assert_eq!(service.check("terminal", &ls), PermissionStatus::AutoApproved);
    }

    #[test]
    fn test_allowed_decisions_per_tool() {
        let mut decisions = HashMap::new();
        decisions.insert(
            "terminal".to_string(),
            [DecisionKind::Approve, DecisionKind::Reject].into_iter().collect(),
        );
        let service = PermissionService::with_settings(PermissionSettings {
            decisions,
            ..Default::default()
        });

        assert!(!service.allowed_decisions("terminal").contains(&DecisionKind::Edit));
        assert_eq!(service.allowed_decisions("write_file"), DecisionKind::all());
    }
}
