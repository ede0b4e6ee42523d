use serde::{Deserialize, Serialize};
use std::fmt;

/// How a delegated sub-task ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelegationStatus {
    /// The sub-agent called `finish`
    Completed,
    /// The sub-agent stopped without calling `finish`
    Incomplete,
    /// The sub-execution raised
    Failed,
}

impl DelegationStatus {
    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Completed => "✅",
            Self::Incomplete => "⚠️",
            Self::Failed => "❌",
        }
    }

    pub fn text(&self) -> &'static str {
        match self {
            Self::Completed => "Task completed",
            Self::Incomplete => "Task not properly completed",
            Self::Failed => "Task failed",
        }
    }
}

/// Report handed back to the parent agent as the `ask_subagents` result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationReport {
    pub status: DelegationStatus,
    pub summary: Option<String>,
    pub result: String,
    pub task_id: String,
}

impl DelegationReport {
    pub fn completed(
        task_id: impl Into<String>,
        result: impl Into<String>,
        summary: Option<String>,
    ) -> Self {
        Self {
            status: DelegationStatus::Completed,
            summary,
            result: result.into(),
            task_id: task_id.into(),
        }
    }

    pub fn incomplete(task_id: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            status: DelegationStatus::Incomplete,
            summary: Some(
                "The sub-agent stopped without calling finish; its last output follows.".to_string(),
            ),
            result: result.into(),
            task_id: task_id.into(),
        }
    }

    pub fn failed(task_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            status: DelegationStatus::Failed,
            summary: None,
            result: error.into(),
            task_id: task_id.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == DelegationStatus::Completed
    }
}

impl fmt::Display for DelegationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## {} {}", self.status.emoji(), self.status.text())?;
        if let Some(summary) = &self.summary {
            writeln!(f, "**Summary**: {}", summary)?;
        }
        writeln!(f)?;
        if !self.result.is_empty() {
            writeln!(f, "{}", self.result.trim_end())?;
        }
        writeln!(f, "---")?;
        write!(f, "task_id: {}", self.task_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed_layout() {
        let report =
            DelegationReport::completed("call_1", "Found 3 TODOs", Some("scan done".into()));
        assert_eq!(
            report.to_string(),
            "## ✅ Task completed\n**Summary**: scan done\n\nFound 3 TODOs\n---\ntask_id: call_1"
        );
    }

    #[test]
    fn test_failed_keeps_error() {
        let report = DelegationReport::failed("t-9", "provider unavailable");
        let text = report.to_string();
        assert!(text.starts_with("## ❌ Task failed\n"));
        assert!(text.contains("provider unavailable"));
        assert!(text.ends_with("task_id: t-9"));
    }

    #[test]
    fn test_incomplete_is_warning() {
        let report = DelegationReport::incomplete("t-1", "I looked around.");
        assert!(!report.is_success());
        assert!(report.to_string().contains("⚠️ Task not properly completed"));
        assert!(report.to_string().contains("I looked around."));
    }
}
