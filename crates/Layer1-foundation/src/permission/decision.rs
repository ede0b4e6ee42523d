use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Kind of decision a reviewer may supply for a suspended action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    Approve,
    Reject,
    Edit,
}

impl DecisionKind {
    /// The full decision set
    pub fn all() -> HashSet<DecisionKind> {
        [Self::Approve, Self::Reject, Self::Edit].into_iter().collect()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Edit => "edit",
        }
    }
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
