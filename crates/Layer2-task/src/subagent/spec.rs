use orca_foundation::SubAgentConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named sub-agent a parent may delegate to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubAgentSpec {
    pub id: String,
    pub description: String,
    pub system_prompt: String,
    /// Tools handed down from the parent. Empty means all of them.
    pub allowed_tools: Vec<String>,
    pub max_turns: Option<usize>,
}

impl SubAgentSpec {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            system_prompt: String::new(),
            allowed_tools: Vec::new(),
            max_turns: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn allowed_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn max_turns(mut self, turns: usize) -> Self {
        self.max_turns = Some(turns);
        self
    }

    pub fn allows(&self, tool: &str) -> bool {
        self.allowed_tools.is_empty() || self.allowed_tools.iter().any(|t| t == tool)
    }

    /// General purpose with every tool the parent can hand down
    pub fn general() -> Self {
        Self::new("general")
            .description("General purpose agent for multi-step tasks")
            .system_prompt(
                "You are a sub-agent working on one delegated task. Use the tools you have, \
                 then call `finish` with the result and a one-line summary.",
            )
    }

    /// Read-only codebase exploration
    pub fn explore() -> Self {
        Self::new("explore")
            .description("Read-only exploration of the codebase")
            .system_prompt(
                "You are a read-only exploration sub-agent. Read files and report what you find. \
                 Do not modify anything. Call `finish` with your findings when done.",
            )
            .allowed_tools(["read_file"])
    }
}

impl From<SubAgentConfig> for SubAgentSpec {
    fn from(config: SubAgentConfig) -> Self {
        Self {
            id: config.id,
            description: config.description,
            system_prompt: config.system_prompt,
            allowed_tools: config.allowed_tools,
            max_turns: config.max_turns,
        }
    }
}

/// Sub-agents by id
#[derive(Debug, Clone, Default)]
pub struct SubAgentRegistry {
    specs: BTreeMap<String, SubAgentSpec>,
}

impl SubAgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `general` and `explore`
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(SubAgentSpec::general());
        registry.register(SubAgentSpec::explore());
        registry
    }

    /// Builtins plus configured sub-agents; config entries replace builtins with the same id
    pub fn from_config(configs: &[SubAgentConfig]) -> Self {
        let mut registry = Self::with_builtins();
        for config in configs {
            registry.register(config.clone().into());
        }
        registry
    }

    pub fn register(&mut self, spec: SubAgentSpec) {
        self.specs.insert(spec.id.clone(), spec);
    }

    pub fn get(&self, id: &str) -> Option<&SubAgentSpec> {
        self.specs.get(id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.specs.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SubAgentSpec> {
        self.specs.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins() {
        let registry = SubAgentRegistry::with_builtins();
        assert_eq!(registry.ids(), vec!["explore", "general"]);

        let explore = registry.get("explore").unwrap();
        assert!(explore.allows("read_file"));
        assert!(!explore.allows("write_file"));
        assert!(registry.get("general").unwrap().allows("terminal"));
    }

    #[test]
    fn test_config_overrides_builtin() {
        let registry = SubAgentRegistry::from_config(&[SubAgentConfig {
            id: "explore".into(),
            description: "custom".into(),
            system_prompt: String::new(),
            allowed_tools: vec!["read_file".into(), "terminal".into()],
            max_turns: Some(3),
        }]);

        let explore = registry.get("explore").unwrap();
        assert_eq!(explore.description, "custom");
        assert!(explore.allows("terminal"));
        assert_eq!(explore.max_turns, Some(3));
    }
}
