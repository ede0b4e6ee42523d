//! Tool Registry - name -> handler
//!
//! The agent loop resolves every tool call by name here. A sub-agent gets a
//! narrowed copy holding only the tools it is allowed.

use super::builtin;
use orca_foundation::Tool;
use orca_provider::ToolDef;
use orca_task::ProcessManager;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every builtin tool
    pub fn with_builtins(processes: Arc<ProcessManager>) -> Self {
        let mut registry = Self::new();
        registry.register_all(builtin::all_tools(processes));
        registry
    }

    /// Register, replacing any tool with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            debug!("Replaced tool {}", name);
        }
    }

    pub fn register_all(&mut self, tools: Vec<Arc<dyn Tool>>) {
        for tool in tools {
            self.register(tool);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.remove(name)
    }

    /// Sorted names
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Copy holding only the tools `keep` accepts
    pub fn narrowed(&self, keep: impl Fn(&str) -> bool) -> Self {
        Self {
            tools: self
                .tools
                .iter()
                .filter(|(name, _)| keep(name))
                .map(|(name, tool)| (name.clone(), Arc::clone(tool)))
                .collect(),
        }
    }

    /// Definitions sent to the model
    pub fn definitions(&self) -> Vec<ToolDef> {
        self.tools
            .values()
            .map(|tool| ToolDef::new(tool.name(), tool.meta().description, tool.schema()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builtins() -> ToolRegistry {
        ToolRegistry::with_builtins(Arc::new(ProcessManager::default()))
    }

    #[test]
    fn test_builtins_registered() {
        let registry = builtins();
        assert_eq!(registry.names(), vec!["read_file", "terminal", "write_file"]);
        assert!(registry.get("terminal").is_some());
        assert!(registry.get("bash").is_none());
    }

    #[test]
    fn test_definitions_are_object_schemas() {
        for def in builtins().definitions() {
            assert_eq!(def.parameters["type"], "object", "{}", def.name);
            assert!(def.parameters.get("properties").is_some(), "{}", def.name);
            assert!(!def.description.is_empty(), "{}", def.name);
        }
    }

    #[test]
    fn test_narrowed() {
        let registry = builtins();
        let narrowed = registry.narrowed(|name| name == "read_file");
        assert_eq!(narrowed.names(), vec!["read_file"]);
        assert_eq!(registry.len(), 3);
    }
}
