//! Tool registry mapping tool names to their handlers

use std::collections::HashMap;
use std::sync::Arc;

use super::protocol::ToolDefinition;
use super::tools::{ToolArguments, ToolHandler};
use crate::types::{IqPilotError, Result};

/// Name → handler catalog
///
/// Built once at startup and read-only afterwards.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    /// Handlers by tool name
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
    /// Definitions in registration order
    definitions: Vec<ToolDefinition>,
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a full handler set
    pub fn from_handlers(handlers: Vec<Arc<dyn ToolHandler>>) -> Result<Self> {
        let mut registry = Self::new();
        for handler in handlers {
            registry.register(handler)?;
        }
        tracing::info!(tools = registry.len(), "Registered tools");
        Ok(registry)
    }

    /// Register every tool of a handler
    ///
    /// Fails without registering anything if any name is already taken.
    pub fn register(&mut self, handler: Arc<dyn ToolHandler>) -> Result<()> {
        let definitions = handler.tools();

        let mut seen = std::collections::HashSet::new();
        for def in &definitions {
            if self.handlers.contains_key(&def.name) || !seen.insert(def.name.as_str()) {
                return Err(IqPilotError::DuplicateTool(def.name.clone()));
            }
        }

        for def in definitions {
            tracing::debug!(tool = %def.name, "Registered tool");
            self.handlers.insert(def.name.clone(), Arc::clone(&handler));
            self.definitions.push(def);
        }
        Ok(())
    }

    /// Check if a tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Every tool definition, in registration order
    pub fn tools(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Execute a tool by name
    pub async fn execute_tool(&self, name: &str, arguments: ToolArguments) -> Result<String> {
        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| IqPilotError::ToolNotFound(name.to_string()))?;

        tracing::info!(tool = %name, "Executing tool");
        handler.execute(name, arguments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    #[derive(Debug)]
    struct EchoTools {
        names: Vec<&'static str>,
    }

    #[async_trait]
    impl ToolHandler for EchoTools {
        fn tools(&self) -> Vec<ToolDefinition> {
            self.names
                .iter()
                .map(|n| ToolDefinition::new(*n, "echo", json!({"type": "object"})))
                .collect()
        }

        async fn execute(&self, name: &str, arguments: ToolArguments) -> Result<String> {
            match arguments.get("fail") {
                Some(_) => Err(IqPilotError::internal("requested failure")),
                None => Ok(format!("{} ran", name)),
            }
        }
    }

    fn handler(names: &[&'static str]) -> Arc<dyn ToolHandler> {
        Arc::new(EchoTools {
            names: names.to_vec(),
        })
    }

    #[test]
    fn test_registry_new() {
        let registry = ToolRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_registration_order() {
        let registry =
            ToolRegistry::from_handlers(vec![handler(&["b/one", "b/two"]), handler(&["a/three"])])
                .unwrap();
        let names: Vec<_> = registry.tools().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["b/one", "b/two", "a/three"]);
        assert!(registry.contains("a/three"));
    }

    #[test]
    fn test_duplicate_across_handlers_fails() {
        let err = ToolRegistry::from_handlers(vec![handler(&["x/get"]), handler(&["x/get"])])
            .unwrap_err();
        assert!(matches!(err, IqPilotError::DuplicateTool(name) if name == "x/get"));
    }

    #[test]
    fn test_duplicate_within_handler_registers_nothing() {
        let mut registry = ToolRegistry::new();
        assert!(registry.register(handler(&["x/a", "x/a"])).is_err());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_execute_tool() {
        let registry = ToolRegistry::from_handlers(vec![handler(&["x/run"])]).unwrap();
        assert_eq!(
            registry.execute_tool("x/run", ToolArguments::new()).await.unwrap(),
            "x/run ran"
        );

        let err = registry
            .execute_tool("x/missing", ToolArguments::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Tool not found: x/missing");

        let mut args = ToolArguments::new();
        args.insert("fail".into(), json!(true));
        assert!(registry.execute_tool("x/run", args).await.is_err());
    }
}
