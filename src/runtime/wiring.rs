//! Component wiring
//!
//! Builds the shared store, coordinator, services and the tool registry for
//! one workspace.

use std::sync::Arc;

use crate::events::EventCoordinator;
use crate::mcp::ToolRegistry;
use crate::mcp::tools::{
    ContentTools, EventTools, MetadataTools, ToolContext, ToolHandler, ValidationTools,
    WorkflowTools,
};
use crate::metadata::MetadataStore;
use crate::services::{TemplateService, ValidationEngine};
use crate::settings::SharedSettings;
use crate::types::Result;

/// Long-lived components of a running server
#[derive(Debug, Clone)]
pub struct Components {
    pub settings: SharedSettings,
    pub store: Arc<MetadataStore>,
    pub coordinator: Arc<EventCoordinator>,
    pub engine: Arc<ValidationEngine>,
    pub templates: Arc<TemplateService>,
}

impl Components {
    pub fn new(settings: SharedSettings) -> Self {
        let store = Arc::new(MetadataStore::new());
        let coordinator = Arc::new(EventCoordinator::new(
            Arc::clone(&store),
            Arc::clone(&settings),
        ));
        let engine = Arc::new(ValidationEngine::new(
            Arc::clone(&store),
            Arc::clone(&settings),
        ));
        let templates = Arc::new(TemplateService::new(Arc::clone(&settings)));

        Self {
            settings,
            store,
            coordinator,
            engine,
            templates,
        }
    }

    /// Every tool handler, in registration order
    pub fn handlers(&self) -> Vec<Arc<dyn ToolHandler>> {
        let context = ToolContext::new(Arc::clone(&self.store), Arc::clone(&self.settings));
        vec![
            Arc::new(MetadataTools::new(context.clone())),
            Arc::new(ValidationTools::new(context.clone(), Arc::clone(&self.engine))),
            Arc::new(ContentTools::new(
                context.clone(),
                Arc::clone(&self.templates),
                Arc::clone(&self.engine),
            )),
            Arc::new(WorkflowTools::new(
                context.clone(),
                Arc::clone(&self.templates),
                Arc::clone(&self.engine),
            )),
            Arc::new(EventTools::new(context, Arc::clone(&self.coordinator))),
        ]
    }

    /// Build the tool registry
    ///
    /// Fails on duplicate tool names.
    pub fn registry(&self) -> Result<ToolRegistry> {
        ToolRegistry::from_handlers(self.handlers())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::McpServer;
    use crate::settings::{IqPilotConfig, SettingsManager};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use tempfile::TempDir;
    use tokio::sync::RwLock;

    fn components(root: &std::path::Path) -> Components {
        let settings = SettingsManager::from_config(root, IqPilotConfig::default());
        Components::new(Arc::new(RwLock::new(settings)))
    }

    #[test]
    fn test_full_catalog() {
        let dir = TempDir::new().unwrap();
        let registry = components(dir.path()).registry().unwrap();

        let names: Vec<_> = registry.tools().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "iqpilot/metadata/get",
                "iqpilot/metadata/update",
                "iqpilot/metadata/validate",
                "iqpilot/metadata/initialize",
                "iqpilot/validate/grammar",
                "iqpilot/validate/readability",
                "iqpilot/validate/structure",
                "iqpilot/validate/all",
                "iqpilot/content/create",
                "iqpilot/content/analyze_gaps",
                "iqpilot/content/find_related",
                "iqpilot/content/publish_ready",
                "iqpilot/content/list_templates",
                "iqpilot/workflow/article_creation",
                "iqpilot/workflow/review",
                "iqpilot/workflow/series_planning",
                "iqpilot/events/report",
            ]
        );
        assert!(
            registry
                .tools()
                .iter()
                .all(|t| t.input_schema["type"] == "object")
        );
    }

    #[tokio::test]
    async fn test_metadata_round_trip_through_server() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("doc.md"), "# Doc\n\nBody.\n").unwrap();
        let server = McpServer::new(Arc::new(components(dir.path()).registry().unwrap()));

        let call = |id: i64, name: &str, arguments: Value| {
            json!({"jsonrpc": "2.0", "id": id, "method": "tools/call",
                   "params": {"name": name, "arguments": arguments}})
            .to_string()
        };

        let frame = call(
            1,
            "iqpilot/metadata/update",
            json!({"filePath": "doc.md", "updates": {"article_metadata": {"filename": "x.md"}}}),
        );
        let response: Value =
            serde_json::from_str(&server.handle_message(&frame).await.unwrap()).unwrap();
        assert_eq!(response["result"]["isError"], false);

        let frame = call(2, "iqpilot/metadata/get", json!({"filePath": "doc.md"}));
        let response: Value =
            serde_json::from_str(&server.handle_message(&frame).await.unwrap()).unwrap();
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        let document: Value = serde_json::from_str(text).unwrap();
        assert_eq!(document["article_metadata"]["filename"], "x.md");
        assert!(document["article_metadata"]["last_updated"].is_string());

        let content = std::fs::read_to_string(dir.path().join("doc.md")).unwrap();
        assert!(content.starts_with("# Doc\n\nBody.\n\n<!-- \n---\n"));
    }
}
