//! Base tool handler trait definition

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::mcp::protocol::ToolDefinition;
use crate::metadata::MetadataStore;
use crate::settings::SharedSettings;
use crate::types::{IqPilotError, Result};

/// Tool arguments as received in `tools/call`
pub type ToolArguments = Map<String, Value>;

/// A group of related tools
///
/// Each handler reports the tools it owns and executes them by name. Results
/// are plain text; failures are returned as errors and turned into
/// `isError` results by the protocol server.
#[async_trait]
pub trait ToolHandler: Send + Sync + std::fmt::Debug {
    /// Definitions of every tool this handler owns
    fn tools(&self) -> Vec<ToolDefinition>;

    /// Execute one of this handler's tools
    async fn execute(&self, name: &str, arguments: ToolArguments) -> Result<String>;
}

/// State shared by tool handlers
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub store: Arc<MetadataStore>,
    pub settings: SharedSettings,
}

impl ToolContext {
    pub fn new(store: Arc<MetadataStore>, settings: SharedSettings) -> Self {
        Self { store, settings }
    }

    /// Resolve a tool-supplied path against the workspace root
    pub async fn resolve_path(&self, path: &str) -> PathBuf {
        self.settings.read().await.resolve(path)
    }

    pub async fn workspace_root(&self) -> PathBuf {
        self.settings.read().await.workspace_root().to_path_buf()
    }

    /// Configured site author, empty when unset
    pub async fn site_author(&self) -> String {
        self.settings
            .read()
            .await
            .config()
            .site
            .author
            .clone()
            .unwrap_or_default()
    }
}

/// Deserialize tool arguments into a typed input struct
pub fn parse_args<T: DeserializeOwned>(tool: &str, arguments: ToolArguments) -> Result<T> {
    serde_json::from_value(Value::Object(arguments))
        .map_err(|e| IqPilotError::invalid_params(format!("{}: {}", tool, e)))
}

/// Object schema with the given properties and required keys
pub fn object_schema(properties: Value, required: &[&str]) -> Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Schema fragment for a path argument
pub fn file_path_property() -> Value {
    serde_json::json!({
        "type": "string",
        "description": "Path to the article file, absolute or relative to the workspace root"
    })
}

/// File name for display in tool output
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Input {
        file_path: String,
        #[serde(default)]
        title: Option<String>,
    }

    fn args(value: Value) -> ToolArguments {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_parse_args() {
        let input: Input = parse_args("t", args(json!({"filePath": "a.md"}))).unwrap();
        assert_eq!(input.file_path, "a.md");
        assert!(input.title.is_none());

        let err = parse_args::<Input>("iqpilot/x", args(json!({"title": "T"}))).unwrap_err();
        assert!(matches!(err, IqPilotError::InvalidParams(_)));
        assert!(err.to_string().contains("iqpilot/x"));
        assert!(err.to_string().contains("filePath"));
    }

    #[test]
    fn test_object_schema() {
        let schema = object_schema(json!({"filePath": file_path_property()}), &["filePath"]);
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["filePath"]));
    }

    #[tokio::test]
    async fn test_site_author_defaults_to_empty() {
        use crate::settings::{IqPilotConfig, SettingsManager};
        use tokio::sync::RwLock;

        let root = std::env::temp_dir();
        let context = |config: IqPilotConfig| {
            ToolContext::new(
                Arc::new(MetadataStore::new()),
                Arc::new(RwLock::new(SettingsManager::from_config(&root, config))),
            )
        };

        assert_eq!(context(IqPilotConfig::default()).site_author().await, "");

        let mut config = IqPilotConfig::default();
        config.site.author = Some("Docs Team".to_string());
        assert_eq!(context(config).site_author().await, "Docs Team");
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name(Path::new("/docs/guide/intro.md")), "intro.md");
    }
}
