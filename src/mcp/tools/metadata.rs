//! Metadata tools
//!
//! Read, update, validate and initialize the metadata block of an article.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::base::{
    ToolArguments, ToolContext, ToolHandler, display_name, file_path_property, object_schema,
    parse_args,
};
use crate::mcp::protocol::ToolDefinition;
use crate::metadata::MetaMap;
use crate::types::{IqPilotError, Result};

pub const METADATA_GET: &str = "iqpilot/metadata/get";
pub const METADATA_UPDATE: &str = "iqpilot/metadata/update";
pub const METADATA_VALIDATE: &str = "iqpilot/metadata/validate";
pub const METADATA_INITIALIZE: &str = "iqpilot/metadata/initialize";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileInput {
    file_path: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateInput {
    file_path: String,
    updates: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitializeInput {
    file_path: String,
    title: String,
    /// Falls back to the configured site author
    #[serde(default)]
    author: Option<String>,
}

/// Metadata tool handler
#[derive(Debug, Clone)]
pub struct MetadataTools {
    context: ToolContext,
}

impl MetadataTools {
    pub fn new(context: ToolContext) -> Self {
        Self { context }
    }

    async fn get(&self, input: FileInput) -> Result<String> {
        let path = self.context.resolve_path(&input.file_path).await;
        let document = self.context.store.get_metadata(&path).await?;
        Ok(serde_json::to_string_pretty(&document.to_json())?)
    }

    async fn update(&self, input: UpdateInput) -> Result<String> {
        let path = self.context.resolve_path(&input.file_path).await;
        let updates: MetaMap = input.updates.into_iter().collect();
        self.context.store.update_metadata(&path, updates).await?;
        Ok(format!("✓ Metadata updated successfully in {}", display_name(&path)))
    }

    async fn validate(&self, input: FileInput) -> Result<String> {
        let path = self.context.resolve_path(&input.file_path).await;
        let validation = self.context.store.validate_metadata(&path).await;
        if validation.is_valid {
            return Ok(format!("✓ Metadata structure is valid in {}", display_name(&path)));
        }

        let report = json!({
            "valid": false,
            "errors": validation.errors,
            "message": format!("✗ Metadata structure is invalid in {}", display_name(&path)),
        });
        Ok(serde_json::to_string_pretty(&report)?)
    }

    async fn initialize(&self, input: InitializeInput) -> Result<String> {
        let path = self.context.resolve_path(&input.file_path).await;
        let author = match input.author {
            Some(author) => author,
            None => self.context.site_author().await,
        };
        self.context
            .store
            .initialize_metadata(&path, &input.title, &author)
            .await?;
        Ok(format!("✓ Metadata initialized in {}", display_name(&path)))
    }
}

#[async_trait]
impl ToolHandler for MetadataTools {
    fn tools(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                METADATA_GET,
                "Get metadata from an article file",
                object_schema(json!({"filePath": file_path_property()}), &["filePath"]),
            ),
            ToolDefinition::new(
                METADATA_UPDATE,
                "Update metadata sections in an article. Each top-level key replaces its section.",
                object_schema(
                    json!({
                        "filePath": file_path_property(),
                        "updates": {
                            "type": "object",
                            "description": "Metadata sections to replace, keyed by section name"
                        }
                    }),
                    &["filePath", "updates"],
                ),
            ),
            ToolDefinition::new(
                METADATA_VALIDATE,
                "Validate metadata structure in an article",
                object_schema(json!({"filePath": file_path_property()}), &["filePath"]),
            ),
            ToolDefinition::new(
                METADATA_INITIALIZE,
                "Write a complete default metadata block to an article",
                object_schema(
                    json!({
                        "filePath": file_path_property(),
                        "title": {"type": "string", "description": "Article title"},
                        "author": {"type": "string", "description": "Author name (defaults to the site author)"}
                    }),
                    &["filePath", "title"],
                ),
            ),
        ]
    }

    async fn execute(&self, name: &str, arguments: ToolArguments) -> Result<String> {
        match name {
            METADATA_GET => self.get(parse_args(name, arguments)?).await,
            METADATA_UPDATE => self.update(parse_args(name, arguments)?).await,
            METADATA_VALIDATE => self.validate(parse_args(name, arguments)?).await,
            METADATA_INITIALIZE => self.initialize(parse_args(name, arguments)?).await,
            other => Err(IqPilotError::UnknownTool(other.to_string())),
        }
    }
}
