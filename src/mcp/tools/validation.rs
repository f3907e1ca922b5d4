//! Content validation tools

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::base::{ToolArguments, ToolContext, ToolHandler, file_path_property, object_schema, parse_args};
use crate::mcp::protocol::ToolDefinition;
use crate::services::{ValidationEngine, read_content};
use crate::types::{IqPilotError, Result};

pub const VALIDATE_GRAMMAR: &str = "iqpilot/validate/grammar";
pub const VALIDATE_READABILITY: &str = "iqpilot/validate/readability";
pub const VALIDATE_STRUCTURE: &str = "iqpilot/validate/structure";
pub const VALIDATE_ALL: &str = "iqpilot/validate/all";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidateInput {
    file_path: String,
    /// Checked instead of the file content when present
    #[serde(default)]
    content: Option<String>,
}

/// Validation tool handler
#[derive(Debug, Clone)]
pub struct ValidationTools {
    context: ToolContext,
    engine: Arc<ValidationEngine>,
}

impl ValidationTools {
    pub fn new(context: ToolContext, engine: Arc<ValidationEngine>) -> Self {
        Self { context, engine }
    }

    async fn run(&self, name: &str, input: ValidateInput) -> Result<String> {
        let path = self.context.resolve_path(&input.file_path).await;

        if name == VALIDATE_ALL {
            let reports = self.engine.validate_all(&path).await?;
            let by_type: Map<String, Value> = reports
                .into_iter()
                .map(|r| -> Result<(String, Value)> {
                    Ok((r.validation_type.clone(), serde_json::to_value(&r)?))
                })
                .collect::<Result<_>>()?;
            return Ok(serde_json::to_string_pretty(&by_type)?);
        }

        let content = match input.content {
            Some(content) if name != VALIDATE_STRUCTURE => content,
            _ => read_content(&path).await?,
        };
        let report = match name {
            VALIDATE_GRAMMAR => self.engine.validate_grammar(&path, &content).await?,
            VALIDATE_READABILITY => self.engine.validate_readability(&path, &content).await?,
            _ => self.engine.validate_structure(&path, &content).await?,
        };
        Ok(serde_json::to_string_pretty(&report)?)
    }
}

fn content_schema() -> Value {
    object_schema(
        json!({
            "filePath": file_path_property(),
            "content": {
                "type": "string",
                "description": "Article content (optional, read from the file if not provided)"
            }
        }),
        &["filePath"],
    )
}

#[async_trait]
impl ToolHandler for ValidationTools {
    fn tools(&self) -> Vec<ToolDefinition> {
        let file_only = || object_schema(json!({"filePath": file_path_property()}), &["filePath"]);
        vec![
            ToolDefinition::new(
                VALIDATE_GRAMMAR,
                "Check grammar, spelling, and punctuation",
                content_schema(),
            ),
            ToolDefinition::new(
                VALIDATE_READABILITY,
                "Analyze readability (Flesch score, grade level)",
                content_schema(),
            ),
            ToolDefinition::new(
                VALIDATE_STRUCTURE,
                "Validate article structure (TOC, sections, references)",
                file_only(),
            ),
            ToolDefinition::new(VALIDATE_ALL, "Run all validations on an article", file_only()),
        ]
    }

    async fn execute(&self, name: &str, arguments: ToolArguments) -> Result<String> {
        match name {
            VALIDATE_GRAMMAR | VALIDATE_READABILITY | VALIDATE_STRUCTURE | VALIDATE_ALL => {
                self.run(name, parse_args(name, arguments)?).await
            }
            other => Err(IqPilotError::UnknownTool(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::MetadataStore;
    use crate::settings::{IqPilotConfig, SettingsManager};
    use tempfile::TempDir;
    use tokio::sync::RwLock;

    fn tools(root: &std::path::Path) -> (ValidationTools, Arc<MetadataStore>) {
        let settings = Arc::new(RwLock::new(SettingsManager::from_config(
            root,
            IqPilotConfig::default(),
        )));
        let store = Arc::new(MetadataStore::new());
        let engine = Arc::new(ValidationEngine::new(Arc::clone(&store), Arc::clone(&settings)));
        (
            ValidationTools::new(ToolContext::new(Arc::clone(&store), settings), engine),
            store,
        )
    }

    fn args(value: Value) -> ToolArguments {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_grammar_uses_supplied_content() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("g.md"), "# Clean text\n").unwrap();
        let (tools, store) = tools(dir.path());

        let text = tools
            .execute(
                VALIDATE_GRAMMAR,
                args(json!({"filePath": "g.md", "content": "It's own problem."})),
            )
            .await
            .unwrap();
        let report: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(report["validationType"], "grammar");
        assert_eq!(report["passed"], false);
        assert_eq!(report["issuesFound"], 1);

        let doc = store.get_metadata(&dir.path().join("g.md")).await.unwrap();
        assert_eq!(doc.validation_status("grammar"), Some("failed"));
    }

    #[tokio::test]
    async fn test_validate_all_keyed_by_type() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("all.md"), "# All\n\n## Overview\n\nFine.\n").unwrap();
        let (tools, _store) = tools(dir.path());

        let text = tools
            .execute(VALIDATE_ALL, args(json!({"filePath": "all.md"})))
            .await
            .unwrap();
        let reports: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(reports["grammar"]["passed"], true);
        assert_eq!(reports["structure"]["passed"], false);
        assert!(reports["readability"]["metrics"]["flesch_score"].is_number());
    }

    #[tokio::test]
    async fn test_structure_on_missing_file() {
        let dir = TempDir::new().unwrap();
        let (tools, _store) = tools(dir.path());
        let err = tools
            .execute(VALIDATE_STRUCTURE, args(json!({"filePath": "missing.md"})))
            .await
            .unwrap_err();
        assert!(matches!(err, IqPilotError::ArticleNotFound(_)));
    }
}
