//! Content creation and analysis tools

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::base::{
    ToolArguments, ToolContext, ToolHandler, display_name, file_path_property, object_schema,
    parse_args,
};
use crate::mcp::protocol::ToolDefinition;
use crate::services::{TemplateService, ValidationEngine, analyze_gaps, read_content};
use crate::types::{IqPilotError, Result};

pub const CONTENT_CREATE: &str = "iqpilot/content/create";
pub const CONTENT_ANALYZE_GAPS: &str = "iqpilot/content/analyze_gaps";
pub const CONTENT_FIND_RELATED: &str = "iqpilot/content/find_related";
pub const CONTENT_PUBLISH_READY: &str = "iqpilot/content/publish_ready";
pub const CONTENT_LIST_TEMPLATES: &str = "iqpilot/content/list_templates";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateInput {
    template_name: String,
    title: String,
    #[serde(default)]
    author: Option<String>,
    output_path: String,
    #[serde(default)]
    variables: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileInput {
    file_path: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelatedInput {
    file_path: String,
    #[serde(default)]
    repository_path: Option<String>,
}

/// Content tool handler
#[derive(Debug, Clone)]
pub struct ContentTools {
    context: ToolContext,
    templates: Arc<TemplateService>,
    engine: Arc<ValidationEngine>,
}

impl ContentTools {
    pub fn new(
        context: ToolContext,
        templates: Arc<TemplateService>,
        engine: Arc<ValidationEngine>,
    ) -> Self {
        Self {
            context,
            templates,
            engine,
        }
    }

    #[tracing::instrument(name = "content_create", skip(self, input), fields(template = %input.template_name))]
    async fn create(&self, input: CreateInput) -> Result<String> {
        let path = self.context.resolve_path(&input.output_path).await;
        let author = match input.author {
            Some(author) => author,
            None => self.context.site_author().await,
        };

        let mut variables = template_variables(&input.title, &author);
        for (key, value) in input.variables {
            let value = match value {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            variables.insert(key, value);
        }

        let content = self.templates.render(&input.template_name, &variables).await?;
        write_article(&path, &content).await?;
        self.context
            .store
            .initialize_metadata(&path, &input.title, &author)
            .await?;
        tracing::info!(path = %path.display(), "Created article");

        let result = json!({
            "success": true,
            "filePath": path,
            "message": format!("Article created from template '{}'", input.template_name),
        });
        Ok(serde_json::to_string_pretty(&result)?)
    }

    async fn analyze_gaps(&self, input: FileInput) -> Result<String> {
        let path = self.context.resolve_path(&input.file_path).await;
        let content = read_content(&path).await?;
        Ok(serde_json::to_string_pretty(&analyze_gaps(&content))?)
    }

    async fn find_related(&self, input: RelatedInput) -> Result<String> {
        let path = self.context.resolve_path(&input.file_path).await;
        let repository = match input.repository_path {
            Some(repo) => Some(self.context.resolve_path(&repo).await),
            None => None,
        };
        let content = read_content(&path).await?;
        let related = self.engine.find_related(&path, &content, repository).await?;
        Ok(serde_json::to_string_pretty(&related)?)
    }

    async fn publish_ready(&self, input: FileInput) -> Result<String> {
        let path = self.context.resolve_path(&input.file_path).await;
        let reports = self.engine.validate_all(&path).await?;
        let metadata = self.context.store.validate_metadata(&path).await;

        let passed = |ty: &str| reports.iter().any(|r| r.validation_type == ty && r.passed);
        let ready = reports.iter().all(|r| r.passed) && metadata.is_valid;

        let mut validations = Map::new();
        for report in &reports {
            validations.insert(report.validation_type.clone(), serde_json::to_value(report)?);
        }

        let result = json!({
            "ready": ready,
            "file": display_name(&path),
            "validations": validations,
            "metadata": {
                "valid": metadata.is_valid,
                "errors": metadata.errors,
            },
            "checklist": [
                {"item": "Grammar check", "passed": passed("grammar")},
                {"item": "Readability check", "passed": passed("readability")},
                {"item": "Structure validation", "passed": passed("structure")},
                {"item": "Metadata complete", "passed": metadata.is_valid},
            ],
        });
        Ok(serde_json::to_string_pretty(&result)?)
    }

    async fn list_templates(&self) -> Result<String> {
        let templates = self.templates.list_templates().await?;
        Ok(serde_json::to_string_pretty(&json!({ "templates": templates }))?)
    }
}

/// Variables every rendered template receives
pub(crate) fn template_variables(title: &str, author: &str) -> HashMap<String, String> {
    HashMap::from([
        ("title".to_string(), title.to_string()),
        ("author".to_string(), author.to_string()),
        (
            "date".to_string(),
            chrono::Local::now().format("%Y-%m-%d").to_string(),
        ),
    ])
}

/// Write a new article, creating parent directories
pub(crate) async fn write_article(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, content).await?;
    Ok(())
}

#[async_trait]
impl ToolHandler for ContentTools {
    fn tools(&self) -> Vec<ToolDefinition> {
        let file_only = || object_schema(json!({"filePath": file_path_property()}), &["filePath"]);
        vec![
            ToolDefinition::new(
                CONTENT_CREATE,
                "Create a new article from template",
                object_schema(
                    json!({
                        "templateName": {"type": "string", "description": "Template name (article, howto, tutorial, etc.)"},
                        "title": {"type": "string", "description": "Article title"},
                        "author": {"type": "string", "description": "Author name (defaults to the site author)"},
                        "outputPath": {"type": "string", "description": "Output file path"},
                        "variables": {"type": "object", "description": "Additional template variables (optional)"}
                    }),
                    &["templateName", "title", "outputPath"],
                ),
            ),
            ToolDefinition::new(
                CONTENT_ANALYZE_GAPS,
                "Identify missing information or logical gaps",
                file_only(),
            ),
            ToolDefinition::new(
                CONTENT_FIND_RELATED,
                "Find related articles and topics",
                object_schema(
                    json!({
                        "filePath": file_path_property(),
                        "repositoryPath": {"type": "string", "description": "Directory to scan (defaults to the workspace root)"}
                    }),
                    &["filePath"],
                ),
            ),
            ToolDefinition::new(
                CONTENT_PUBLISH_READY,
                "Check if article is ready for publication",
                file_only(),
            ),
            ToolDefinition::new(
                CONTENT_LIST_TEMPLATES,
                "List available article templates",
                object_schema(json!({}), &[]),
            ),
        ]
    }

    async fn execute(&self, name: &str, arguments: ToolArguments) -> Result<String> {
        match name {
            CONTENT_CREATE => self.create(parse_args(name, arguments)?).await,
            CONTENT_ANALYZE_GAPS => self.analyze_gaps(parse_args(name, arguments)?).await,
            CONTENT_FIND_RELATED => self.find_related(parse_args(name, arguments)?).await,
            CONTENT_PUBLISH_READY => self.publish_ready(parse_args(name, arguments)?).await,
            CONTENT_LIST_TEMPLATES => self.list_templates().await,
            other => Err(IqPilotError::UnknownTool(other.to_string())),
        }
    }
}
