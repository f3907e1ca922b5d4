//! Multi-step workflow tools

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use walkdir::WalkDir;

use super::base::{ToolArguments, ToolContext, ToolHandler, file_path_property, object_schema, parse_args};
use super::content::{template_variables, write_article};
use crate::mcp::protocol::ToolDefinition;
use crate::metadata::block;
use crate::services::{TemplateService, ValidationEngine, ValidationReport, read_content};
use crate::types::{IqPilotError, Result};

pub const WORKFLOW_ARTICLE_CREATION: &str = "iqpilot/workflow/article_creation";
pub const WORKFLOW_REVIEW: &str = "iqpilot/workflow/review";
pub const WORKFLOW_SERIES_PLANNING: &str = "iqpilot/workflow/series_planning";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArticleCreationInput {
    template_name: String,
    title: String,
    output_path: String,
    #[serde(default)]
    author: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewInput {
    file_path: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeriesInput {
    topic: String,
    #[serde(default)]
    repository_path: Option<String>,
}

/// One step of a workflow report
#[derive(Debug, Clone, Serialize)]
struct WorkflowStep {
    step: usize,
    action: &'static str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<ValidationReport>,
}

impl WorkflowStep {
    fn pending(step: usize, action: &'static str, message: &str) -> Self {
        Self {
            step,
            action,
            status: "pending",
            message: Some(message.to_string()),
            result: None,
        }
    }

    fn checked(step: usize, action: &'static str, report: ValidationReport) -> Self {
        Self {
            step,
            action,
            status: if report.passed { "completed" } else { "failed" },
            message: None,
            result: Some(report),
        }
    }
}

/// Article mentioning a series topic
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct SeriesArticle {
    file_path: PathBuf,
    title: String,
    mentions: usize,
}

/// Workflow tool handler
#[derive(Debug, Clone)]
pub struct WorkflowTools {
    context: ToolContext,
    templates: Arc<TemplateService>,
    engine: Arc<ValidationEngine>,
}

impl WorkflowTools {
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

    #[tracing::instrument(name = "workflow_article_creation", skip(self, input), fields(template = %input.template_name))]
    async fn article_creation(&self, input: ArticleCreationInput) -> Result<String> {
        let path = self.context.resolve_path(&input.output_path).await;
        let author = match input.author {
            Some(author) => author,
            None => self.context.site_author().await,
        };

        let variables = template_variables(&input.title, &author);
        let content = self.templates.render(&input.template_name, &variables).await?;
        write_article(&path, &content).await?;
        self.context
            .store
            .initialize_metadata(&path, &input.title, &author)
            .await?;

        let workflow = vec![
            WorkflowStep {
                step: 1,
                action: "create_article",
                status: "completed",
                message: Some(format!("Article created: {}", path.display())),
                result: None,
            },
            WorkflowStep::pending(2, "initial_validation", "Ready for initial validation"),
            WorkflowStep::pending(3, "content_development", "Write article content"),
            WorkflowStep::pending(4, "review", "Review and validate content"),
        ];

        let result = json!({
            "workflow": workflow,
            "nextAction": format!("Edit the article content, then run '{}'", WORKFLOW_REVIEW),
            "filePath": path,
        });
        Ok(serde_json::to_string_pretty(&result)?)
    }

    #[tracing::instrument(name = "workflow_review", skip(self, input), fields(file = %input.file_path))]
    async fn review(&self, input: ReviewInput) -> Result<String> {
        let path = self.context.resolve_path(&input.file_path).await;
        let content = read_content(&path).await?;

        let structure = self.engine.validate_structure(&path, &content).await?;
        let grammar = self.engine.validate_grammar(&path, &content).await?;
        let readability = self.engine.validate_readability(&path, &content).await?;
        let ready = structure.passed && grammar.passed && readability.passed;

        let workflow = vec![
            WorkflowStep::checked(1, "validate_structure", structure),
            WorkflowStep::checked(2, "validate_grammar", grammar),
            WorkflowStep::checked(3, "validate_readability", readability),
            WorkflowStep {
                step: 4,
                action: "publish_ready",
                status: if ready { "completed" } else { "failed" },
                message: None,
                result: None,
            },
        ];

        let result = json!({
            "workflow": workflow,
            "publishReady": ready,
            "nextAction": if ready {
                "Article is ready for publication"
            } else {
                "Fix validation issues before publishing"
            },
        });
        Ok(serde_json::to_string_pretty(&result)?)
    }

    #[tracing::instrument(name = "workflow_series_planning", skip(self, input), fields(topic = %input.topic))]
    async fn series_planning(&self, input: SeriesInput) -> Result<String> {
        if input.topic.trim().is_empty() {
            return Err(IqPilotError::invalid_params("topic must not be empty"));
        }
        let root = match input.repository_path {
            Some(repo) => self.context.resolve_path(&repo).await,
            None => self.context.workspace_root().await,
        };

        let topic = input.topic.clone();
        let existing = tokio::task::spawn_blocking(move || scan_topic(&root, &topic))
            .await
            .map_err(|e| IqPilotError::internal(format!("series scan failed: {}", e)))?;

        let topic = input.topic;
        let result = json!({
            "topic": topic,
            "existingArticles": existing,
            "suggestions": [
                format!("{} - Introduction", topic),
                format!("{} - Getting Started", topic),
                format!("{} - Best Practices", topic),
                format!("{} - Advanced Techniques", topic),
            ],
            "nextAction": "Review existing articles and create missing topics",
        });
        Ok(serde_json::to_string_pretty(&result)?)
    }
}

/// Articles under `root` mentioning `topic`, most mentions first
fn scan_topic(root: &Path, topic: &str) -> Vec<SeriesArticle> {
    let needle = topic.to_lowercase();
    let mut found: Vec<SeriesArticle> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !matches!(e.file_name().to_str(), Some("node_modules" | ".git")))
        .filter_map(|entry| entry.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "md"))
        .filter_map(|e| {
            let content = match std::fs::read_to_string(e.path()) {
                Ok(content) => content,
                Err(err) => {
                    tracing::warn!(path = %e.path().display(), error = %err, "Error processing article");
                    return None;
                }
            };
            let mentions = content.to_lowercase().matches(&needle).count();
            (mentions > 0).then(|| SeriesArticle {
                title: article_title(e.path(), &content),
                file_path: e.into_path(),
                mentions,
            })
        })
        .collect();

    found.sort_by(|a, b| b.mentions.cmp(&a.mentions).then_with(|| a.file_path.cmp(&b.file_path)));
    found
}

/// Metadata title, else the file stem
fn article_title(path: &Path, content: &str) -> String {
    let from_metadata = block::parse(path, content).ok().flatten().and_then(|doc| {
        doc.article_metadata()
            .and_then(|a| a.get("title"))
            .and_then(|t| t.as_str())
            .map(str::to_string)
    });
    from_metadata.unwrap_or_else(|| {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    })
}

#[async_trait]
impl ToolHandler for WorkflowTools {
    fn tools(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                WORKFLOW_ARTICLE_CREATION,
                "Guide through article creation workflow",
                object_schema(
                    json!({
                        "templateName": {"type": "string", "description": "Template to use"},
                        "title": {"type": "string", "description": "Article title"},
                        "outputPath": {"type": "string", "description": "Output file path"},
                        "author": {"type": "string", "description": "Author name (defaults to the site author)"}
                    }),
                    &["templateName", "title", "outputPath"],
                ),
            ),
            ToolDefinition::new(
                WORKFLOW_REVIEW,
                "Guide through article review workflow",
                object_schema(json!({"filePath": file_path_property()}), &["filePath"]),
            ),
            ToolDefinition::new(
                WORKFLOW_SERIES_PLANNING,
                "Plan article series with related topics",
                object_schema(
                    json!({
                        "topic": {"type": "string", "description": "Series topic"},
                        "repositoryPath": {"type": "string", "description": "Directory to scan (defaults to the workspace root)"}
                    }),
                    &["topic"],
                ),
            ),
        ]
    }

    async fn execute(&self, name: &str, arguments: ToolArguments) -> Result<String> {
        match name {
            WORKFLOW_ARTICLE_CREATION => self.article_creation(parse_args(name, arguments)?).await,
            WORKFLOW_REVIEW => self.review(parse_args(name, arguments)?).await,
            WORKFLOW_SERIES_PLANNING => self.series_planning(parse_args(name, arguments)?).await,
            other => Err(IqPilotError::UnknownTool(other.to_string())),
        }
    }
}
