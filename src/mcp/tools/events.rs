//! Editor-side file event reporting
//!
//! Lets the editor act as a second event origin. Reports go through the same
//! coordinator and dedup window as filesystem notifications.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::base::{ToolArguments, ToolContext, ToolHandler, object_schema, parse_args};
use crate::events::EventCoordinator;
use crate::mcp::protocol::ToolDefinition;
use crate::types::{FileEvent, FileEventKind, IqPilotError, Result};

pub const EVENTS_REPORT: &str = "iqpilot/events/report";

/// Origin label for editor reports
pub const EDITOR_SOURCE: &str = "editor";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportInput {
    kind: String,
    path: String,
    #[serde(default)]
    old_path: Option<String>,
}

/// Event reporting tool handler
#[derive(Debug, Clone)]
pub struct EventTools {
    context: ToolContext,
    coordinator: Arc<EventCoordinator>,
}

impl EventTools {
    pub fn new(context: ToolContext, coordinator: Arc<EventCoordinator>) -> Self {
        Self {
            context,
            coordinator,
        }
    }

    async fn report(&self, input: ReportInput) -> Result<String> {
        let kind: FileEventKind = input.kind.parse().map_err(IqPilotError::InvalidParams)?;
        let path = self.context.resolve_path(&input.path).await;

        let event = match kind {
            FileEventKind::Created => FileEvent::created(path, EDITOR_SOURCE),
            FileEventKind::Changed => FileEvent::changed(path, EDITOR_SOURCE),
            FileEventKind::Deleted => FileEvent::deleted(path, EDITOR_SOURCE),
            FileEventKind::Renamed => {
                let old_path = input
                    .old_path
                    .ok_or_else(|| IqPilotError::invalid_params("oldPath is required for renames"))?;
                let old_path = self.context.resolve_path(&old_path).await;
                FileEvent::renamed(old_path, path, EDITOR_SOURCE)
            }
        };

        let key = event.dedup_key();
        let processed = self.coordinator.dispatch(event).await;
        tracing::debug!(key = %key, processed, "Editor event reported");

        let result = json!({
            "processed": processed,
            "kind": kind.as_str(),
            "key": key,
            "message": if processed {
                "Event processed"
            } else {
                "Duplicate event suppressed"
            },
        });
        Ok(serde_json::to_string_pretty(&result)?)
    }
}

#[async_trait]
impl ToolHandler for EventTools {
    fn tools(&self) -> Vec<ToolDefinition> {
        vec![ToolDefinition::new(
            EVENTS_REPORT,
            "Report a file change observed by the editor",
            object_schema(
                json!({
                    "kind": {
                        "type": "string",
                        "enum": ["created", "changed", "renamed", "deleted"],
                        "description": "Kind of change"
                    },
                    "path": {"type": "string", "description": "Affected path (new path for renames)"},
                    "oldPath": {"type": "string", "description": "Previous path, required for renames"}
                }),
                &["kind", "path"],
            ),
        )]
    }

    async fn execute(&self, name: &str, arguments: ToolArguments) -> Result<String> {
        match name {
            EVENTS_REPORT => self.report(parse_args(name, arguments)?).await,
            other => Err(IqPilotError::UnknownTool(other.to_string())),
        }
    }
}
