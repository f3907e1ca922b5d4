//! IQPilot
//!
//! A local MCP tool server for documentation repositories. It watches a tree
//! of Markdown articles, keeps the metadata block embedded in each article in
//! sync with renames, and exposes metadata, validation, content and workflow
//! tools to an agent over JSON-RPC on stdio.
//!
//! ## Features
//!
//! - MCP handshake, `tools/list` and `tools/call` over newline-delimited JSON
//! - Filesystem and editor events deduplicated in a 500 ms window
//! - Per-article locking around metadata read-modify-write
//! - Grammar, readability and structure heuristics
//!
//! ## Quick Start
//!
//! ```no_run
//! use iqpilot::{cli::Cli, run_with_cli};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cli = Cli {
//!         workspace: Some("docs".into()),
//!         ..Default::default()
//!     };
//!     run_with_cli(&cli).await
//! }
//! ```
//!
//! ## Metadata Block
//!
//! Each article carries at most one block, appended at the end of the file
//! when missing:
//!
//! ```text
//! <!--
//! ---
//! article_metadata:
//!   filename: intro.md
//!   last_updated: 2024-05-01T10:00:00Z
//! ---
//! -->
//! ```
//!
//! ## Configuration
//!
//! `<workspace>/.iqpilot/config.json` is merged section by section over the
//! built-in defaults and reloaded when it changes.
//!
//! ## Environment Variables
//!
//! - `IQPILOT_WORKSPACE`: workspace root when no positional argument is given
//! - `RUST_LOG`: log filter, takes priority over `-v`/`-q`
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint for trace export

pub mod cli;
pub mod events;
pub mod mcp;
pub mod metadata;
pub mod runtime;
pub mod services;
pub mod settings;
pub mod tracing;
pub mod types;

pub use cli::Cli;
pub use events::{DedupCache, EventCoordinator};
pub use mcp::{McpServer, ToolHandler, ToolRegistry};
pub use metadata::{MetaMap, MetaValue, MetadataDocument, MetadataStore};
pub use runtime::{Components, run_with_cli, shutdown_otel};
pub use settings::{IqPilotConfig, SettingsManager, SharedSettings};
pub use types::{ErrorCode, FileEvent, FileEventKind, IqPilotError, Result};
