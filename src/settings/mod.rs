//! Settings management
//!
//! Loads `.iqpilot/config.json` from the workspace root, merges it over the
//! defaults and keeps it current while the server runs.

use std::sync::Arc;

use tokio::sync::RwLock;

mod manager;
mod watcher;

pub use manager::{
    ArticleMatcher, CONFIG_DIR, CONFIG_FILE, FilePatternsConfig, GrammarConfig, IqPilotConfig,
    ReadabilityConfig, SettingsManager, SiteConfig, StructureConfig, TemplatesConfig,
    ValidationConfig, WorkflowsConfig,
};
pub use watcher::{ConfigChangeEvent, ConfigWatcher, WatcherError, WatcherHandle};

/// Settings shared between the config watcher and its readers
pub type SharedSettings = Arc<RwLock<SettingsManager>>;
