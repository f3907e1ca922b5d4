//! Event coordinator
//!
//! Single entry point for file change notifications from every origin. Each
//! event is deduplicated against the shared [`DedupCache`] before any side
//! effect runs, so the editor and the filesystem watcher reporting the same
//! rename only sync metadata once.

use std::path::Path;
use std::sync::Arc;

use crate::metadata::MetadataStore;
use crate::settings::SharedSettings;
use crate::types::{FileEvent, FileEventKind, Result, path_key, rename_key};

use super::dedup::DedupCache;

/// Deduplicates file events and runs their side effects
#[derive(Debug)]
pub struct EventCoordinator {
    dedup: DedupCache,
    store: Arc<MetadataStore>,
    settings: SharedSettings,
}

impl EventCoordinator {
    pub fn new(store: Arc<MetadataStore>, settings: SharedSettings) -> Self {
        Self::with_cache(DedupCache::default(), store, settings)
    }

    /// Create a coordinator with a custom dedup cache
    pub fn with_cache(dedup: DedupCache, store: Arc<MetadataStore>, settings: SharedSettings) -> Self {
        Self {
            dedup,
            store,
            settings,
        }
    }

    /// Dedup gate shared by all entry points
    pub fn should_process(&self, key: &str, source: &str) -> bool {
        self.dedup.should_process(key, source)
    }

    /// Route a normalized event to its entry point
    pub async fn dispatch(&self, event: FileEvent) -> bool {
        match (event.kind, event.old_path.as_deref()) {
            (FileEventKind::Created, _) => self.on_created(&event.path, &event.source),
            (FileEventKind::Changed, _) => self.on_changed(&event.path, &event.source),
            (FileEventKind::Deleted, _) => self.on_deleted(&event.path, &event.source),
            (FileEventKind::Renamed, Some(old_path)) => {
                self.on_renamed(old_path, &event.path, &event.source).await
            }
            (FileEventKind::Renamed, None) => {
                tracing::warn!(
                    path = %event.path.display(),
                    source = %event.source,
                    "Rename event without a previous path, ignoring"
                );
                false
            }
        }
    }

    pub fn on_created(&self, path: &Path, source: &str) -> bool {
        let processed = self.should_process(&path_key(FileEventKind::Created, path), source);
        if processed {
            tracing::info!(path = %path.display(), source, "Article created");
        }
        processed
    }

    pub fn on_changed(&self, path: &Path, source: &str) -> bool {
        let processed = self.should_process(&path_key(FileEventKind::Changed, path), source);
        if processed {
            tracing::debug!(path = %path.display(), source, "Article changed");
        }
        processed
    }

    pub fn on_deleted(&self, path: &Path, source: &str) -> bool {
        let processed = self.should_process(&path_key(FileEventKind::Deleted, path), source);
        if processed {
            tracing::info!(path = %path.display(), source, "Article deleted");
        }
        processed
    }

    /// Handle a rename and sync the metadata filename at the new path
    ///
    /// Sync failures are logged, never returned.
    pub async fn on_renamed(&self, old_path: &Path, new_path: &Path, source: &str) -> bool {
        if !self.should_process(&rename_key(old_path, new_path), source) {
            return false;
        }

        tracing::info!(
            old_path = %old_path.display(),
            new_path = %new_path.display(),
            source,
            "Article renamed"
        );

        if let Err(e) = self.sync_filename(new_path).await {
            tracing::error!(
                path = %new_path.display(),
                error = %e,
                "Failed to sync metadata after rename"
            );
        }
        true
    }

    /// Forget every dedup record
    pub fn clear(&self) {
        self.dedup.clear();
    }

    async fn sync_filename(&self, path: &Path) -> Result<()> {
        if !self.settings.read().await.auto_sync_metadata() {
            tracing::debug!(path = %path.display(), "Metadata auto-sync disabled");
            return Ok(());
        }

        match self.store.sync_filename(path).await? {
            Some(filename) => {
                tracing::info!(path = %path.display(), filename = %filename, "Synced metadata filename");
            }
            None => {
                tracing::warn!(path = %path.display(), "No article_metadata section, skipping sync");
            }
        }
        Ok(())
    }
}
