//! Article metadata store
//!
//! Reads and rewrites the metadata block of article files. The file is the
//! single source of truth: nothing is cached between calls. Every
//! read-modify-write runs under a per-path async mutex so concurrent updates
//! to the same article from this process never lose each other's sections.

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::Mutex;

use super::block;
use super::document::{
    ARTICLE_METADATA, MetadataDocument, VALIDATION_TYPES, VALIDATIONS, timestamp_now,
};
use super::value::{MetaMap, MetaValue};
use crate::types::{IqPilotError, Result};

/// Outcome of a structural metadata check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Read/write access to article metadata blocks
#[derive(Debug, Default)]
pub struct MetadataStore {
    locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the metadata document of an article
    ///
    /// Returns an empty document when the article has no block.
    #[tracing::instrument(name = "metadata_get", skip(self), fields(path = %path.display()))]
    pub async fn get_metadata(&self, path: &Path) -> Result<MetadataDocument> {
        self.with_lock(path, async {
            let content = read_article(path).await?;
            match block::parse(path, &content)? {
                Some(doc) => Ok(doc),
                None => {
                    tracing::warn!(path = %path.display(), "No metadata block found");
                    Ok(MetadataDocument::new())
                }
            }
        })
        .await
    }

    /// Merge `updates` into the article's metadata at section granularity
    ///
    /// Each top-level key replaces its section wholesale and
    /// `article_metadata.last_updated` is stamped. A block is appended when
    /// the article has none.
    #[tracing::instrument(
        name = "metadata_update",
        skip(self, updates),
        fields(path = %path.display(), sections = updates.len())
    )]
    pub async fn update_metadata(&self, path: &Path, updates: MetaMap) -> Result<()> {
        self.modify(path, move |doc| doc.merge(updates)).await
    }

    /// Check that the required sections and fields are present
    ///
    /// Read and parse failures are reported as entries in `errors`.
    #[tracing::instrument(name = "metadata_validate", skip(self), fields(path = %path.display()))]
    pub async fn validate_metadata(&self, path: &Path) -> MetadataValidation {
        let errors = match self.get_metadata(path).await {
            Ok(doc) => structural_errors(&doc),
            Err(e) => vec![format!("Validation error: {}", e)],
        };

        if !errors.is_empty() {
            tracing::debug!(path = %path.display(), errors = ?errors, "Metadata validation failed");
        }

        MetadataValidation {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    /// Write the default sections for a new article
    ///
    /// The default sections replace their existing counterparts; any other
    /// section in the block is kept.
    #[tracing::instrument(name = "metadata_initialize", skip(self), fields(path = %path.display()))]
    pub async fn initialize_metadata(&self, path: &Path, title: &str, author: &str) -> Result<()> {
        let filename = file_name(path);
        let initial = MetadataDocument::initial(&filename, title, author);
        self.modify(path, move |doc| doc.merge(initial.into_map()))
            .await?;
        tracing::info!(path = %path.display(), "Initialized metadata");
        Ok(())
    }

    /// Record the outcome of one validation check
    ///
    /// Other validation types and other sections are preserved.
    #[tracing::instrument(
        name = "metadata_validation_result",
        skip(self, details),
        fields(path = %path.display())
    )]
    pub async fn update_validation_result(
        &self,
        path: &Path,
        validation_type: &str,
        passed: bool,
        details: MetaMap,
    ) -> Result<()> {
        let validation_type = validation_type.to_string();
        self.modify(path, move |doc| {
            let mut entry = MetaMap::new()
                .with("last_validated", timestamp_now())
                .with("status", if passed { "passed" } else { "failed" });
            for (k, v) in details {
                entry.insert(k, v);
            }

            let mut validations = doc.section(VALIDATIONS).cloned().unwrap_or_default();
            validations.insert(validation_type, entry);
            doc.set(VALIDATIONS, validations);
        })
        .await
    }

    /// Point `article_metadata.filename` at the file's current name
    ///
    /// Runs as one read-modify-write under the path lock. Returns the new
    /// filename, or `None` when the article has no `article_metadata` section
    /// (the file is then left untouched).
    #[tracing::instrument(name = "metadata_sync_filename", skip(self), fields(path = %path.display()))]
    pub async fn sync_filename(&self, path: &Path) -> Result<Option<String>> {
        let filename = file_name(path);
        self.with_lock(path, async move {
            let content = read_article(path).await?;
            let Some(mut doc) = block::parse(path, &content)? else {
                return Ok(None);
            };
            let Some(article) = doc.section_mut(ARTICLE_METADATA) else {
                return Ok(None);
            };
            article.insert("filename", filename.as_str());
            doc.stamp_last_updated(&timestamp_now());

            let updated = block::write_into(&content, &doc)?;
            tokio::fs::write(path, updated).await?;
            Ok(Some(filename))
        })
        .await
    }

    /// Read, transform and write back the document under the path lock
    async fn modify<F>(&self, path: &Path, apply: F) -> Result<()>
    where
        F: FnOnce(&mut MetadataDocument) + Send,
    {
        self.with_lock(path, async {
            let content = read_article(path).await?;
            let mut doc = block::parse(path, &content)?.unwrap_or_default();

            apply(&mut doc);
            doc.stamp_last_updated(&timestamp_now());

            let updated = block::write_into(&content, &doc)?;
            tokio::fs::write(path, updated).await?;
            tracing::debug!(path = %path.display(), "Metadata written");
            Ok(())
        })
        .await
    }

    /// Run `op` while holding the lock for `path`
    ///
    /// The lock entry is dropped again once no other task holds it.
    async fn with_lock<T, Fut>(&self, path: &Path, op: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        let key = lock_key(path).await;
        let lock = Arc::clone(&self.locks.entry(key.clone()).or_default());

        let result = {
            let _guard = lock.lock().await;
            op.await
        };

        drop(lock);
        self.locks
            .remove_if(&key, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    #[cfg(test)]
    fn lock_count(&self) -> usize {
        self.locks.len()
    }
}

/// Missing required sections and fields
fn structural_errors(doc: &MetadataDocument) -> Vec<String> {
    let mut errors = Vec::new();

    match doc.validations() {
        Some(validations) => {
            for ty in VALIDATION_TYPES {
                let Some(entry) = validations.get(ty).filter(|v| !v.is_null()) else {
                    continue;
                };
                let Some(entry) = entry.as_mapping() else {
                    errors.push(format!("validations.{} must be a mapping", ty));
                    continue;
                };
                for field in ["last_validated", "status"] {
                    if !entry.contains_key(field) {
                        errors.push(format!("Missing '{}' in validations.{}", field, ty));
                    }
                }
            }
        }
        None => errors.push(format!("Missing '{}' section", VALIDATIONS)),
    }

    match doc.article_metadata() {
        Some(article) => {
            for field in ["filename", "last_updated"] {
                if article.get(field).is_none_or(MetaValue::is_null) {
                    errors.push(format!("Missing '{}' in {}", field, ARTICLE_METADATA));
                }
            }
        }
        None => errors.push(format!("Missing '{}' section", ARTICLE_METADATA)),
    }

    errors
}

async fn read_article(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            IqPilotError::article_not_found(path)
        } else {
            IqPilotError::Io(e)
        }
    })
}

async fn lock_key(path: &Path) -> PathBuf {
    tokio::fs::canonicalize(path)
        .await
        .unwrap_or_else(|_| path.to_path_buf())
}

/// File name component as a string
fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
