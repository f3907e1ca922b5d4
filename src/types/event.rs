//! Normalized file change events

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of file change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileEventKind {
    /// File was created
    Created,
    /// File content or attributes changed
    Changed,
    /// File moved from `old_path` to `path`
    Renamed,
    /// File was removed
    Deleted,
}

impl FileEventKind {
    /// Prefix used when deriving dedup keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Changed => "changed",
            Self::Renamed => "renamed",
            Self::Deleted => "deleted",
        }
    }
}

impl std::str::FromStr for FileEventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "created" | "create" => Ok(Self::Created),
            "changed" | "change" | "modified" => Ok(Self::Changed),
            "renamed" | "rename" | "moved" => Ok(Self::Renamed),
            "deleted" | "delete" | "removed" => Ok(Self::Deleted),
            other => Err(format!("Unknown event kind: {}", other)),
        }
    }
}

/// A file change notification from one origin
///
/// Produced by a watcher (or reported by the editor), consumed once by the
/// event coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    /// What happened
    pub kind: FileEventKind,
    /// Affected path (new path for renames)
    pub path: PathBuf,
    /// Previous path, only for renames
    pub old_path: Option<PathBuf>,
    /// Origin label (diagnostics only)
    pub source: String,
    /// When the event was observed
    pub observed_at: DateTime<Utc>,
}

impl FileEvent {
    fn new(
        kind: FileEventKind,
        path: PathBuf,
        old_path: Option<PathBuf>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            path,
            old_path,
            source: source.into(),
            observed_at: Utc::now(),
        }
    }

    /// Create a `Created` event
    pub fn created(path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        Self::new(FileEventKind::Created, path.into(), None, source)
    }

    /// Create a `Changed` event
    pub fn changed(path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        Self::new(FileEventKind::Changed, path.into(), None, source)
    }

    /// Create a `Renamed` event
    pub fn renamed(
        old_path: impl Into<PathBuf>,
        new_path: impl Into<PathBuf>,
        source: impl Into<String>,
    ) -> Self {
        Self::new(
            FileEventKind::Renamed,
            new_path.into(),
            Some(old_path.into()),
            source,
        )
    }

    /// Create a `Deleted` event
    pub fn deleted(path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        Self::new(FileEventKind::Deleted, path.into(), None, source)
    }

    /// Deterministic dedup key for this event
    pub fn dedup_key(&self) -> String {
        match (&self.kind, &self.old_path) {
            (FileEventKind::Renamed, Some(old)) => rename_key(old, &self.path),
            (kind, _) => path_key(*kind, &self.path),
        }
    }
}

/// Dedup key for a single-path event
pub(crate) fn path_key(kind: FileEventKind, path: &Path) -> String {
    format!("{}:{}", kind.as_str(), path.display())
}

/// Dedup key for a rename
pub(crate) fn rename_key(old_path: &Path, new_path: &Path) -> String {
    format!("renamed:{}→{}", old_path.display(), new_path.display())
}
