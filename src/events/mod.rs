//! File event handling
//!
//! Raw notifications from the filesystem watcher and editor reports are
//! normalized into [`FileEvent`](crate::types::FileEvent)s, deduplicated in a
//! sliding window and then acted on by the [`EventCoordinator`].

mod coordinator;
mod dedup;
mod watcher;

pub use coordinator::EventCoordinator;
pub use dedup::{DEDUP_WINDOW, DedupCache, RETENTION_HORIZON};
pub use watcher::{ArticleWatcher, FILESYSTEM_SOURCE, translate};
