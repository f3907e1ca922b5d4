//! Sliding-window deduplication of file events

use std::time::{Duration, Instant};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Window within which a repeated key is suppressed
pub const DEDUP_WINDOW: Duration = Duration::from_millis(500);
/// Age after which records are purged
pub const RETENTION_HORIZON: Duration = Duration::from_secs(5);

/// Last-seen table keyed by event dedup key
///
/// At most one "process" decision per key per window. A suppressed event
/// does not refresh the timestamp, so a steady stream of duplicates still
/// lets one through every window.
#[derive(Debug)]
pub struct DedupCache {
    seen: DashMap<String, Instant>,
    window: Duration,
    horizon: Duration,
}

impl Default for DedupCache {
    fn default() -> Self {
        Self::new(DEDUP_WINDOW, RETENTION_HORIZON)
    }
}

impl DedupCache {
    pub fn new(window: Duration, horizon: Duration) -> Self {
        Self {
            seen: DashMap::new(),
            window,
            horizon,
        }
    }

    /// Decide whether the event with `key` should be processed now
    pub fn should_process(&self, key: &str, source: &str) -> bool {
        self.should_process_at(key, source, Instant::now())
    }

    /// Decide at an explicit instant
    pub fn should_process_at(&self, key: &str, source: &str, now: Instant) -> bool {
        // The entry guard holds the shard lock; release it before purging.
        let process = match self.seen.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let last_seen = *occupied.get();
                if now.saturating_duration_since(last_seen) < self.window {
                    false
                } else {
                    occupied.insert(now);
                    true
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(now);
                true
            }
        };

        if process {
            tracing::trace!(key, source, "Processing event");
        } else {
            tracing::debug!(key, source, "Suppressed duplicate event");
        }

        self.purge_at(now);
        process
    }

    /// Drop records older than the retention horizon
    pub fn purge_at(&self, now: Instant) {
        let horizon = self.horizon;
        self.seen
            .retain(|_, last_seen| now.saturating_duration_since(*last_seen) < horizon);
    }

    /// Forget every record
    pub fn clear(&self) {
        self.seen.clear();
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_window() {
        let cache = DedupCache::default();
        let t0 = Instant::now();

        assert!(cache.should_process_at("changed:/a.md", "filesystem", t0));
        assert!(!cache.should_process_at(
            "changed:/a.md",
            "editor",
            t0 + Duration::from_millis(100)
        ));
        assert!(cache.should_process_at(
            "changed:/a.md",
            "filesystem",
            t0 + Duration::from_millis(500)
        ));
    }

    #[test]
    fn test_suppressed_event_does_not_refresh() {
        let cache = DedupCache::default();
        let t0 = Instant::now();

        assert!(cache.should_process_at("k", "fs", t0));
        assert!(!cache.should_process_at("k", "fs", t0 + Duration::from_millis(400)));
        // 600ms after the recorded event, though only 200ms after the suppressed one
        assert!(cache.should_process_at("k", "fs", t0 + Duration::from_millis(600)));
    }

    #[test]
    fn test_keys_are_independent() {
        let cache = DedupCache::default();
        let t0 = Instant::now();
        assert!(cache.should_process_at("created:/a.md", "fs", t0));
        assert!(cache.should_process_at("changed:/a.md", "fs", t0));
        assert!(cache.should_process_at("created:/b.md", "fs", t0));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_retention_purge() {
        let cache = DedupCache::default();
        let t0 = Instant::now();

        assert!(cache.should_process_at("old", "fs", t0));
        assert!(cache.should_process_at("fresh", "fs", t0 + Duration::from_secs(3)));
        assert_eq!(cache.len(), 2);

        // Any decision purges records past the horizon
        assert!(cache.should_process_at("other", "fs", t0 + Duration::from_secs(5)));
        assert_eq!(cache.len(), 2);
        assert!(!cache.seen.contains_key("old"));

        // A purged key behaves as new
        assert!(cache.should_process_at("old", "fs", t0 + Duration::from_millis(5100)));
    }

    #[test]
    fn test_clear() {
        let cache = DedupCache::default();
        let t0 = Instant::now();
        assert!(cache.should_process_at("k", "fs", t0));
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.should_process_at("k", "fs", t0));
    }

    #[test]
    fn test_concurrent_single_winner() {
        let cache = Arc::new(DedupCache::default());
        let now = Instant::now();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.should_process_at("same", "fs", now))
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|processed| *processed)
            .count();
        assert_eq!(winners, 1);
    }
}
