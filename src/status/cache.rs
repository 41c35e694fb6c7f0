//! TTL read-through cache for vault text files
//!
//! Entries are keyed by path and expire `ttl` after the read that produced
//! them. Failed reads (including missing files) are never cached, so the next
//! call retries the filesystem. Writes to the vault do not invalidate entries:
//! a read within the TTL window after a write may return stale content.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Instant,
}

/// Shared text cache. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct TextCache {
    entries: Arc<RwLock<HashMap<PathBuf, CacheEntry>>>,
}

impl TextCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached text for `path`, reading the file on miss or expiry.
    ///
    /// Concurrent misses on the same key may each read the file; the last
    /// insert wins.
    pub async fn get_or_load(&self, path: &Path, ttl: Duration) -> Option<String> {
        let now = Instant::now();
        if let Some(entry) = self.entries.read().await.get(path) {
            if now < entry.expires_at {
                tracing::trace!("Text cache hit: {}", path.display());
                return Some(entry.value.clone());
            }
        }

        match tokio::fs::read_to_string(path).await {
            Ok(value) => {
                tracing::trace!("Text cache fill: {}", path.display());
                self.entries.write().await.insert(
                    path.to_path_buf(),
                    CacheEntry {
                        value: value.clone(),
                        expires_at: now + ttl,
                    },
                );
                Some(value)
            }
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::debug!("Failed to read {}: {}", path.display(), e);
                }
                None
            }
        }
    }

    /// Number of entries currently held (expired ones included)
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache holds no entries
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Drop every entry
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const LONG_TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn test_hit_returns_stale_value_within_ttl() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("context.md");
        std::fs::write(&path, "original").unwrap();

        let cache = TextCache::new();
        assert_eq!(cache.get_or_load(&path, LONG_TTL).await.as_deref(), Some("original"));

        std::fs::write(&path, "updated").unwrap();
        assert_eq!(cache.get_or_load(&path, LONG_TTL).await.as_deref(), Some("original"));
    }

    #[tokio::test]
    async fn test_expired_entry_is_reloaded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("context.md");
        std::fs::write(&path, "original").unwrap();

        let cache = TextCache::new();
        let ttl = Duration::from_millis(40);
        assert_eq!(cache.get_or_load(&path, ttl).await.as_deref(), Some("original"));

        std::fs::write(&path, "updated").unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(cache.get_or_load(&path, ttl).await.as_deref(), Some("updated"));
    }

    #[tokio::test]
    async fn test_absence_is_not_cached() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("instructions.md");

        let cache = TextCache::new();
        assert!(cache.get_or_load(&path, LONG_TTL).await.is_none());
        assert!(cache.is_empty().await);

        std::fs::write(&path, "now present").unwrap();
        assert_eq!(
            cache.get_or_load(&path, LONG_TTL).await.as_deref(),
            Some("now present")
        );
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.md");
        std::fs::write(&path, "shared").unwrap();

        let cache = TextCache::new();
        let other = cache.clone();
        cache.get_or_load(&path, LONG_TTL).await;
        assert_eq!(other.len().await, 1);

        other.clear().await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_separate_instances_are_isolated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.md");
        std::fs::write(&path, "v1").unwrap();

        let first = TextCache::new();
        first.get_or_load(&path, LONG_TTL).await;

        std::fs::write(&path, "v2").unwrap();
        let second = TextCache::new();
        assert_eq!(second.get_or_load(&path, LONG_TTL).await.as_deref(), Some("v2"));
        assert_eq!(first.get_or_load(&path, LONG_TTL).await.as_deref(), Some("v1"));
    }
}
