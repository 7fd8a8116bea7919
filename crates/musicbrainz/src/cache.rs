//! Short-lived in-process cache for fetched releases.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::Release;

/// Default time-to-live for cached releases.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

struct CachedRelease {
    release: Release,
    cached_at: Instant,
}

/// TTL cache keyed by mbid.
///
/// Entries are evicted lazily: an expired entry is removed the next time it
/// is read. Release metadata changes rarely, so a short TTL only exists to
/// bound staleness for repeated catalog writes against the same release.
pub struct ReleaseCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CachedRelease>>,
}

impl ReleaseCache {
    /// Creates a cache with the default TTL.
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_CACHE_TTL)
    }

    /// Creates a cache with an explicit TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cached release for `mbid`, if present and fresh.
    pub async fn get(&self, mbid: &str) -> Option<Release> {
        {
            let entries = self.entries.read().await;
            match entries.get(mbid) {
                Some(entry) if entry.cached_at.elapsed() < self.ttl => {
                    return Some(entry.release.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }

        // Expired: drop the entry under the write lock.
        self.entries.write().await.remove(mbid);
        None
    }

    /// Stores a release under `mbid`, replacing any previous entry.
    pub async fn put(&self, mbid: &str, release: Release) {
        self.entries.write().await.insert(
            mbid.to_string(),
            CachedRelease {
                release,
                cached_at: Instant::now(),
            },
        );
    }

    /// Number of entries currently held, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for ReleaseCache {
    fn default() -> Self {
        Self::new()
    }
}
