use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::{sync::RwLock, time::Instant};

use crate::thingspeak::models::FeedSnapshot;

/// Cache key under which the poller publishes the latest snapshot.
pub const FEEDS_KEY: &str = "feeds";

/// Stand-in expiry for TTLs too large to add to `Instant::now()`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

struct CacheEntry {
    value: Arc<FeedSnapshot>,
    expires_at: Instant,
}

/// In-memory store of feed snapshots with per-entry expiry.
///
/// Wrapped in `Arc` so it can be cheaply cloned and shared across tasks.
/// Values are handed out as `Arc<FeedSnapshot>`: a `set` swaps in a whole new
/// snapshot under the write lock, so readers only ever see a complete value.
#[derive(Clone, Default)]
pub struct FeedCache {
    inner: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl FeedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace whatever is stored under `key`; it expires `ttl` from now.
    pub async fn set(&self, key: &str, value: Arc<FeedSnapshot>, ttl: Duration) {
        let now = Instant::now();
        let entry = CacheEntry {
            value,
            expires_at: now.checked_add(ttl).unwrap_or(now + FAR_FUTURE),
        };
        self.inner.write().await.insert(key.to_owned(), entry);
    }

    /// Return the value under `key` if it has not expired yet.
    ///
    /// An expired entry is removed on the way out.
    pub async fn get(&self, key: &str) -> Option<Arc<FeedSnapshot>> {
        {
            let guard = self.inner.read().await;
            match guard.get(key) {
                None => return None,
                Some(entry) if Instant::now() < entry.expires_at => {
                    return Some(Arc::clone(&entry.value));
                }
                Some(_) => {}
            }
        }

        // Re-check under the write lock: a fresh `set` may have landed
        // between dropping the read guard and acquiring this one.
        let mut guard = self.inner.write().await;
        if let Some(entry) = guard.get(key) {
            if Instant::now() < entry.expires_at {
                return Some(Arc::clone(&entry.value));
            }
            guard.remove(key);
        }
        None
    }

    /// Number of entries physically held, expired or not.
    #[cfg(test)]
    async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}
