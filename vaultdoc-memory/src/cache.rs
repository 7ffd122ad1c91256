//! In-memory implementation of the cache backend contract.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use vaultdoc::cache::CacheBackend;
use vaultdoc::error::CacheError;

struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// A key-value cache held in memory.
///
/// Expiry follows the tokio clock, so tests can drive it with
/// `tokio::time::pause` and `advance`. Expired entries are removed lazily on
/// access.
#[derive(Clone, Default)]
pub struct MemoryCache {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl MemoryCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a live entry exists for `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.peek(key).is_some()
    }

    /// Returns the live value stored under `key`.
    #[must_use]
    pub fn peek(&self, key: &str) -> Option<Vec<u8>> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.is_expired() => {
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }

    /// Returns the number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        let mut entries = self.entries.lock();
        entries.retain(|_, entry| !entry.is_expired());
        entries.len()
    }

    /// Returns true if there are no live entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.peek(key))
    }

    async fn setex(&self, key: &str, ttl: Duration, value: Vec<u8>) -> Result<(), CacheError> {
        let expires_at = Instant::now() + ttl;
        tracing::trace!(key, ttl_secs = ttl.as_secs(), "caching entry");
        self.entries.lock().insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("_id:1|").await.unwrap(), None);

        cache.setex("_id:1|", Duration::from_secs(60), b"data".to_vec()).await.unwrap();

        assert_eq!(cache.get("_id:1|").await.unwrap(), Some(b"data".to_vec()));
        assert!(cache.contains_key("_id:1|"));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_overwrite_resets_value() {
        let cache = MemoryCache::new();
        cache.setex("k", Duration::from_secs(60), b"a".to_vec()).await.unwrap();
        cache.setex("k", Duration::from_secs(60), b"b".to_vec()).await.unwrap();

        assert_eq!(cache.peek("k"), Some(b"b".to_vec()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires() {
        let cache = MemoryCache::new();
        cache.setex("k", Duration::from_secs(10), b"a".to_vec()).await.unwrap();

        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(cache.contains_key("k"));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let cache = MemoryCache::new();
        let other = cache.clone();
        other.setex("k", Duration::from_secs(1), vec![1]).await.unwrap();

        assert!(cache.contains_key("k"));
        cache.clear();
        assert!(other.is_empty());
    }
}
