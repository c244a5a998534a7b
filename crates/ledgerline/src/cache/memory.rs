//! In-memory cache backend with LRU eviction.
//!
//! Thread-safe cache with TTL support using tokio synchronization
//! primitives and an LRU eviction policy. Keys are tracked per namespace so
//! the pattern sweeps issued by write-path invalidation run over a
//! namespace's own keys instead of the whole cache.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use tokio::sync::RwLock;

use ledgerline_core::cache::{namespace_of_key, pattern_matches, Cache, Result};

/// A single cache entry with optional expiration.
#[derive(Debug, Clone)]
struct CacheEntry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(value: Vec<u8>, ttl: Option<Duration>) -> Self {
        let expires_at = ttl.map(|d| Instant::now() + d);
        Self { value, expires_at }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Instant::now() > exp)
    }
}

/// In-memory cache backend.
///
/// Uses `Arc<RwLock<LruCache>>` for concurrent access, lazy TTL expiration
/// (entries are checked on read), and LRU eviction once `max_entries` is
/// reached.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    /// Main key-value store with LRU eviction.
    store: Arc<RwLock<LruCache<String, CacheEntry>>>,
    /// Namespace -> set of live cache keys, for namespace sweeps.
    tracking: Arc<RwLock<HashMap<String, HashSet<String>>>>,
}

impl MemoryCache {
    /// Creates a new in-memory cache.
    ///
    /// # Panics
    ///
    /// Panics if `max_entries` is 0.
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).expect("max_entries must be > 0");
        Self {
            store: Arc::new(RwLock::new(LruCache::new(capacity))),
            tracking: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn untrack(&self, key: &str) {
        if let Some(namespace) = namespace_of_key(key) {
            let mut tracking = self.tracking.write().await;
            if let Some(keys) = tracking.get_mut(namespace) {
                keys.remove(key);
                if keys.is_empty() {
                    tracking.remove(namespace);
                }
            }
        }
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut store = self.store.write().await;

        match store.get(key) {
            // Lazy expiration: the entry stays until overwritten or evicted.
            Some(entry) if entry.is_expired() => Ok(None),
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        {
            let mut store = self.store.write().await;
            store.put(key.to_string(), CacheEntry::new(value.to_vec(), ttl));
        }

        if let Some(namespace) = namespace_of_key(key) {
            let mut tracking = self.tracking.write().await;
            tracking
                .entry(namespace.to_string())
                .or_default()
                .insert(key.to_string());
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        {
            let mut store = self.store.write().await;
            store.pop(key);
        }
        self.untrack(key).await;
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<()> {
        let Some(namespace) = namespace_of_key(pattern) else {
            // Pattern without a concrete namespace: full iteration fallback.
            let mut store = self.store.write().await;
            let keys_to_delete: Vec<String> = store
                .iter()
                .filter(|(key, _)| pattern_matches(pattern, key))
                .map(|(key, _)| key.clone())
                .collect();
            for key in &keys_to_delete {
                store.pop(key);
            }
            drop(store);
            for key in &keys_to_delete {
                self.untrack(key).await;
            }
            return Ok(());
        };

        let tracked: Vec<String> = {
            let tracking = self.tracking.read().await;
            tracking
                .get(namespace)
                .map(|keys| keys.iter().cloned().collect())
                .unwrap_or_default()
        };

        let keys_to_delete: Vec<String> = tracked
            .into_iter()
            .filter(|key| pattern_matches(pattern, key))
            .collect();

        if keys_to_delete.is_empty() {
            return Ok(());
        }

        {
            let mut store = self.store.write().await;
            for key in &keys_to_delete {
                store.pop(key);
            }
        }

        let mut tracking = self.tracking.write().await;
        if let Some(keys) = tracking.get_mut(namespace) {
            for key in &keys_to_delete {
                keys.remove(key);
            }
            if keys.is_empty() {
                tracking.remove(namespace);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerline_core::cache::{count_key, entity_key, list_key, list_pattern};
    use uuid::Uuid;

    const TEST_MAX_ENTRIES: usize = 1000;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = MemoryCache::new(TEST_MAX_ENTRIES);

        cache.set("cards:findById:a", b"value", None).await.unwrap();
        let result = cache.get("cards:findById:a").await.unwrap();

        assert_eq!(result, Some(b"value".to_vec()));
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let cache = MemoryCache::new(TEST_MAX_ENTRIES);
        assert_eq!(cache.get("cards:findById:missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = MemoryCache::new(TEST_MAX_ENTRIES);

        cache.set("cards:findById:a", b"value", None).await.unwrap();
        cache.delete("cards:findById:a").await.unwrap();

        assert!(cache.get("cards:findById:a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ttl_expiration() {
        let cache = MemoryCache::new(TEST_MAX_ENTRIES);

        cache
            .set("cards:findById:a", b"short-lived", Some(Duration::from_millis(50)))
            .await
            .unwrap();
        assert!(cache.get("cards:findById:a").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(cache.get("cards:findById:a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_no_ttl_never_expires() {
        let cache = MemoryCache::new(TEST_MAX_ENTRIES);

        cache.set("cards:findById:a", b"persistent", None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(cache.get("cards:findById:a").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_pattern_sweeps_namespace_lists() {
        let cache = MemoryCache::new(TEST_MAX_ENTRIES);
        let id = Uuid::new_v4();

        cache.set(&list_key("cards", 1), b"1", None).await.unwrap();
        cache.set(&list_key("cards", 2), b"2", None).await.unwrap();
        cache.set(&count_key("cards", 3), b"3", None).await.unwrap();
        cache.set(&entity_key("cards", id), b"4", None).await.unwrap();
        cache
            .set(&list_key("ledger_entries", 1), b"5", None)
            .await
            .unwrap();

        cache.delete_pattern(&list_pattern("cards")).await.unwrap();

        // List keys for the namespace are gone.
        assert!(cache.get(&list_key("cards", 1)).await.unwrap().is_none());
        assert!(cache.get(&list_key("cards", 2)).await.unwrap().is_none());

        // Counts, entity reads, and other namespaces survive.
        assert!(cache.get(&count_key("cards", 3)).await.unwrap().is_some());
        assert!(cache.get(&entity_key("cards", id)).await.unwrap().is_some());
        assert!(cache
            .get(&list_key("ledger_entries", 1))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_delete_pattern_no_matches() {
        let cache = MemoryCache::new(TEST_MAX_ENTRIES);

        cache.set(&list_key("cards", 1), b"1", None).await.unwrap();
        cache
            .delete_pattern(&list_pattern("transactions"))
            .await
            .unwrap();

        assert!(cache.get(&list_key("cards", 1)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_pattern_without_namespace_falls_back() {
        let cache = MemoryCache::new(TEST_MAX_ENTRIES);

        cache.set("cards:findMany:aa", b"1", None).await.unwrap();
        cache.set("transactions:findMany:bb", b"2", None).await.unwrap();

        cache.delete_pattern("*").await.unwrap();

        assert!(cache.get("cards:findMany:aa").await.unwrap().is_none());
        assert!(cache.get("transactions:findMany:bb").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_removes_from_tracking() {
        let cache = MemoryCache::new(TEST_MAX_ENTRIES);

        cache.set("cards:findMany:aa", b"1", None).await.unwrap();
        cache.delete("cards:findMany:aa").await.unwrap();

        let tracking = cache.tracking.read().await;
        assert!(tracking.get("cards").is_none());
    }

    #[tokio::test]
    async fn test_overwrite_value() {
        let cache = MemoryCache::new(TEST_MAX_ENTRIES);

        cache.set("cards:findById:a", b"first", None).await.unwrap();
        cache.set("cards:findById:a", b"second", None).await.unwrap();

        assert_eq!(
            cache.get("cards:findById:a").await.unwrap(),
            Some(b"second".to_vec())
        );
    }

    #[tokio::test]
    async fn test_lru_eviction() {
        let cache = MemoryCache::new(3);

        cache.set("ns:findById:1", b"1", None).await.unwrap();
        cache.set("ns:findById:2", b"2", None).await.unwrap();
        cache.set("ns:findById:3", b"3", None).await.unwrap();

        // Touch key 1 so key 2 becomes the least recently used.
        cache.get("ns:findById:1").await.unwrap();
        cache.set("ns:findById:4", b"4", None).await.unwrap();

        assert!(cache.get("ns:findById:1").await.unwrap().is_some());
        assert!(cache.get("ns:findById:2").await.unwrap().is_none());
        assert!(cache.get("ns:findById:3").await.unwrap().is_some());
        assert!(cache.get("ns:findById:4").await.unwrap().is_some());
    }

    #[tokio::test]
    #[should_panic(expected = "max_entries must be > 0")]
    async fn test_zero_max_entries_panics() {
        let _ = MemoryCache::new(0);
    }
}
