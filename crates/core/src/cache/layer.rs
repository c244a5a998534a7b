//! Read-through cache layer.
//!
//! Wraps a [`Cache`] backend with the load-on-miss pattern used by the
//! repositories. Cache failures are never surfaced: a backend error on read
//! falls through to the loader, a backend error on write leaves the loaded
//! value uncached, and invalidation failures only log. The staleness window
//! this opens is bounded by the TTLs.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use super::{
    count_pattern, entity_key, from_cache_bytes, list_pattern, to_cache_bytes, Cache,
};

/// Tuning for the read-through path.
#[derive(Debug, Clone, Copy, Default)]
pub struct CachePolicy {
    /// Whether missing-entity (`None`) results are cached. Off by default:
    /// a negative entry would outlive a later create on a shared backend.
    pub cache_none: bool,
}

/// Read-through wrapper over a cache backend.
pub struct CacheLayer<C> {
    cache: Arc<C>,
    policy: CachePolicy,
}

impl<C> Clone for CacheLayer<C> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            policy: self.policy,
        }
    }
}

impl<C: Cache> CacheLayer<C> {
    /// Creates a layer with the default policy.
    pub fn new(cache: Arc<C>) -> Self {
        Self {
            cache,
            policy: CachePolicy::default(),
        }
    }

    /// Overrides the cache policy.
    pub fn with_policy(mut self, policy: CachePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the cached value for `key` if present and fresh; otherwise
    /// awaits `loader`, caches its result with `ttl`, and returns it.
    pub async fn get_or_load<T, E, F, Fut>(&self, key: &str, ttl: Duration, loader: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.read(key).await {
            return Ok(value);
        }

        let value = loader().await?;
        self.write(key, &value, ttl).await;
        Ok(value)
    }

    /// Like [`Self::get_or_load`] for optional results. `None` is only
    /// cached when [`CachePolicy::cache_none`] is set.
    pub async fn get_or_load_optional<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        loader: F,
    ) -> Result<Option<T>, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        if let Some(value) = self.read::<Option<T>>(key).await {
            return Ok(value);
        }

        let value = loader().await?;
        if value.is_some() || self.policy.cache_none {
            self.write(key, &value, ttl).await;
        }
        Ok(value)
    }

    /// Drops the single-entity key for `id`. Called after a successful
    /// write; never fails the caller.
    pub async fn invalidate_entity(&self, namespace: &str, id: Uuid) {
        let key = entity_key(namespace, id);
        if let Err(err) = self.cache.delete(&key).await {
            tracing::warn!(namespace, %id, error = %err, "Failed to invalidate entity cache");
        }
    }

    /// Sweeps all list and count keys for a namespace. Called after a
    /// successful write; never fails the caller.
    pub async fn invalidate_lists(&self, namespace: &str) {
        for pattern in [list_pattern(namespace), count_pattern(namespace)] {
            if let Err(err) = self.cache.delete_pattern(&pattern).await {
                tracing::warn!(namespace, pattern, error = %err, "Failed to invalidate list caches");
            }
        }
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.cache.get(key).await {
            Ok(Some(bytes)) => match from_cache_bytes(&bytes) {
                Ok(value) => {
                    tracing::trace!(key, "Cache hit");
                    Some(value)
                }
                Err(err) => {
                    // Treat as a miss; the entry is overwritten on reload.
                    tracing::warn!(key, error = %err, "Cached value failed to deserialize");
                    None
                }
            },
            Ok(None) => {
                tracing::trace!(key, "Cache miss");
                None
            }
            Err(err) => {
                tracing::warn!(key, error = %err, "Cache read failed, falling through");
                None
            }
        }
    }

    async fn write<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let bytes = match to_cache_bytes(value) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(key, error = %err, "Failed to serialize value for cache");
                return;
            }
        };
        if let Err(err) = self.cache.set(key, &bytes, Some(ttl)).await {
            tracing::warn!(key, error = %err, "Cache write failed");
        }
    }
}
