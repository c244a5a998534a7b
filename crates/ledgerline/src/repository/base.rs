//! Optimistic-concurrency base repository.
//!
//! Composes a store backend with the read-through cache layer, the audit
//! hook, and the performance monitor. Reads go through the cache; writes go
//! to the store first and invalidate afterwards, so a failed write never
//! drops a valid cache entry. Version conflicts are surfaced, never
//! retried: the caller owns the re-read and retry cycle.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use uuid::Uuid;

use ledgerline_core::cache::{count_key, entity_key, list_key, Cache, CacheLayer};
use ledgerline_core::query::{stable_filter_hash, stable_query_hash, Filter, QueryOptions};
use ledgerline_core::store::{
    AuditAction, AuditEvent, AuditHook, EntityRecord, NoopAuditHook, NoopMonitor, Outcome,
    PerformanceMonitor, QueryReport, RepositoryError, Result, Store,
};

use crate::config::EngineConfig;

#[derive(Debug, Clone, Copy)]
struct CacheTtls {
    entity: Duration,
    list: Duration,
    count: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            entity: Duration::from_secs(300),
            list: Duration::from_secs(60),
            count: Duration::from_secs(30),
        }
    }
}

/// CRUD repository with version-stamped updates.
///
/// All collaborators are injected at construction; cloning shares them.
pub struct Repository<E, S, C>
where
    E: EntityRecord,
    S: Store,
    C: Cache,
{
    store: Arc<S>,
    cache: CacheLayer<C>,
    audit: Arc<dyn AuditHook>,
    monitor: Arc<dyn PerformanceMonitor>,
    actor_id: Option<String>,
    ttls: CacheTtls,
    _entity: PhantomData<fn() -> E>,
}

impl<E, S, C> Clone for Repository<E, S, C>
where
    E: EntityRecord,
    S: Store,
    C: Cache,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: self.cache.clone(),
            audit: Arc::clone(&self.audit),
            monitor: Arc::clone(&self.monitor),
            actor_id: self.actor_id.clone(),
            ttls: self.ttls,
            _entity: PhantomData,
        }
    }
}

impl<E, S, C> Repository<E, S, C>
where
    E: EntityRecord,
    S: Store,
    C: Cache,
{
    /// Creates a repository with no-op audit and monitoring and the default
    /// TTLs.
    pub fn new(store: Arc<S>, cache: Arc<C>) -> Self {
        Self {
            store,
            cache: CacheLayer::new(cache),
            audit: Arc::new(NoopAuditHook),
            monitor: Arc::new(NoopMonitor),
            actor_id: None,
            ttls: CacheTtls::default(),
            _entity: PhantomData,
        }
    }

    pub fn with_audit(mut self, audit: Arc<dyn AuditHook>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_monitor(mut self, monitor: Arc<dyn PerformanceMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    /// Sets the actor recorded on audit events (typically the service
    /// identity; end-user attribution belongs to the calling layer).
    pub fn with_actor(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }

    /// Applies the cache TTLs from an engine configuration.
    pub fn with_config(mut self, config: &EngineConfig) -> Self {
        self.ttls = CacheTtls {
            entity: config.entity_cache_ttl(),
            list: config.list_cache_ttl(),
            count: config.count_cache_ttl(),
        };
        self
    }

    /// Persists a new entity with `version = 0` and returns the stored
    /// value.
    pub async fn create(&self, mut entity: E) -> Result<E> {
        let started = Instant::now();
        entity.set_version(0);
        let id = entity.id();

        let result = async {
            let record = to_record(&entity)?;
            self.store
                .insert(E::COLLECTION, id, record.clone())
                .await
                .map_err(|e| RepositoryError::from_store(e, E::COLLECTION, id.to_string()))?;
            self.cache.invalidate_lists(E::COLLECTION).await;
            self.fire_audit(AuditAction::Created, id, None, Some(record))
                .await;
            Ok(entity)
        }
        .await;

        self.finish("create", None, started, result).await
    }

    /// Fetches an entity by id through the cache.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<E>> {
        let started = Instant::now();
        let key = entity_key(E::COLLECTION, id);

        let result = self
            .cache
            .get_or_load_optional(&key, self.ttls.entity, || self.load(id))
            .await;

        self.finish("findById", None, started, result).await
    }

    /// Runs a query through the list cache, returning typed entities.
    pub async fn find_many(&self, options: &QueryOptions) -> Result<Vec<E>> {
        let rows = self.find_many_records(options).await?;
        rows.into_iter().map(from_record).collect()
    }

    /// Runs a query through the list cache, returning raw records.
    ///
    /// The pagination engine consumes records so it can read sort-field
    /// values by name.
    pub async fn find_many_records(&self, options: &QueryOptions) -> Result<Vec<Value>> {
        let started = Instant::now();
        let key = list_key(E::COLLECTION, stable_query_hash(options));
        let filters = describe_filter(options.filter.as_ref());

        let result = self
            .cache
            .get_or_load(&key, self.ttls.list, || async {
                self.store
                    .query(E::COLLECTION, options)
                    .await
                    .map_err(|e| RepositoryError::from_store(e, E::COLLECTION, String::new()))
            })
            .await;

        self.finish("findMany", filters, started, result).await
    }

    /// Runs a query directly against the store, bypassing the cache.
    ///
    /// For callers whose next write depends on what they just read (the
    /// ledger's continuity gate); the TTL staleness window of the list
    /// cache is not acceptable there.
    pub async fn find_many_fresh(&self, options: &QueryOptions) -> Result<Vec<E>> {
        let started = Instant::now();
        let filters = describe_filter(options.filter.as_ref());

        let result = async {
            let rows = self
                .store
                .query(E::COLLECTION, options)
                .await
                .map_err(|e| RepositoryError::from_store(e, E::COLLECTION, String::new()))?;
            rows.into_iter().map(from_record).collect()
        }
        .await;

        self.finish("findManyFresh", filters, started, result).await
    }

    /// Counts entities matching a filter through the count cache.
    pub async fn count(&self, filter: Option<&Filter>) -> Result<u64> {
        let started = Instant::now();
        let key = count_key(E::COLLECTION, stable_filter_hash(filter));
        let filters = describe_filter(filter);

        let result = self
            .cache
            .get_or_load(&key, self.ttls.count, || async {
                self.store
                    .count(E::COLLECTION, filter)
                    .await
                    .map_err(|e| RepositoryError::from_store(e, E::COLLECTION, String::new()))
            })
            .await;

        self.finish("count", filters, started, result).await
    }

    /// Reads the current entity, applies `mutate`, and writes it back with
    /// `version = current + 1`, conditioned on the version that was read.
    ///
    /// A concurrent writer that got there first surfaces as
    /// [`RepositoryError::VersionConflict`]; callers re-read and retry. The
    /// mutation must not change the entity's id.
    pub async fn update<F>(&self, id: Uuid, mutate: F) -> Result<E>
    where
        F: FnOnce(&mut E) + Send,
    {
        let started = Instant::now();

        let result = async {
            // Read from the store, not the cache: the optimistic lock
            // compares against the version actually read.
            let current = self.load(id).await?.ok_or(RepositoryError::NotFound {
                entity_type: E::COLLECTION,
                id: id.to_string(),
            })?;
            let previous_version = current.version();
            let before = to_record(&current)?;

            let mut updated = current;
            mutate(&mut updated);
            updated.set_version(previous_version + 1);
            let record = to_record(&updated)?;

            self.store
                .put(E::COLLECTION, id, record.clone(), Some(previous_version))
                .await
                .map_err(|e| RepositoryError::from_store(e, E::COLLECTION, id.to_string()))?;

            self.cache.invalidate_entity(E::COLLECTION, id).await;
            self.cache.invalidate_lists(E::COLLECTION).await;
            self.fire_audit(AuditAction::Updated, id, Some(before), Some(record))
                .await;
            Ok(updated)
        }
        .await;

        self.finish("update", None, started, result).await
    }

    /// Removes an entity and invalidates its cached reads.
    ///
    /// This is a hard removal at the store level; soft deletion is a domain
    /// repository concern layered on top of [`Self::update`].
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let started = Instant::now();

        let result = async {
            let before = self
                .store
                .get(E::COLLECTION, id)
                .await
                .map_err(|e| RepositoryError::from_store(e, E::COLLECTION, id.to_string()))?;

            self.store
                .remove(E::COLLECTION, id)
                .await
                .map_err(|e| RepositoryError::from_store(e, E::COLLECTION, id.to_string()))?;

            self.cache.invalidate_entity(E::COLLECTION, id).await;
            self.cache.invalidate_lists(E::COLLECTION).await;
            self.fire_audit(AuditAction::Deleted, id, before, None).await;
            Ok(())
        }
        .await;

        self.finish("delete", None, started, result).await
    }

    async fn load(&self, id: Uuid) -> Result<Option<E>> {
        match self
            .store
            .get(E::COLLECTION, id)
            .await
            .map_err(|e| RepositoryError::from_store(e, E::COLLECTION, id.to_string()))?
        {
            Some(record) => Ok(Some(from_record(record)?)),
            None => Ok(None),
        }
    }

    /// Audit failures are logged and swallowed; they must never fail the
    /// data operation that triggered them.
    async fn fire_audit(
        &self,
        action: AuditAction,
        id: Uuid,
        before_state: Option<Value>,
        after_state: Option<Value>,
    ) {
        let event = AuditEvent {
            action,
            entity_type: E::COLLECTION,
            entity_id: id.to_string(),
            before_state,
            after_state,
            actor_id: self.actor_id.clone(),
        };
        if let Err(err) = self.audit.record(event).await {
            tracing::warn!(
                entity_type = E::COLLECTION,
                entity_id = %id,
                error = %err,
                "Audit hook failed"
            );
        }
    }

    async fn finish<T>(
        &self,
        operation: &'static str,
        filters: Option<String>,
        started: Instant,
        result: Result<T>,
    ) -> Result<T> {
        let outcome = if result.is_ok() {
            Outcome::Ok
        } else {
            Outcome::Error
        };
        self.monitor
            .report(QueryReport {
                repository: E::COLLECTION,
                operation,
                correlation_id: Uuid::new_v4(),
                outcome,
                duration_ms: started.elapsed().as_millis() as u64,
                filters,
            })
            .await;
        result
    }
}

fn to_record<E: EntityRecord>(entity: &E) -> Result<Value> {
    serde_json::to_value(entity).map_err(|e| RepositoryError::Serialization(e.to_string()))
}

fn from_record<E: EntityRecord>(record: Value) -> Result<E> {
    serde_json::from_value(record).map_err(|e| RepositoryError::Serialization(e.to_string()))
}

fn describe_filter(filter: Option<&Filter>) -> Option<String> {
    filter.and_then(|f| serde_json::to_string(f).ok())
}
