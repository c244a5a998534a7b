use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::query::{Filter, QueryOptions};

use super::StoreError;

/// The store-client contract the engine is layered on.
///
/// Records are JSON objects carrying `id`, `created_at`, and `version`
/// fields. The backend owns connection handling, timeouts, and
/// cancellation; the engine awaits each call to completion or failure.
#[async_trait]
pub trait Store: Send + Sync {
    /// Fetches a record by id.
    async fn get(&self, collection: &str, id: Uuid) -> Result<Option<Value>, StoreError>;

    /// Inserts a new record; fails with [`StoreError::DuplicateId`] when the
    /// id is taken.
    async fn insert(&self, collection: &str, id: Uuid, record: Value) -> Result<(), StoreError>;

    /// Replaces a record. When `expected_version` is set the write only
    /// succeeds if the stored record still carries that version
    /// (optimistic lock); otherwise [`StoreError::VersionConflict`].
    async fn put(
        &self,
        collection: &str,
        id: Uuid,
        record: Value,
        expected_version: Option<u64>,
    ) -> Result<(), StoreError>;

    /// Removes a record by id.
    async fn remove(&self, collection: &str, id: Uuid) -> Result<(), StoreError>;

    /// Runs a filtered, sorted, bounded query.
    async fn query(
        &self,
        collection: &str,
        options: &QueryOptions,
    ) -> Result<Vec<Value>, StoreError>;

    /// Counts records matching a filter.
    async fn count(&self, collection: &str, filter: Option<&Filter>) -> Result<u64, StoreError>;
}

/// A store that supports scoped transactions.
///
/// Scopes nest by reuse: an inner `begin` joins the outer scope instead of
/// opening a new one, and only the outermost `commit`/`rollback` resolves
/// the transaction.
#[async_trait]
pub trait TransactionalStore: Store {
    /// Opens (or joins) a transaction scope; returns the nesting depth,
    /// starting at 1 for the outermost scope.
    async fn begin(&self) -> Result<usize, StoreError>;

    /// Commits the current scope. The outermost commit makes the
    /// transaction's writes durable.
    async fn commit(&self) -> Result<(), StoreError>;

    /// Rolls back the current scope. Any rollback poisons the transaction:
    /// when the outermost scope resolves, all writes made since the
    /// outermost `begin` are discarded.
    async fn rollback(&self) -> Result<(), StoreError>;
}
