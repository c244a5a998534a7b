//! In-memory store backend.
//!
//! Reference and test backend implementing the store contract over JSON
//! records held in process memory. All collections live behind a single
//! lock so a transaction snapshot is consistent across collections.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use ledgerline_core::query::{compare_values, Filter, QueryOptions, SortOrder};
use ledgerline_core::store::{Store, StoreError, TransactionalStore};

type Collections = HashMap<String, BTreeMap<Uuid, Value>>;

#[derive(Debug, Default)]
struct StoreState {
    collections: Collections,
    txn_depth: usize,
    /// Snapshot taken at the outermost `begin`, restored on rollback.
    snapshot: Option<Collections>,
    /// Set once any scope rolls back; the outermost resolution restores the
    /// snapshot even if outer scopes try to commit.
    rollback_only: bool,
}

/// In-memory store backend.
///
/// Data is not persisted and is lost when the store is dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<StoreState>>,
}

impl MemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in a collection, ignoring any filter.
    pub async fn len(&self, collection: &str) -> usize {
        let state = self.state.read().await;
        state
            .collections
            .get(collection)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }

    pub async fn is_empty(&self, collection: &str) -> bool {
        self.len(collection).await == 0
    }
}

fn record_version(record: &Value) -> u64 {
    record.get("version").and_then(Value::as_u64).unwrap_or(0)
}

fn sort_rows(rows: &mut [Value], options: &QueryOptions) {
    if options.order_by.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        for spec in &options.order_by {
            let av = a.get(&spec.field).unwrap_or(&Value::Null);
            let bv = b.get(&spec.field).unwrap_or(&Value::Null);
            let ord = match spec.order {
                SortOrder::Asc => compare_values(av, bv),
                SortOrder::Desc => compare_values(bv, av),
            };
            if !ord.is_eq() {
                return ord;
            }
        }
        std::cmp::Ordering::Equal
    });
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, collection: &str, id: Uuid) -> Result<Option<Value>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .collections
            .get(collection)
            .and_then(|records| records.get(&id))
            .cloned())
    }

    async fn insert(&self, collection: &str, id: Uuid, record: Value) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let records = state.collections.entry(collection.to_string()).or_default();
        if records.contains_key(&id) {
            return Err(StoreError::DuplicateId);
        }
        records.insert(id, record);
        Ok(())
    }

    async fn put(
        &self,
        collection: &str,
        id: Uuid,
        record: Value,
        expected_version: Option<u64>,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let records = state.collections.entry(collection.to_string()).or_default();
        let Some(existing) = records.get(&id) else {
            return Err(StoreError::NotFound);
        };

        if let Some(expected) = expected_version {
            let actual = record_version(existing);
            if actual != expected {
                return Err(StoreError::VersionConflict { expected, actual });
            }
        }

        records.insert(id, record);
        Ok(())
    }

    async fn remove(&self, collection: &str, id: Uuid) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let removed = state
            .collections
            .get_mut(collection)
            .and_then(|records| records.remove(&id));
        if removed.is_none() {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        options: &QueryOptions,
    ) -> Result<Vec<Value>, StoreError> {
        let state = self.state.read().await;
        let mut rows: Vec<Value> = state
            .collections
            .get(collection)
            .map(|records| {
                records
                    .values()
                    .filter(|row| {
                        options
                            .filter
                            .as_ref()
                            .map(|f| f.matches(row))
                            .unwrap_or(true)
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        drop(state);

        sort_rows(&mut rows, options);

        let offset = options.offset.unwrap_or(0);
        if offset > 0 {
            rows = rows.into_iter().skip(offset).collect();
        }
        if let Some(limit) = options.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn count(&self, collection: &str, filter: Option<&Filter>) -> Result<u64, StoreError> {
        let state = self.state.read().await;
        let count = state
            .collections
            .get(collection)
            .map(|records| {
                records
                    .values()
                    .filter(|row| filter.map(|f| f.matches(row)).unwrap_or(true))
                    .count()
            })
            .unwrap_or(0);
        Ok(count as u64)
    }
}

#[async_trait]
impl TransactionalStore for MemoryStore {
    async fn begin(&self) -> Result<usize, StoreError> {
        let mut state = self.state.write().await;
        state.txn_depth += 1;
        if state.txn_depth == 1 {
            state.snapshot = Some(state.collections.clone());
            state.rollback_only = false;
        }
        Ok(state.txn_depth)
    }

    async fn commit(&self) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if state.txn_depth == 0 {
            return Err(StoreError::Backend("commit outside transaction".to_string()));
        }
        state.txn_depth -= 1;
        if state.txn_depth == 0 {
            if state.rollback_only {
                // An inner scope rolled back; the whole transaction is void.
                if let Some(snapshot) = state.snapshot.take() {
                    state.collections = snapshot;
                }
            } else {
                state.snapshot = None;
            }
        }
        Ok(())
    }

    async fn rollback(&self) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if state.txn_depth == 0 {
            return Err(StoreError::Backend(
                "rollback outside transaction".to_string(),
            ));
        }
        state.txn_depth -= 1;
        state.rollback_only = true;
        if state.txn_depth == 0 {
            if let Some(snapshot) = state.snapshot.take() {
                state.collections = snapshot;
            }
        }
        Ok(())
    }
}
