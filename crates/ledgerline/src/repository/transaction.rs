//! Scoped transaction execution.
//!
//! Groups multi-entity writes into one store transaction: commit on normal
//! return, rollback on error with the original error re-raised unchanged.
//! Nested calls reuse the outer scope rather than opening a new one.

use std::sync::Arc;

use futures_util::future::BoxFuture;

use ledgerline_core::store::{RepositoryError, Result, TransactionalStore};

/// Marker handed to a transaction body.
#[derive(Debug, Clone, Copy)]
pub struct TransactionContext {
    depth: usize,
}

impl TransactionContext {
    /// Nesting depth of this scope; 1 for the outermost.
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// Runs closures inside store transaction scopes.
pub struct TransactionManager<S> {
    store: Arc<S>,
}

impl<S> Clone for TransactionManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: TransactionalStore> TransactionManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Opens a scope, runs `body`, commits on `Ok` and rolls back on `Err`.
    ///
    /// The body's error is re-raised unchanged; a rollback failure on top
    /// of it is logged, not surfaced. Calling `execute` from inside a
    /// running body joins the outer scope (the store tracks depth), so the
    /// whole tree commits or rolls back together.
    pub async fn execute<'a, T, F>(&'a self, body: F) -> Result<T>
    where
        F: FnOnce(TransactionContext) -> BoxFuture<'a, Result<T>>,
    {
        let depth = self
            .store
            .begin()
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        match body(TransactionContext { depth }).await {
            Ok(value) => {
                self.store
                    .commit()
                    .await
                    .map_err(|e| RepositoryError::Storage(e.to_string()))?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.store.rollback().await {
                    tracing::warn!(
                        error = %rollback_err,
                        "Rollback failed after transaction error"
                    );
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use ledgerline_core::store::Store;
    use serde_json::json;
    use uuid::Uuid;

    fn record(id: Uuid) -> serde_json::Value {
        json!({
            "id": id.to_string(),
            "created_at": "2026-01-01T00:00:00Z",
            "version": 0,
        })
    }

    #[tokio::test]
    async fn test_commit_on_success() {
        let store = Arc::new(MemoryStore::new());
        let manager = TransactionManager::new(Arc::clone(&store));
        let id = Uuid::new_v4();

        let value = manager
            .execute(|_tx| {
                let store = Arc::clone(&store);
                Box::pin(async move {
                    store
                        .insert("cards", id, record(id))
                        .await
                        .map_err(|e| RepositoryError::Storage(e.to_string()))?;
                    Ok(7)
                })
            })
            .await
            .unwrap();

        assert_eq!(value, 7);
        assert!(store.get("cards", id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_rollback_on_error_reraises_original() {
        let store = Arc::new(MemoryStore::new());
        let manager = TransactionManager::new(Arc::clone(&store));
        let id = Uuid::new_v4();

        let result: Result<()> = manager
            .execute(|_tx| {
                let store = Arc::clone(&store);
                Box::pin(async move {
                    store
                        .insert("cards", id, record(id))
                        .await
                        .map_err(|e| RepositoryError::Storage(e.to_string()))?;
                    Err(RepositoryError::Validation("business rule broken".to_string()))
                })
            })
            .await;

        assert_eq!(
            result,
            Err(RepositoryError::Validation("business rule broken".to_string()))
        );
        assert!(store.get("cards", id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_nested_execute_reuses_scope() {
        let store = Arc::new(MemoryStore::new());
        let manager = TransactionManager::new(Arc::clone(&store));
        let outer_id = Uuid::new_v4();
        let inner_id = Uuid::new_v4();

        manager
            .execute(|outer_tx| {
                let store = Arc::clone(&store);
                let manager = manager.clone();
                Box::pin(async move {
                    assert_eq!(outer_tx.depth(), 1);
                    store
                        .insert("cards", outer_id, record(outer_id))
                        .await
                        .map_err(|e| RepositoryError::Storage(e.to_string()))?;

                    manager
                        .execute(|inner_tx| {
                            let store = Arc::clone(&store);
                            Box::pin(async move {
                                assert_eq!(inner_tx.depth(), 2);
                                store
                                    .insert("cards", inner_id, record(inner_id))
                                    .await
                                    .map_err(|e| RepositoryError::Storage(e.to_string()))
                            })
                        })
                        .await?;
                    Ok(())
                })
            })
            .await
            .unwrap();

        assert!(store.get("cards", outer_id).await.unwrap().is_some());
        assert!(store.get("cards", inner_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_inner_failure_voids_outer_writes() {
        let store = Arc::new(MemoryStore::new());
        let manager = TransactionManager::new(Arc::clone(&store));
        let outer_id = Uuid::new_v4();

        let result: Result<()> = manager
            .execute(|_tx| {
                let store = Arc::clone(&store);
                let manager = manager.clone();
                Box::pin(async move {
                    store
                        .insert("cards", outer_id, record(outer_id))
                        .await
                        .map_err(|e| RepositoryError::Storage(e.to_string()))?;

                    manager
                        .execute(|_tx| {
                            Box::pin(async move {
                                Err::<(), _>(RepositoryError::Validation("inner failed".to_string()))
                            })
                        })
                        .await
                })
            })
            .await;

        assert!(result.is_err());
        assert!(store.get("cards", outer_id).await.unwrap().is_none());
    }
}
