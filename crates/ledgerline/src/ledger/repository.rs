//! Balance-ledger repository.
//!
//! A domain consumer of the engine that layers the running-balance
//! invariant over ledger entries: each entry's delta must match its kind
//! and amount, and each entry's starting balance must equal the previous
//! entry's ending balance for the same subject. Entries are append-only;
//! corrections are new adjustment entries.

use std::sync::Arc;

use futures_util::{pin_mut, StreamExt};
use serde_json::Value;
use uuid::Uuid;

use ledgerline_core::cache::Cache;
use ledgerline_core::ledger::{
    check_continuity, check_delta, LedgerEntry, LedgerEntryKind, BALANCE_EPSILON,
};
use ledgerline_core::query::{Filter, QueryOptions, SortOrder, SortSpec};
use ledgerline_core::store::{RepositoryError, Result, TransactionalStore};

use crate::repository::{PaginatedRepository, Repository, StreamOptions, TransactionManager};

/// Outcome of comparing the persisted balance against an expectation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceValidation {
    pub subject_id: Uuid,
    pub persisted: f64,
    pub expected: f64,
    pub matches: bool,
}

/// Append-only ledger over the paginated repository.
pub struct LedgerRepository<S, C>
where
    S: TransactionalStore + 'static,
    C: Cache + 'static,
{
    entries: PaginatedRepository<LedgerEntry, S, C>,
    txn: TransactionManager<S>,
}

impl<S, C> LedgerRepository<S, C>
where
    S: TransactionalStore + 'static,
    C: Cache + 'static,
{
    /// Wires a ledger over a store and cache with default collaborators.
    pub fn new(store: Arc<S>, cache: Arc<C>) -> Self {
        let base = Repository::new(Arc::clone(&store), cache);
        Self {
            entries: PaginatedRepository::new(base),
            txn: TransactionManager::new(store),
        }
    }

    /// Wires a ledger from an already-configured repository (custom audit,
    /// monitoring, TTLs) and transaction manager.
    pub fn from_parts(
        entries: PaginatedRepository<LedgerEntry, S, C>,
        txn: TransactionManager<S>,
    ) -> Self {
        Self { entries, txn }
    }

    /// Read access to the underlying entry repository.
    pub fn entries(&self) -> &PaginatedRepository<LedgerEntry, S, C> {
        &self.entries
    }

    /// Validates and persists a fully-specified entry.
    ///
    /// The delta check runs first; the continuity check re-reads the
    /// subject's latest entry inside the transaction scope so the gate and
    /// the insert resolve together. A violating entry is rejected with
    /// [`RepositoryError::Validation`] and nothing is persisted.
    pub async fn append(&self, entry: LedgerEntry) -> Result<LedgerEntry> {
        check_delta(&entry).map_err(|v| RepositoryError::Validation(v.to_string()))?;

        self.txn
            .execute(move |_tx| {
                Box::pin(async move {
                    let previous = self.latest_entry(entry.subject_id).await?;
                    check_continuity(&entry, previous.as_ref())
                        .map_err(|v| RepositoryError::Validation(v.to_string()))?;
                    self.entries.base().create(entry).await
                })
            })
            .await
    }

    /// Records a movement, deriving the balances from the subject's latest
    /// entry.
    pub async fn record(
        &self,
        subject_id: Uuid,
        kind: LedgerEntryKind,
        amount: f64,
        reference: Option<(String, String)>,
        description: Option<String>,
    ) -> Result<LedgerEntry> {
        let balance_before = self.latest_balance(subject_id).await?;
        let balance_after = balance_before + kind.expected_delta(amount);

        let mut entry = LedgerEntry::new(subject_id, kind, amount, balance_before, balance_after);
        if let Some((reference_type, reference_id)) = reference {
            entry = entry.with_reference(reference_type, reference_id);
        }
        if let Some(description) = description {
            entry = entry.with_description(description);
        }
        self.append(entry).await
    }

    /// The subject's most recent entry, straight from the store.
    ///
    /// Reads bypass the list cache: the continuity gate must compare
    /// against what is actually persisted, not a TTL-stale list.
    pub async fn latest_entry(&self, subject_id: Uuid) -> Result<Option<LedgerEntry>> {
        let options = QueryOptions {
            filter: Some(subject_filter(subject_id)),
            order_by: vec![
                SortSpec::new("created_at", SortOrder::Desc),
                SortSpec::new("id", SortOrder::Desc),
            ],
            limit: Some(1),
            offset: None,
        };
        let mut entries = self.entries.base().find_many_fresh(&options).await?;
        Ok(entries.pop())
    }

    /// The subject's latest ending balance; 0 for a subject with no
    /// entries.
    pub async fn latest_balance(&self, subject_id: Uuid) -> Result<f64> {
        Ok(self
            .latest_entry(subject_id)
            .await?
            .map(|entry| entry.balance_after)
            .unwrap_or(0.0))
    }

    /// Replays every entry for the subject and sums the signed deltas.
    ///
    /// A read-only reconciliation aid; it never mutates existing entries.
    pub async fn recalculate_balance(&self, subject_id: Uuid) -> Result<f64> {
        let stream = self.entries.find_stream(StreamOptions {
            filter: Some(subject_filter(subject_id)),
            ..Default::default()
        });
        pin_mut!(stream);

        let mut balance = 0.0;
        while let Some(batch) = stream.next().await {
            for entry in batch? {
                balance += entry.kind.expected_delta(entry.amount);
            }
        }
        Ok(balance)
    }

    /// Compares the persisted latest balance against a caller-supplied
    /// expectation, within the ledger epsilon.
    pub async fn validate_balance(
        &self,
        subject_id: Uuid,
        expected: f64,
    ) -> Result<BalanceValidation> {
        let persisted = self.latest_balance(subject_id).await?;
        Ok(BalanceValidation {
            subject_id,
            persisted,
            expected,
            matches: (persisted - expected).abs() <= BALANCE_EPSILON,
        })
    }

    /// Corrects the subject's balance to `target_balance` with a new
    /// adjustment entry computed from the current latest balance.
    ///
    /// This is the only sanctioned correction path; history is never
    /// mutated.
    pub async fn adjust_to(
        &self,
        subject_id: Uuid,
        target_balance: f64,
        reference: Option<(String, String)>,
        description: Option<String>,
    ) -> Result<LedgerEntry> {
        let current = self.latest_balance(subject_id).await?;
        let amount = target_balance - current;

        let mut entry = LedgerEntry::new(
            subject_id,
            LedgerEntryKind::Adjustment,
            amount,
            current,
            target_balance,
        );
        if let Some((reference_type, reference_id)) = reference {
            entry = entry.with_reference(reference_type, reference_id);
        }
        if let Some(description) = description {
            entry = entry.with_description(description);
        }
        self.append(entry).await
    }
}

fn subject_filter(subject_id: Uuid) -> Filter {
    Filter::Eq("subject_id".to_string(), Value::String(subject_id.to_string()))
}
