//! Balance-ledger entry types.
//!
//! Ledger entries are immutable once created: corrections are new
//! adjustment entries, never mutations of history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::EntityRecord;

/// The kind of movement a ledger entry records.
///
/// Credit-like kinds add to the balance, debit-like kinds subtract from it,
/// and adjustments carry their signed amount verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryKind {
    Deposit,
    Refund,
    Withdrawal,
    Fee,
    CardFunding,
    Adjustment,
}

impl LedgerEntryKind {
    /// True for kinds that add to the balance.
    pub fn is_credit(self) -> bool {
        matches!(self, LedgerEntryKind::Deposit | LedgerEntryKind::Refund)
    }

    /// True for kinds that subtract from the balance.
    pub fn is_debit(self) -> bool {
        matches!(
            self,
            LedgerEntryKind::Withdrawal | LedgerEntryKind::Fee | LedgerEntryKind::CardFunding
        )
    }

    /// The signed balance delta this kind implies for `amount`.
    pub fn expected_delta(self, amount: f64) -> f64 {
        if self.is_credit() {
            amount
        } else if self.is_debit() {
            -amount
        } else {
            // Adjustment: the amount is already signed.
            amount
        }
    }
}

/// One immutable ledger entry for a subject's running balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub kind: LedgerEntryKind,
    pub amount: f64,
    pub balance_before: f64,
    pub balance_after: f64,
    pub reference_type: Option<String>,
    pub reference_id: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub version: u64,
}

impl LedgerEntry {
    /// Creates an entry with a fresh id and timestamp.
    pub fn new(
        subject_id: Uuid,
        kind: LedgerEntryKind,
        amount: f64,
        balance_before: f64,
        balance_after: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            subject_id,
            kind,
            amount,
            balance_before,
            balance_after,
            reference_type: None,
            reference_id: None,
            description: None,
            created_at: Utc::now(),
            version: 0,
        }
    }

    /// Attaches the originating record this entry refers to.
    pub fn with_reference(
        mut self,
        reference_type: impl Into<String>,
        reference_id: impl Into<String>,
    ) -> Self {
        self.reference_type = Some(reference_type.into());
        self.reference_id = Some(reference_id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl EntityRecord for LedgerEntry {
    const COLLECTION: &'static str = "ledger_entries";

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit_kinds_add() {
        assert_eq!(LedgerEntryKind::Deposit.expected_delta(100.0), 100.0);
        assert_eq!(LedgerEntryKind::Refund.expected_delta(25.5), 25.5);
    }

    #[test]
    fn test_debit_kinds_subtract() {
        assert_eq!(LedgerEntryKind::Withdrawal.expected_delta(100.0), -100.0);
        assert_eq!(LedgerEntryKind::Fee.expected_delta(2.5), -2.5);
        assert_eq!(LedgerEntryKind::CardFunding.expected_delta(40.0), -40.0);
    }

    #[test]
    fn test_adjustment_keeps_sign() {
        assert_eq!(LedgerEntryKind::Adjustment.expected_delta(-12.0), -12.0);
        assert_eq!(LedgerEntryKind::Adjustment.expected_delta(12.0), 12.0);
    }

    #[test]
    fn test_kind_classification_is_exclusive() {
        for kind in [
            LedgerEntryKind::Deposit,
            LedgerEntryKind::Refund,
            LedgerEntryKind::Withdrawal,
            LedgerEntryKind::Fee,
            LedgerEntryKind::CardFunding,
            LedgerEntryKind::Adjustment,
        ] {
            assert!(!(kind.is_credit() && kind.is_debit()));
        }
    }

    #[test]
    fn test_builder_attaches_reference() {
        let entry = LedgerEntry::new(
            Uuid::new_v4(),
            LedgerEntryKind::Deposit,
            100.0,
            0.0,
            100.0,
        )
        .with_reference("payment", "pay_123")
        .with_description("initial deposit");

        assert_eq!(entry.reference_type.as_deref(), Some("payment"));
        assert_eq!(entry.reference_id.as_deref(), Some("pay_123"));
        assert_eq!(entry.description.as_deref(), Some("initial deposit"));
        assert_eq!(entry.version, 0);
    }

    #[test]
    fn test_serialized_form_exposes_engine_fields() {
        let entry = LedgerEntry::new(
            Uuid::new_v4(),
            LedgerEntryKind::Deposit,
            100.0,
            0.0,
            100.0,
        );
        let value = serde_json::to_value(&entry).unwrap();

        assert!(value.get("id").is_some());
        assert!(value.get("created_at").is_some());
        assert_eq!(value.get("version"), Some(&serde_json::json!(0)));
        assert_eq!(value.get("kind"), Some(&serde_json::json!("deposit")));
    }
}
