//! Pure ledger invariant checks.
//!
//! Both checks run before persistence; a violating entry is rejected and
//! never written.

use thiserror::Error;

use super::LedgerEntry;

/// Tolerance for balance comparisons.
pub const BALANCE_EPSILON: f64 = 0.01;

/// A rejected ledger entry.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerViolation {
    #[error(
        "Balance delta mismatch: {kind:?} of {amount} implies a delta of {expected}, entry moves {actual}"
    )]
    DeltaMismatch {
        kind: super::LedgerEntryKind,
        amount: f64,
        expected: f64,
        actual: f64,
    },
    #[error(
        "Balance continuity broken: previous entry ended at {previous_after}, new entry starts at {balance_before}"
    )]
    ContinuityBroken {
        previous_after: f64,
        balance_before: f64,
    },
}

/// Checks that `balance_after - balance_before` equals the signed delta
/// implied by the entry's kind and amount, within [`BALANCE_EPSILON`].
pub fn check_delta(entry: &LedgerEntry) -> Result<(), LedgerViolation> {
    let expected = entry.kind.expected_delta(entry.amount);
    let actual = entry.balance_after - entry.balance_before;
    if (actual - expected).abs() > BALANCE_EPSILON {
        return Err(LedgerViolation::DeltaMismatch {
            kind: entry.kind,
            amount: entry.amount,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Checks that the entry's starting balance equals the previous entry's
/// ending balance, within [`BALANCE_EPSILON`].
///
/// A subject with no prior entries is exempt.
pub fn check_continuity(
    entry: &LedgerEntry,
    previous: Option<&LedgerEntry>,
) -> Result<(), LedgerViolation> {
    let Some(previous) = previous else {
        return Ok(());
    };
    if (previous.balance_after - entry.balance_before).abs() > BALANCE_EPSILON {
        return Err(LedgerViolation::ContinuityBroken {
            previous_after: previous.balance_after,
            balance_before: entry.balance_before,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LedgerEntryKind;
    use uuid::Uuid;

    fn subject() -> Uuid {
        Uuid::nil()
    }

    #[test]
    fn test_delta_accepts_credit() {
        let entry = LedgerEntry::new(subject(), LedgerEntryKind::Deposit, 100.0, 500.0, 600.0);
        assert!(check_delta(&entry).is_ok());
    }

    #[test]
    fn test_delta_accepts_debit() {
        let entry = LedgerEntry::new(subject(), LedgerEntryKind::Withdrawal, 100.0, 500.0, 400.0);
        assert!(check_delta(&entry).is_ok());
    }

    #[test]
    fn test_delta_accepts_within_epsilon() {
        let entry = LedgerEntry::new(subject(), LedgerEntryKind::Deposit, 100.0, 500.0, 600.009);
        assert!(check_delta(&entry).is_ok());
    }

    #[test]
    fn test_delta_rejects_mismatch() {
        let entry = LedgerEntry::new(subject(), LedgerEntryKind::Deposit, 100.0, 500.0, 550.0);
        assert!(matches!(
            check_delta(&entry),
            Err(LedgerViolation::DeltaMismatch { .. })
        ));
    }

    #[test]
    fn test_delta_rejects_debit_applied_as_credit() {
        let entry = LedgerEntry::new(subject(), LedgerEntryKind::Fee, 10.0, 500.0, 510.0);
        assert!(check_delta(&entry).is_err());
    }

    #[test]
    fn test_delta_accepts_signed_adjustment() {
        let down = LedgerEntry::new(subject(), LedgerEntryKind::Adjustment, -50.0, 500.0, 450.0);
        assert!(check_delta(&down).is_ok());

        let up = LedgerEntry::new(subject(), LedgerEntryKind::Adjustment, 50.0, 500.0, 550.0);
        assert!(check_delta(&up).is_ok());
    }

    #[test]
    fn test_continuity_exempts_first_entry() {
        let entry = LedgerEntry::new(subject(), LedgerEntryKind::Deposit, 100.0, 0.0, 100.0);
        assert!(check_continuity(&entry, None).is_ok());
    }

    #[test]
    fn test_continuity_accepts_matching_chain() {
        let previous = LedgerEntry::new(subject(), LedgerEntryKind::Deposit, 100.0, 0.0, 100.0);
        let next = LedgerEntry::new(subject(), LedgerEntryKind::Fee, 2.5, 100.0, 97.5);
        assert!(check_continuity(&next, Some(&previous)).is_ok());
    }

    #[test]
    fn test_continuity_rejects_gap() {
        let previous = LedgerEntry::new(subject(), LedgerEntryKind::Withdrawal, 100.0, 500.0, 400.0);
        let next = LedgerEntry::new(subject(), LedgerEntryKind::Withdrawal, 50.0, 450.0, 400.0);
        assert_eq!(
            check_continuity(&next, Some(&previous)),
            Err(LedgerViolation::ContinuityBroken {
                previous_after: 400.0,
                balance_before: 450.0,
            })
        );
    }
}
