mod repository;

pub use repository::{BalanceValidation, LedgerRepository};
