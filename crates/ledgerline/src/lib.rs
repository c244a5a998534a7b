//! Ledgerline data-access engine.
//!
//! Composed implementations of the contracts in [`ledgerline_core`]: an
//! in-memory LRU cache backend, an in-memory transactional store, the
//! optimistic-concurrency base repository, the paginated/streaming
//! repository, the transaction manager, and the balance-ledger repository.
//!
//! Everything is wired by explicit construction: backends and collaborators
//! are passed in, never resolved from globals, so each layer can be tested
//! and substituted on its own.

pub mod cache;
pub mod config;
pub mod ledger;
pub mod observe;
pub mod repository;
pub mod store;
