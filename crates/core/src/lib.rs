//! Core contracts and engines for the ledgerline data-access layer.
//!
//! This crate holds the pure pieces of the engine: the cursor codec, the
//! query model handed to store backends, the cursor-pagination engine, the
//! cache contracts with their read-through layer, the storage contracts with
//! their typed errors, and the balance-ledger types with their invariant
//! checks. Implementations (backends, repositories) live in the `ledgerline`
//! crate.

pub mod cache;
pub mod cursor;
pub mod ledger;
pub mod pagination;
pub mod query;
pub mod store;
