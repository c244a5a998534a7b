mod base;
mod paginated;
mod transaction;

pub use base::Repository;
pub use paginated::{BatchOptions, BatchStats, PageConfig, PaginatedRepository, StreamOptions};
pub use transaction::{TransactionContext, TransactionManager};
