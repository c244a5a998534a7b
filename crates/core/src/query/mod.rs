mod filter;
mod types;

pub use filter::{compare_values, Filter};
pub use types::{stable_filter_hash, stable_query_hash, QueryOptions, SortOrder, SortSpec};
