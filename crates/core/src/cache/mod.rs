mod error;
mod keys;
mod layer;
mod patterns;
mod serialization;
mod traits;

pub use error::{CacheError, Result};
pub use keys::{
    count_key, count_pattern, entity_key, list_key, list_pattern, namespace_of_key,
    namespace_pattern,
};
pub use layer::{CacheLayer, CachePolicy};
pub use patterns::pattern_matches;
pub use serialization::{from_cache_bytes, to_cache_bytes};
pub use traits::Cache;
