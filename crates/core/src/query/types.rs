//! Query options handed to store backends.

use serde::{Deserialize, Serialize};

use super::Filter;

/// Sort direction for a single sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Returns the opposite order.
    pub fn reverse(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

/// One sort key: field name plus direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }
}

/// The full query contract consumed by a store backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryOptions {
    pub filter: Option<Filter>,
    pub order_by: Vec<SortSpec>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

// FNV-1a; deterministic across processes so list/count cache keys stay
// stable when the cache backend is shared between instances.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// Stable hash of a filter, for `count:<hash>` cache keys.
pub fn stable_filter_hash(filter: Option<&Filter>) -> u64 {
    match filter {
        Some(filter) => fnv1a(&serde_json::to_vec(filter).unwrap_or_default()),
        None => fnv1a(b"null"),
    }
}

/// Stable hash of full query options, for `findMany:<hash>` cache keys.
pub fn stable_query_hash(options: &QueryOptions) -> u64 {
    fnv1a(&serde_json::to_vec(options).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sort_order_reverse() {
        assert_eq!(SortOrder::Asc.reverse(), SortOrder::Desc);
        assert_eq!(SortOrder::Desc.reverse(), SortOrder::Asc);
    }

    #[test]
    fn test_filter_hash_is_stable() {
        let f = Filter::Eq("status".into(), json!("active"));
        assert_eq!(stable_filter_hash(Some(&f)), stable_filter_hash(Some(&f)));
    }

    #[test]
    fn test_filter_hash_distinguishes_filters() {
        let a = Filter::Eq("status".into(), json!("active"));
        let b = Filter::Eq("status".into(), json!("closed"));
        assert_ne!(stable_filter_hash(Some(&a)), stable_filter_hash(Some(&b)));
        assert_ne!(stable_filter_hash(Some(&a)), stable_filter_hash(None));
    }

    #[test]
    fn test_query_hash_covers_limit_and_order() {
        let base = QueryOptions {
            filter: None,
            order_by: vec![SortSpec::new("created_at", SortOrder::Asc)],
            limit: Some(50),
            offset: None,
        };
        let mut other = base.clone();
        other.limit = Some(51);

        assert_eq!(stable_query_hash(&base), stable_query_hash(&base));
        assert_ne!(stable_query_hash(&base), stable_query_hash(&other));
    }
}
