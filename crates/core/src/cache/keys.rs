//! Cache key construction.
//!
//! Keys are namespaced by the repository's collection name so that all
//! derived reads for a collection can be invalidated together:
//! `{namespace}:findById:{id}`, `{namespace}:findMany:{hash}`,
//! `{namespace}:count:{hash}`.

use uuid::Uuid;

/// Returns the cache key for a single entity read.
pub fn entity_key(namespace: &str, id: Uuid) -> String {
    format!("{namespace}:findById:{id}")
}

/// Returns the cache key for a list read, keyed by a stable query hash.
pub fn list_key(namespace: &str, query_hash: u64) -> String {
    format!("{namespace}:findMany:{query_hash:016x}")
}

/// Returns the cache key for a count read, keyed by a stable filter hash.
pub fn count_key(namespace: &str, filter_hash: u64) -> String {
    format!("{namespace}:count:{filter_hash:016x}")
}

/// Returns the pattern matching all list keys for a namespace.
pub fn list_pattern(namespace: &str) -> String {
    format!("{namespace}:findMany:*")
}

/// Returns the pattern matching all count keys for a namespace.
pub fn count_pattern(namespace: &str) -> String {
    format!("{namespace}:count:*")
}

/// Returns the pattern matching every key in a namespace.
pub fn namespace_pattern(namespace: &str) -> String {
    format!("{namespace}:*")
}

/// Extracts the namespace from a cache key or pattern, if well-formed.
///
/// Used by backends to track keys per namespace for efficient sweeps.
/// Returns `None` when the namespace segment is empty or wildcarded.
pub fn namespace_of_key(key: &str) -> Option<&str> {
    let namespace = key.split(':').next()?;
    if namespace.is_empty() || namespace.contains('*') {
        return None;
    }
    Some(namespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_uuid() -> Uuid {
        Uuid::nil()
    }

    #[test]
    fn test_entity_key() {
        assert_eq!(
            entity_key("cards", test_uuid()),
            "cards:findById:00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_list_key_is_hex_padded() {
        assert_eq!(list_key("cards", 0x2a), "cards:findMany:000000000000002a");
    }

    #[test]
    fn test_count_key() {
        assert_eq!(count_key("cards", 1), "cards:count:0000000000000001");
    }

    #[test]
    fn test_patterns() {
        assert_eq!(list_pattern("cards"), "cards:findMany:*");
        assert_eq!(count_pattern("cards"), "cards:count:*");
        assert_eq!(namespace_pattern("cards"), "cards:*");
    }

    #[test]
    fn test_namespace_of_key() {
        assert_eq!(namespace_of_key(&entity_key("cards", test_uuid())), Some("cards"));
        assert_eq!(namespace_of_key(&list_pattern("ledger_entries")), Some("ledger_entries"));
        assert_eq!(namespace_of_key("*:findMany:*"), None);
        assert_eq!(namespace_of_key(":odd"), None);
    }
}
