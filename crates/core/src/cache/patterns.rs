//! Pattern matching for cache keys.
//!
//! The key scheme only ever produces prefix patterns (`"cards:findMany:*"`),
//! so matching supports a trailing `*` wildcard plus exact comparison. This
//! is deliberately not a general glob engine.

/// Checks whether a cache key matches a pattern.
///
/// A pattern ending in `*` matches any key starting with the part before
/// the wildcard; any other pattern must match the key exactly.
///
/// # Examples
///
/// ```
/// use ledgerline_core::cache::pattern_matches;
///
/// assert!(pattern_matches("cards:findMany:*", "cards:findMany:00ff"));
/// assert!(pattern_matches("cards:count:1", "cards:count:1"));
/// assert!(!pattern_matches("cards:findMany:*", "ledger_entries:findMany:00ff"));
/// ```
pub fn pattern_matches(pattern: &str, key: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => key.starts_with(prefix),
        None => pattern == key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(pattern_matches("cards:count:1", "cards:count:1"));
        assert!(!pattern_matches("cards:count:1", "cards:count:2"));
    }

    #[test]
    fn test_prefix_match() {
        assert!(pattern_matches("cards:findMany:*", "cards:findMany:deadbeef"));
        assert!(pattern_matches("cards:*", "cards:findById:abc"));
        assert!(!pattern_matches("cards:findMany:*", "cards:count:deadbeef"));
    }

    #[test]
    fn test_bare_wildcard_matches_everything() {
        assert!(pattern_matches("*", "anything:at:all"));
        assert!(pattern_matches("*", ""));
    }

    #[test]
    fn test_empty_pattern_only_matches_empty_key() {
        assert!(pattern_matches("", ""));
        assert!(!pattern_matches("", "cards:count:1"));
    }

    #[test]
    fn test_namespace_isolation() {
        assert!(!pattern_matches(
            "cards:findMany:*",
            "cardholders:findMany:deadbeef"
        ));
    }
}
