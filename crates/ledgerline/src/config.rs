use std::{env, time::Duration};

/// Engine configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Single-entity read TTL in seconds (default: 300)
    pub entity_cache_ttl_seconds: u64,
    /// List read TTL in seconds (default: 60)
    pub list_cache_ttl_seconds: u64,
    /// Count read TTL in seconds (default: 30)
    pub count_cache_ttl_seconds: u64,
    /// Maximum number of cache entries (default: 10,000)
    pub cache_max_entries: usize,
    /// Default page size when a request leaves it unset (default: 50)
    pub page_default_limit: u32,
    /// Upper bound page sizes are clamped to (default: 1,000)
    pub page_max_limit: u32,
    /// Rows fetched per streamed batch (default: 100)
    pub stream_batch_size: u32,
    /// Safety valve when draining a stream into memory (default: 10,000)
    pub stream_max_records: usize,
    /// In-flight batch ceiling for parallel processing (default: 4)
    pub batch_max_concurrency: usize,
    /// Poll interval for the batch concurrency wait loop (default: 25ms)
    pub batch_poll_interval_ms: u64,
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `ENTITY_CACHE_TTL_SECONDS` - Single-entity read TTL (default: 300)
    /// - `LIST_CACHE_TTL_SECONDS` - List read TTL (default: 60)
    /// - `COUNT_CACHE_TTL_SECONDS` - Count read TTL (default: 30)
    /// - `CACHE_MAX_ENTRIES` - Maximum cache entries (default: 10,000)
    /// - `PAGE_DEFAULT_LIMIT` - Default page size (default: 50)
    /// - `PAGE_MAX_LIMIT` - Maximum page size (default: 1,000)
    /// - `STREAM_BATCH_SIZE` - Rows per streamed batch (default: 100)
    /// - `STREAM_MAX_RECORDS` - Drain safety valve (default: 10,000)
    /// - `BATCH_MAX_CONCURRENCY` - Parallel batch ceiling (default: 4)
    /// - `BATCH_POLL_INTERVAL_MS` - Concurrency poll interval (default: 25)
    pub fn from_env() -> Self {
        Self {
            entity_cache_ttl_seconds: env_parse("ENTITY_CACHE_TTL_SECONDS", 300),
            list_cache_ttl_seconds: env_parse("LIST_CACHE_TTL_SECONDS", 60),
            count_cache_ttl_seconds: env_parse("COUNT_CACHE_TTL_SECONDS", 30),
            cache_max_entries: env_parse("CACHE_MAX_ENTRIES", 10_000),
            page_default_limit: env_parse("PAGE_DEFAULT_LIMIT", 50),
            page_max_limit: env_parse("PAGE_MAX_LIMIT", 1_000),
            stream_batch_size: env_parse("STREAM_BATCH_SIZE", 100),
            stream_max_records: env_parse("STREAM_MAX_RECORDS", 10_000),
            batch_max_concurrency: env_parse("BATCH_MAX_CONCURRENCY", 4),
            batch_poll_interval_ms: env_parse("BATCH_POLL_INTERVAL_MS", 25),
        }
    }

    /// Get the single-entity read TTL as a Duration.
    pub fn entity_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.entity_cache_ttl_seconds)
    }

    /// Get the list read TTL as a Duration.
    pub fn list_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.list_cache_ttl_seconds)
    }

    /// Get the count read TTL as a Duration.
    pub fn count_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.count_cache_ttl_seconds)
    }

    /// Get the batch poll interval as a Duration.
    pub fn batch_poll_interval(&self) -> Duration {
        Duration::from_millis(self.batch_poll_interval_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
