//! Cursor pagination, streaming, and batch traversal over the base
//! repository.
//!
//! Pages are fetched lazily: the stream issues one cursor query per batch
//! and terminates when the engine reports no further page. A stream is
//! restartable only by a fresh call with an explicit starting cursor; it is
//! not resumable mid-stream after an error.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_stream::try_stream;
use futures_util::{pin_mut, Stream, StreamExt};

use ledgerline_core::cache::Cache;
use ledgerline_core::pagination::{
    build_query, into_connection, process_results, Connection, Direction, PageRequest, PageResult,
    DEFAULT_MAX_LIMIT,
};
use ledgerline_core::query::{Filter, QueryOptions, SortOrder, SortSpec};
use ledgerline_core::store::{EntityRecord, RepositoryError, Result, Store};

use crate::config::EngineConfig;

use super::Repository;

/// Pagination tuning for a repository.
#[derive(Debug, Clone, Copy)]
pub struct PageConfig {
    /// Upper bound page sizes are clamped to.
    pub max_limit: u32,
    /// Rows fetched per streamed batch when the caller does not say.
    pub stream_batch_size: u32,
    /// Safety valve for [`PaginatedRepository::find_all`].
    pub stream_max_records: usize,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            max_limit: DEFAULT_MAX_LIMIT,
            stream_batch_size: 100,
            stream_max_records: 10_000,
        }
    }
}

/// Options for streamed traversal.
#[derive(Debug, Clone)]
pub struct StreamOptions {
    /// Rows per batch; falls back to [`PageConfig::stream_batch_size`].
    pub batch_size: Option<u32>,
    pub filter: Option<Filter>,
    pub sort_field: String,
    pub sort_order: SortOrder,
    /// Resume point; `None` starts from the beginning of the set.
    pub start_cursor: Option<String>,
    /// Record ceiling for [`PaginatedRepository::find_all`]; falls back to
    /// [`PageConfig::stream_max_records`].
    pub max_records: Option<usize>,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            batch_size: None,
            filter: None,
            sort_field: "created_at".to_string(),
            sort_order: SortOrder::Asc,
            start_cursor: None,
            max_records: None,
        }
    }
}

/// Options for batch processing.
#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    /// Process batches concurrently instead of in order.
    pub parallel: bool,
    /// In-flight ceiling for parallel mode.
    pub max_concurrency: usize,
    /// How often the wait-and-check loop polls for a free slot. Polling is
    /// a known throughput ceiling, acceptable because batch counts are
    /// small relative to the poll granularity.
    pub poll_interval: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            parallel: false,
            max_concurrency: 4,
            poll_interval: Duration::from_millis(25),
        }
    }
}

/// Totals from a batch-processing run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub batches: usize,
    pub records: usize,
}

/// Repository with cursor queries, streaming, and batch traversal.
///
/// Wraps a [`Repository`] by composition; CRUD goes through
/// [`Self::base`].
pub struct PaginatedRepository<E, S, C>
where
    E: EntityRecord,
    S: Store,
    C: Cache,
{
    base: Repository<E, S, C>,
    page: PageConfig,
}

impl<E, S, C> Clone for PaginatedRepository<E, S, C>
where
    E: EntityRecord,
    S: Store,
    C: Cache,
{
    fn clone(&self) -> Self {
        Self {
            base: self.base.clone(),
            page: self.page,
        }
    }
}

impl<E, S, C> PaginatedRepository<E, S, C>
where
    E: EntityRecord,
    S: Store,
    C: Cache,
{
    pub fn new(base: Repository<E, S, C>) -> Self {
        Self {
            base,
            page: PageConfig::default(),
        }
    }

    pub fn with_page_config(mut self, page: PageConfig) -> Self {
        self.page = page;
        self
    }

    /// Applies the pagination and streaming limits from an engine
    /// configuration.
    pub fn with_config(mut self, config: &EngineConfig) -> Self {
        self.page = PageConfig {
            max_limit: config.page_max_limit,
            stream_batch_size: config.stream_batch_size,
            stream_max_records: config.stream_max_records,
        };
        self
    }

    /// The wrapped CRUD repository.
    pub fn base(&self) -> &Repository<E, S, C> {
        &self.base
    }

    /// Fetches one page of results by cursor.
    pub async fn find_page(
        &self,
        request: &PageRequest,
        base_filter: Option<Filter>,
    ) -> Result<PageResult<E>> {
        let options = build_query(request, base_filter.clone(), self.page.max_limit);
        let rows = self.base.find_many_records(&options).await?;

        let total_count = if request.include_total {
            Some(self.base.count(base_filter.as_ref()).await?)
        } else {
            None
        };

        process_results(rows, request, total_count, self.page.max_limit)
            .try_map(serde_json::from_value)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))
    }

    /// Fetches one page as a relay-style connection, each row carrying its
    /// own cursor.
    pub async fn find_connection(
        &self,
        request: &PageRequest,
        base_filter: Option<Filter>,
    ) -> Result<Connection<E>> {
        let options = build_query(request, base_filter.clone(), self.page.max_limit);
        let rows = self.base.find_many_records(&options).await?;

        let total_count = if request.include_total {
            Some(self.base.count(base_filter.as_ref()).await?)
        } else {
            None
        };

        let page = process_results(rows, request, total_count, self.page.max_limit);
        into_connection(page, &request.sort_field)
            .try_map(serde_json::from_value)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))
    }

    /// Legacy offset paging for callers that still page by row position.
    pub async fn find_offset(
        &self,
        filter: Option<Filter>,
        order_by: Vec<SortSpec>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<E>> {
        let options = QueryOptions {
            filter,
            order_by,
            limit: Some(limit.min(self.page.max_limit as usize).max(1)),
            offset: Some(offset),
        };
        self.base.find_many(&options).await
    }

    /// Streams the matching rows as batches.
    ///
    /// Lazy: each batch is fetched only when consumed. Finite: the stream
    /// ends when the engine reports no further page. Never yields an empty
    /// batch.
    pub fn find_stream(
        &self,
        options: StreamOptions,
    ) -> impl Stream<Item = Result<Vec<E>>> + '_ {
        let batch_size = options.batch_size.unwrap_or(self.page.stream_batch_size);

        try_stream! {
            let mut cursor = options.start_cursor.clone();
            loop {
                let request = PageRequest {
                    limit: Some(batch_size),
                    cursor: cursor.clone(),
                    direction: Direction::Forward,
                    sort_field: options.sort_field.clone(),
                    sort_order: options.sort_order,
                    include_total: false,
                };
                let page = self.find_page(&request, options.filter.clone()).await?;
                let has_next = page.page_info.has_next_page;
                let end_cursor = page.page_info.end_cursor.clone();

                if !page.data.is_empty() {
                    yield page.data;
                }
                if !has_next {
                    break;
                }
                cursor = end_cursor;
            }
        }
    }

    /// Drains [`Self::find_stream`] into a single list, truncating at the
    /// record ceiling.
    ///
    /// Truncation logs a warning and returns what was collected; it is a
    /// safety valve against unbounded memory growth, not an error.
    pub async fn find_all(&self, options: StreamOptions) -> Result<Vec<E>> {
        let max_records = options.max_records.unwrap_or(self.page.stream_max_records);
        let stream = self.find_stream(options);
        pin_mut!(stream);

        let mut all = Vec::new();
        while let Some(batch) = stream.next().await {
            for entity in batch? {
                if all.len() >= max_records {
                    tracing::warn!(
                        collection = E::COLLECTION,
                        max_records,
                        "find_all hit the record ceiling, truncating result set"
                    );
                    return Ok(all);
                }
                all.push(entity);
            }
        }
        Ok(all)
    }

    /// Feeds each streamed batch to `processor`.
    ///
    /// Sequential mode processes batches in order and stops at the first
    /// error. Parallel mode keeps at most `max_concurrency` batches in
    /// flight, bounded by a poll loop, and surfaces the first failure after
    /// all spawned work settles.
    pub async fn process_batches<P, Fut>(
        &self,
        options: StreamOptions,
        batch_options: BatchOptions,
        processor: P,
    ) -> Result<BatchStats>
    where
        P: Fn(Vec<E>, usize) -> Fut + Clone + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let stream = self.find_stream(options);
        pin_mut!(stream);

        let mut stats = BatchStats::default();

        if !batch_options.parallel {
            while let Some(batch) = stream.next().await {
                let batch = batch?;
                stats.records += batch.len();
                processor(batch, stats.batches).await?;
                stats.batches += 1;
            }
            return Ok(stats);
        }

        let max_concurrency = batch_options.max_concurrency.max(1);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::new();

        while let Some(batch) = stream.next().await {
            let batch = batch?;
            stats.records += batch.len();
            let index = stats.batches;
            stats.batches += 1;

            // Wait-and-check loop; trades scheduling latency for having no
            // queue primitive between the stream and the workers.
            while in_flight.load(Ordering::SeqCst) >= max_concurrency {
                tokio::time::sleep(batch_options.poll_interval).await;
            }

            in_flight.fetch_add(1, Ordering::SeqCst);
            let processor = processor.clone();
            let in_flight = Arc::clone(&in_flight);
            handles.push(tokio::spawn(async move {
                let result = processor(batch, index).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                result
            }));
        }

        let mut first_error = None;
        for handle in handles {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
                Err(err) => {
                    if first_error.is_none() {
                        first_error =
                            Some(RepositoryError::Storage(format!("batch task failed: {err}")));
                    }
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(stats),
        }
    }
}
