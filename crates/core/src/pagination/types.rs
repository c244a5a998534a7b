//! Cursor-pagination request and response types.

use serde::{Deserialize, Serialize};

use crate::query::SortOrder;

/// Default page size when the request leaves `limit` unset or zero.
pub const DEFAULT_LIMIT: u32 = 50;

/// Default upper bound a page size is clamped to.
pub const DEFAULT_MAX_LIMIT: u32 = 1000;

/// Traversal direction relative to the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Backward,
}

/// A cursor-pagination request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Requested page size; clamped to `[1, max_limit]`, defaulting when
    /// unset or zero.
    pub limit: Option<u32>,
    /// Opaque cursor from a previous page, if resuming.
    pub cursor: Option<String>,
    pub direction: Direction,
    pub sort_field: String,
    pub sort_order: SortOrder,
    /// Whether to attach `total_count` to the page info (costs a count
    /// query).
    pub include_total: bool,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: None,
            cursor: None,
            direction: Direction::Forward,
            sort_field: "created_at".to_string(),
            sort_order: SortOrder::Asc,
            include_total: false,
        }
    }
}

impl PageRequest {
    /// The page size after clamping: `[1, max_limit]`, defaulting to
    /// [`DEFAULT_LIMIT`] when unset or zero.
    pub fn effective_limit(&self, max_limit: u32) -> usize {
        let requested = match self.limit {
            None | Some(0) => DEFAULT_LIMIT,
            Some(limit) => limit,
        };
        requested.min(max_limit.max(1)) as usize
    }
}

/// Pagination metadata for a page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
    pub total_count: Option<u64>,
}

/// One page of results in the caller's display order.
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult<T> {
    pub data: Vec<T>,
    pub page_info: PageInfo,
}

impl<T> PageResult<T> {
    /// Converts the rows of this page, keeping the page info.
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<PageResult<U>, E> {
        let data = self.data.into_iter().map(f).collect::<Result<_, _>>()?;
        Ok(PageResult {
            data,
            page_info: self.page_info,
        })
    }
}

/// One row of a relay-style connection, wrapped with its own cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge<T> {
    pub node: T,
    pub cursor: String,
}

/// A relay-style connection: edges plus page info.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection<T> {
    pub edges: Vec<Edge<T>>,
    pub page_info: PageInfo,
}

impl<T> Connection<T> {
    /// Converts the edge nodes of this connection, keeping cursors and page
    /// info.
    pub fn try_map<U, E>(self, mut f: impl FnMut(T) -> Result<U, E>) -> Result<Connection<U>, E> {
        let edges = self
            .edges
            .into_iter()
            .map(|edge| {
                Ok(Edge {
                    node: f(edge.node)?,
                    cursor: edge.cursor,
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(Connection {
            edges,
            page_info: self.page_info,
        })
    }
}
