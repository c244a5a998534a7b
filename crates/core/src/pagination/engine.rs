//! Cursor-pagination engine.
//!
//! Turns page requests into store queries and store results into pages. The
//! engine fetches one row beyond the requested page size (the lookahead) to
//! learn whether more rows exist in the direction of traversal, and always
//! appends `id` as a secondary sort key so rows sharing the primary sort
//! value keep a stable order.

use serde_json::Value;

use crate::cursor::{self, CursorFields};
use crate::query::{Filter, QueryOptions, SortOrder, SortSpec};

use super::{Connection, Direction, Edge, PageInfo, PageRequest, PageResult};

/// Which comparison the cursor condition uses against the last-seen values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    GreaterThan,
    LessThan,
}

/// Operator selection: asc/forward and desc/backward walk up the sort key,
/// the other two combinations walk down it.
fn comparison(order: SortOrder, direction: Direction) -> Comparison {
    match (order, direction) {
        (SortOrder::Asc, Direction::Forward) | (SortOrder::Desc, Direction::Backward) => {
            Comparison::GreaterThan
        }
        (SortOrder::Asc, Direction::Backward) | (SortOrder::Desc, Direction::Forward) => {
            Comparison::LessThan
        }
    }
}

fn cmp_filter(comparison: Comparison, field: &str, value: Value) -> Filter {
    match comparison {
        Comparison::GreaterThan => Filter::Gt(field.to_string(), value),
        Comparison::LessThan => Filter::Lt(field.to_string(), value),
    }
}

/// Builds the store query for a page request.
///
/// The returned options fetch `limit + 1` rows. For backward traversal the
/// fetch order is reversed so the rows nearest the cursor come first;
/// [`process_results`] restores the caller's display order.
pub fn build_query(
    request: &PageRequest,
    base_filter: Option<Filter>,
    max_limit: u32,
) -> QueryOptions {
    let limit = request.effective_limit(max_limit);

    let fetch_order = match request.direction {
        Direction::Forward => request.sort_order,
        Direction::Backward => request.sort_order.reverse(),
    };

    let mut order_by = vec![SortSpec::new(request.sort_field.clone(), fetch_order)];
    if request.sort_field != "id" {
        order_by.push(SortSpec::new("id", fetch_order));
    }

    let cursor_filter = request
        .cursor
        .as_deref()
        .map(cursor::decode)
        .filter(|fields| !fields.is_empty())
        .and_then(|fields| cursor_condition(&fields, request));

    QueryOptions {
        filter: Filter::and_maybe(base_filter, cursor_filter),
        order_by,
        limit: Some(limit + 1),
        offset: None,
    }
}

/// The resume condition encoded by a cursor.
///
/// With both the primary sort value and the `id` tiebreaker present, the
/// condition is the compound `primary OP v OR (primary = v AND id OP idv)`
/// so rows sharing the primary value are ordered by id. When the primary
/// sort field is `id` itself, a simple comparison suffices.
fn cursor_condition(fields: &CursorFields, request: &PageRequest) -> Option<Filter> {
    let op = comparison(request.sort_order, request.direction);
    let id = fields.get("id").cloned();

    if request.sort_field == "id" {
        return id.map(|id| cmp_filter(op, "id", id));
    }

    let primary = fields.get(&request.sort_field).cloned();
    match (primary, id) {
        (Some(primary), Some(id)) => Some(Filter::Or(vec![
            cmp_filter(op, &request.sort_field, primary.clone()),
            Filter::And(vec![
                Filter::Eq(request.sort_field.clone(), primary),
                cmp_filter(op, "id", id),
            ]),
        ])),
        (Some(primary), None) => Some(cmp_filter(op, &request.sort_field, primary)),
        (None, Some(id)) => Some(cmp_filter(op, "id", id)),
        (None, None) => None,
    }
}

/// Encodes the cursor for a single row: primary sort value plus `id`.
pub fn row_cursor(row: &Value, sort_field: &str) -> String {
    let mut fields = CursorFields::new();
    if sort_field != "id" {
        if let Some(value) = row.get(sort_field) {
            fields.insert(sort_field.to_string(), value.clone());
        }
    }
    if let Some(id) = row.get("id") {
        fields.insert("id".to_string(), id.clone());
    }
    cursor::encode(&fields)
}

/// Turns fetched rows into a page.
///
/// Pops the lookahead row if present and reverses backward-traversal rows
/// into the caller's display order. The lookahead drives the flag in the
/// direction of traversal on both sides: forward sets `has_next_page` from
/// the lookahead, backward sets `has_previous_page` from it; the opposite
/// flag reports whether a cursor was supplied.
pub fn process_results(
    mut rows: Vec<Value>,
    request: &PageRequest,
    total_count: Option<u64>,
    max_limit: u32,
) -> PageResult<Value> {
    let limit = request.effective_limit(max_limit);

    let has_lookahead = rows.len() > limit;
    if has_lookahead {
        rows.truncate(limit);
    }

    if request.direction == Direction::Backward {
        rows.reverse();
    }

    let cursor_supplied = request
        .cursor
        .as_deref()
        .map(|c| !cursor::decode(c).is_empty())
        .unwrap_or(false);

    let (has_next_page, has_previous_page) = match request.direction {
        Direction::Forward => (has_lookahead, cursor_supplied),
        Direction::Backward => (cursor_supplied, has_lookahead),
    };

    let start_cursor = rows.first().map(|row| row_cursor(row, &request.sort_field));
    let end_cursor = rows.last().map(|row| row_cursor(row, &request.sort_field));

    PageResult {
        data: rows,
        page_info: PageInfo {
            has_next_page,
            has_previous_page,
            start_cursor,
            end_cursor,
            total_count,
        },
    }
}

/// Wraps a page into a relay-style connection, each row carrying its own
/// cursor.
pub fn into_connection(page: PageResult<Value>, sort_field: &str) -> Connection<Value> {
    let edges = page
        .data
        .into_iter()
        .map(|row| {
            let cursor = row_cursor(&row, sort_field);
            Edge { node: row, cursor }
        })
        .collect();
    Connection {
        edges,
        page_info: page.page_info,
    }
}
