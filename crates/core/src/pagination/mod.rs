mod engine;
mod types;

pub use engine::{build_query, into_connection, process_results, row_cursor};
pub use types::{
    Connection, Direction, Edge, PageInfo, PageRequest, PageResult, DEFAULT_LIMIT,
    DEFAULT_MAX_LIMIT,
};
