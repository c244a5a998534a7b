use thiserror::Error;

/// Errors surfaced by store backends.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,
    #[error("Duplicate record id")]
    DuplicateId,
    #[error("Version conflict: expected {expected}, found {actual}")]
    VersionConflict { expected: u64, actual: u64 },
    #[error("Backend error: {0}")]
    Backend(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Errors that cross the repository boundary.
///
/// This is the only error type callers of the engine see; raw store errors
/// are mapped before they can leak.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },
    #[error("{entity_type} version conflict on {id}: expected {expected}, found {actual}")]
    VersionConflict {
        entity_type: &'static str,
        id: String,
        expected: u64,
        actual: u64,
    },
    #[error("{entity_type} already exists: {id}")]
    AlreadyExists {
        entity_type: &'static str,
        id: String,
    },
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RepositoryError {
    /// Maps a store error into the typed repository error, attaching entity
    /// context where the store cannot know it.
    pub fn from_store(err: StoreError, entity_type: &'static str, id: String) -> Self {
        match err {
            StoreError::NotFound => RepositoryError::NotFound { entity_type, id },
            StoreError::DuplicateId => RepositoryError::AlreadyExists { entity_type, id },
            StoreError::VersionConflict { expected, actual } => RepositoryError::VersionConflict {
                entity_type,
                id,
                expected,
                actual,
            },
            StoreError::Backend(msg) => RepositoryError::Storage(msg),
            StoreError::Serialization(msg) => RepositoryError::Serialization(msg),
        }
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;
