//! Error types for video-catalog

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("{table} entry {id} already exists with a different kind")]
    KindConflict { table: &'static str, id: Uuid },

    #[error("{table} entry {id} not found")]
    NotFound { table: &'static str, id: Uuid },

    #[error("invalid page token")]
    InvalidToken,

    #[error("{0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Body encoding error: {0}")]
    Body(#[from] serde_json::Error),

    #[error("Unknown {table} kind in database: {kind:?}")]
    UnknownKind { table: &'static str, kind: String },

    #[error("Database lock poisoned")]
    LockPoisoned,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CatalogError {
    /// Errors that come from the storage layer rather than the caller.
    /// These always abort the enclosing transaction and surface as server errors.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            CatalogError::Storage(_)
                | CatalogError::Body(_)
                | CatalogError::UnknownKind { .. }
                | CatalogError::LockPoisoned
                | CatalogError::Io(_)
                | CatalogError::Config(_)
        )
    }
}
