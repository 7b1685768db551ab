//! # Catalog Errors
//!
//! [`CatalogError`] is what every catalog operation returns. The HTTP layer
//! maps each variant to a status code; nothing here is retried.

use ars_core::ValidationError;
use ars_storage::StorageError;
use thiserror::Error;

/// Failure of the release persistence backend.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Query or connection failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Embedded schema migrations failed to apply.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Backend-specific failure without an underlying driver error.
    #[error("{0}")]
    Backend(String),
}

/// Errors returned by [`crate::ReleaseCatalog`] operations.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Bad or missing input. Nothing was stored.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// No matching release or artifact.
    #[error("not found: {0}")]
    NotFound(String),

    /// The artifact store failed to write or read.
    #[error("storage error: {0}")]
    Storage(StorageError),

    /// The release row could not be written or read.
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

impl From<StorageError> for CatalogError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => Self::NotFound(key),
            StorageError::InvalidFileName(e) => Self::Validation(e),
            other @ StorageError::Io(_) => Self::Storage(other),
        }
    }
}
