//! Storage error model.

use thiserror::Error;

/// Result type used across the storage layer.
pub type StoreResult<T> = Result<T, StoreError>;

/// Storage-level error, as surfaced to the HTTP layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The addressed row/document does not exist.
    #[error("not found")]
    NotFound,

    /// An optimistic version check failed: a concurrent writer committed
    /// between our read and our write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Any other backend failure (connection, SQL, filesystem, serialization).
    #[error("storage error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Map SQLx errors to StoreError.
///
/// | SQLx error | Postgres code | StoreError |
/// |------------|---------------|------------|
/// | Database (unique violation) | `23505` | `Conflict` |
/// | Database (other) | any | `Backend` |
/// | RowNotFound | n/a | `NotFound` |
/// | PoolClosed / other | n/a | `Backend` |
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            if let Some(code) = db_err.code() {
                if code.as_ref() == "23505" {
                    return StoreError::Conflict(msg);
                }
            }
            StoreError::Backend(msg)
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        sqlx::Error::RowNotFound => StoreError::NotFound,
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

/// Error for a poisoned lock in an in-memory backend.
pub(crate) fn lock_poisoned() -> StoreError {
    StoreError::Backend("lock poisoned".to_string())
}
