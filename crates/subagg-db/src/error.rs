//! Database errors

use subagg_types::ValidationError;
use thiserror::Error;

/// Database errors
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLx error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Record not found
    #[error("record not found")]
    NotFound,

    /// A record with the same key already exists
    #[error("duplicate key: {0}")]
    Duplicate(String),

    /// The mutation passed to an atomic update refused the change.
    ///
    /// The transaction was rolled back and nothing was written.
    #[error("update rejected: {0}")]
    Rejected(#[source] ValidationError),
}

impl DbError {
    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// Result type for database operations
pub type DbResult<T> = Result<T, DbError>;
