//! Service errors

use subagg_db::DbError;
use subagg_types::ValidationError;
use thiserror::Error;

/// Subscription service errors
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Submitted data or patch is invalid
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No subscription with the requested ID
    #[error("subscription not found")]
    NotFound,

    /// Storage failure; the message is for logs only
    #[error("storage error: {0}")]
    Storage(#[source] DbError),
}

impl ServiceError {
    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Short label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound => "not_found",
            Self::Storage(_) => "storage",
        }
    }
}

impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound => Self::NotFound,
            DbError::Rejected(e) => Self::Validation(e),
            other => Self::Storage(other),
        }
    }
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
