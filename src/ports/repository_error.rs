//! Error taxonomy shared by every repository port.

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId, ValidationError};

/// Boxed source error from a storage driver.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures surfaced by repository and transaction ports.
///
/// Only [`RepositoryError::Transient`] is ever retried. Everything else
/// propagates on first occurrence.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("subscription {0} not found")]
    NotFound(SubscriptionId),

    #[error("subscription {id} was modified concurrently (expected version {version})")]
    ConcurrentModification { id: SubscriptionId, version: i32 },

    #[error("invalid sorting field: {0}")]
    InvalidSortingField(String),

    #[error("subscription {0} already exists")]
    Duplicate(SubscriptionId),

    #[error("transient storage failure: {0}")]
    Transient(#[source] BoxError),

    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExceeded {
        attempts: u32,
        #[source]
        last: Box<RepositoryError>,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error("database error: {0}")]
    Database(#[source] BoxError),

    #[error("stored row violates subscription invariants: {0}")]
    CorruptRow(String),

    #[error("event serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RepositoryError {
    /// Wraps a driver error that is worth retrying.
    pub fn transient(err: impl Into<BoxError>) -> Self {
        RepositoryError::Transient(err.into())
    }

    /// Wraps a driver error that is not worth retrying.
    pub fn database(err: impl Into<BoxError>) -> Self {
        RepositoryError::Database(err.into())
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, RepositoryError::Transient(_))
    }

    /// Stable code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            RepositoryError::Validation(err) => err.code(),
            RepositoryError::NotFound(_) => ErrorCode::NotFound,
            RepositoryError::ConcurrentModification { .. } => ErrorCode::ConcurrentModification,
            RepositoryError::InvalidSortingField(_) => ErrorCode::InvalidSortingField,
            RepositoryError::Duplicate(_) => ErrorCode::AlreadyExists,
            RepositoryError::RetriesExceeded { .. } => ErrorCode::RetriesExceeded,
            RepositoryError::Cancelled => ErrorCode::Cancelled,
            RepositoryError::Transient(_) | RepositoryError::Database(_) => ErrorCode::DatabaseError,
            RepositoryError::CorruptRow(_) | RepositoryError::Serialization(_) => {
                ErrorCode::InternalError
            }
        }
    }
}

impl From<RepositoryError> for DomainError {
    fn from(err: RepositoryError) -> Self {
        let code = err.code();
        let error = DomainError::new(code, err.to_string());
        match err {
            RepositoryError::NotFound(id) | RepositoryError::Duplicate(id) => {
                error.with_detail("id", id.to_string())
            }
            RepositoryError::ConcurrentModification { id, version } => error
                .with_detail("id", id.to_string())
                .with_detail("version", version.to_string()),
            RepositoryError::InvalidSortingField(field) => error.with_detail("field", field),
            RepositoryError::RetriesExceeded { attempts, .. } => {
                error.with_detail("attempts", attempts.to_string())
            }
            _ => error,
        }
    }
}
