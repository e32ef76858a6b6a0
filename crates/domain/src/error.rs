//! Domain error types.

use common::ServiceError;
use store::StoreError;
use thiserror::Error;

/// Errors that can occur during record service operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Supplied fields failed validation.
    #[error("{0}")]
    Invalid(String),

    /// The requested record does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// An error occurred in the store.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { entity, id } => DomainError::NotFound { entity, id },
            other => DomainError::Store(other),
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Invalid(msg) => ServiceError::invalid_argument(msg),
            DomainError::NotFound { .. } => ServiceError::not_found(err.to_string()),
            DomainError::Store(e) => {
                tracing::error!(error = %e, "storage fault");
                ServiceError::internal("internal storage error")
            }
        }
    }
}
