//! Order workflow error types.

use common::{CatalogItemId, ErrorKind, ServiceError, UserId};
use domain::DomainError;
use store::StoreError;
use thiserror::Error;

/// Errors that can occur while creating or reading orders.
#[derive(Debug, Error)]
pub enum OrderWorkflowError {
    /// The request itself is malformed; no remote call was made.
    #[error("{0}")]
    InvalidInput(String),

    /// The user authority did not confirm the referenced user.
    #[error("{}", user_message(.user_id, .source))]
    UserRejected {
        user_id: UserId,
        source: ServiceError,
    },

    /// The catalog authority did not confirm one or more referenced items.
    #[error("{}", items_message(.failures))]
    ItemsRejected {
        failures: Vec<(CatalogItemId, ServiceError)>,
    },

    /// The atomic insert failed and nothing was persisted.
    #[error("failed to create order")]
    Persist(#[source] StoreError),

    /// Reading orders back failed.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Client-facing form of a failed reference lookup. A missing reference is
/// the caller's mistake, so it is reported as invalid input. Every other
/// class is kept and the reason is prefixed with the reference.
fn reference_error(reference: String, source: &ServiceError) -> ServiceError {
    match source.kind {
        ErrorKind::NotFound => ServiceError::not_found(format!("{reference} not found"))
            .reclassify(ErrorKind::InvalidArgument),
        _ => source.clone().context(reference),
    }
}

fn user_error(user_id: &UserId, source: &ServiceError) -> ServiceError {
    reference_error(format!("user {user_id}"), source)
}

fn item_errors(failures: &[(CatalogItemId, ServiceError)]) -> Vec<ServiceError> {
    failures
        .iter()
        .map(|(id, e)| reference_error(format!("catalog item {id}"), e))
        .collect()
}

fn user_message(user_id: &UserId, source: &ServiceError) -> String {
    user_error(user_id, source).message
}

fn items_message(failures: &[(CatalogItemId, ServiceError)]) -> String {
    item_errors(failures)
        .into_iter()
        .map(|e| e.message)
        .collect::<Vec<_>>()
        .join("; ")
}

impl OrderWorkflowError {
    /// Classification reported to the caller.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderWorkflowError::InvalidInput(_) => ErrorKind::InvalidArgument,
            OrderWorkflowError::UserRejected { user_id, source } => {
                user_error(user_id, source).kind
            }
            OrderWorkflowError::ItemsRejected { failures } => item_errors(failures)
                .into_iter()
                .map(|e| e.kind)
                .max()
                .unwrap_or(ErrorKind::InvalidArgument),
            OrderWorkflowError::Persist(_) => ErrorKind::Internal,
            OrderWorkflowError::Domain(DomainError::NotFound { .. }) => ErrorKind::NotFound,
            OrderWorkflowError::Domain(DomainError::Invalid(_)) => ErrorKind::InvalidArgument,
            OrderWorkflowError::Domain(DomainError::Store(_)) => ErrorKind::Internal,
        }
    }

    /// Label used on the failure counter.
    pub fn reason(&self) -> &'static str {
        match self {
            OrderWorkflowError::InvalidInput(_) => "invalid_input",
            OrderWorkflowError::UserRejected { .. } => "user_rejected",
            OrderWorkflowError::ItemsRejected { .. } => "items_rejected",
            OrderWorkflowError::Persist(_) => "persist_failed",
            OrderWorkflowError::Domain(_) => "read_failed",
        }
    }
}

impl From<OrderWorkflowError> for ServiceError {
    fn from(err: OrderWorkflowError) -> Self {
        match err {
            OrderWorkflowError::Domain(e) => e.into(),
            OrderWorkflowError::Persist(e) => {
                tracing::error!(error = %e, "order persistence failed");
                ServiceError::internal("failed to create order")
            }
            OrderWorkflowError::UserRejected { user_id, source } => user_error(&user_id, &source),
            other => ServiceError::new(other.kind(), other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_user_is_invalid_argument() {
        let err = OrderWorkflowError::UserRejected {
            user_id: UserId::new(999),
            source: ServiceError::not_found("user 999 not found"),
        };
        let service: ServiceError = err.into();
        assert_eq!(service.kind, ErrorKind::InvalidArgument);
        assert_eq!(service.message, "user 999 not found");
    }

    #[test]
    fn test_unavailable_user_keeps_its_class() {
        let err = OrderWorkflowError::UserRejected {
            user_id: UserId::new(1),
            source: ServiceError::unavailable("no healthy instances of service user-authority found"),
        };
        let service: ServiceError = err.into();
        assert_eq!(service.kind, ErrorKind::Unavailable);
        assert_eq!(
            service.message,
            "user 1: no healthy instances of service user-authority found"
        );
    }

    #[test]
    fn test_item_failures_report_the_most_severe_kind() {
        let err = OrderWorkflowError::ItemsRejected {
            failures: vec![
                (
                    CatalogItemId::new(999),
                    ServiceError::not_found("catalog item 999 not found"),
                ),
                (CatalogItemId::new(5), ServiceError::internal("boom")),
            ],
        };
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(
            err.to_string(),
            "catalog item 999 not found; catalog item 5: boom"
        );
    }

    #[test]
    fn test_persist_failure_hides_storage_detail() {
        let err = OrderWorkflowError::Persist(StoreError::Fault("disk full".to_string()));
        let service: ServiceError = err.into();
        assert_eq!(service.kind, ErrorKind::Internal);
        assert_eq!(service.message, "failed to create order");
    }

    #[test]
    fn test_internal_item_failure_names_the_item() {
        let err = OrderWorkflowError::ItemsRejected {
            failures: vec![(CatalogItemId::new(3), ServiceError::internal("db down"))],
        };
        let service: ServiceError = err.into();
        assert_eq!(service.kind, ErrorKind::Internal);
        assert_eq!(service.message, "catalog item 3: db down");
    }
}
