use common::ServiceError;
use thiserror::Error;

/// Errors that can occur when talking to the service directory.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The directory knows no healthy instance of the service.
    #[error("no healthy instances of service {service} found")]
    NoHealthyInstance { service: String },

    /// The directory could not be reached.
    #[error("registry request failed: {0}")]
    Registry(#[from] reqwest::Error),

    /// The directory answered with a non-success status.
    #[error("registry returned {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// Registration was refused (used by the in-memory directory).
    #[error("registration rejected: {0}")]
    Rejected(String),
}

impl From<DiscoveryError> for ServiceError {
    fn from(err: DiscoveryError) -> Self {
        match err {
            DiscoveryError::NoHealthyInstance { .. } => ServiceError::unavailable(err.to_string()),
            other => ServiceError::unavailable(format!("service discovery failed: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use common::ErrorKind;

    use super::*;

    #[test]
    fn test_no_healthy_instance_names_the_service() {
        let err: ServiceError = DiscoveryError::NoHealthyInstance {
            service: "user-authority".to_string(),
        }
        .into();
        assert_eq!(err.kind, ErrorKind::Unavailable);
        assert!(err.message.contains("user-authority"));
    }
}
