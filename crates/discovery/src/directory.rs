use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::ServiceLocation;

use crate::DiscoveryError;

/// How the registry probes an instance's liveness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheck {
    /// URL the registry polls; any 2xx answer counts as healthy.
    pub http_url: String,
    pub interval: Duration,
    pub timeout: Duration,
    /// Remove the instance after it has been critical for this long.
    pub deregister_after: Duration,
}

impl HealthCheck {
    /// Probes `GET /health` on the registered location.
    pub fn http(location: &ServiceLocation, interval: Duration) -> Self {
        Self {
            http_url: format!("{}/health", location.base_url()),
            interval,
            timeout: Duration::from_secs(5),
            deregister_after: Duration::from_secs(60),
        }
    }
}

/// One service instance as announced to the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// Unique per instance.
    pub id: String,
    /// Logical service name shared by all instances of the role.
    pub name: String,
    pub location: ServiceLocation,
    pub health_check: Option<HealthCheck>,
}

impl Registration {
    /// Creates a registration with a fresh instance id.
    pub fn new(name: impl Into<String>, location: ServiceLocation) -> Self {
        let name = name.into();
        Self {
            id: format!("{name}-{}", uuid::Uuid::new_v4()),
            name,
            location,
            health_check: None,
        }
    }

    pub fn with_health_check(mut self, check: HealthCheck) -> Self {
        self.health_check = Some(check);
        self
    }
}

/// Lookup and registration against a service registry.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Returns the location of a currently healthy instance of `service`.
    ///
    /// Asks the registry afresh on every call. With several healthy
    /// instances the first one in the registry's order is chosen; there is
    /// no load-balancing policy.
    async fn resolve(&self, service: &str) -> Result<ServiceLocation, DiscoveryError>;

    /// Announces an instance.
    async fn register(&self, registration: &Registration) -> Result<(), DiscoveryError>;

    /// Withdraws an instance by id.
    async fn deregister(&self, instance_id: &str) -> Result<(), DiscoveryError>;
}

/// A directory shared between request handlers.
pub type SharedDirectory = Arc<dyn Directory>;

pub(crate) fn record_resolution(service: &str, result: &Result<ServiceLocation, DiscoveryError>) {
    let outcome = match result {
        Ok(_) => "resolved",
        Err(DiscoveryError::NoHealthyInstance { .. }) => "no_healthy_instance",
        Err(_) => "error",
    };
    metrics::counter!(
        "directory_resolutions_total",
        "service" => service.to_string(),
        "outcome" => outcome
    )
    .increment(1);

    match result {
        Ok(location) => tracing::debug!(service, %location, "resolved service"),
        Err(e) => tracing::warn!(service, error = %e, "service resolution failed"),
    }
}
