use std::sync::Arc;

use async_trait::async_trait;
use common::ServiceLocation;
use tokio::sync::RwLock;

use crate::DiscoveryError;
use crate::directory::{Directory, Registration, record_resolution};

#[derive(Debug, Clone)]
struct Instance {
    registration: Registration,
    healthy: bool,
}

#[derive(Debug, Default)]
struct InMemoryDirectoryState {
    instances: Vec<Instance>,
    reject_registrations: bool,
}

/// In-process directory.
///
/// Instances are resolved in registration order and start out healthy;
/// tests flip health with [`InMemoryDirectory::set_healthy`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    state: Arc<RwLock<InMemoryDirectoryState>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks an instance healthy or unhealthy. Returns false if unknown.
    pub async fn set_healthy(&self, instance_id: &str, healthy: bool) -> bool {
        let mut state = self.state.write().await;
        match state
            .instances
            .iter_mut()
            .find(|i| i.registration.id == instance_id)
        {
            Some(instance) => {
                instance.healthy = healthy;
                true
            }
            None => false,
        }
    }

    /// Configures the directory to refuse registrations.
    pub async fn set_reject_registrations(&self, reject: bool) {
        self.state.write().await.reject_registrations = reject;
    }

    /// Returns the number of registered instances of `service`, healthy or not.
    pub async fn instance_count(&self, service: &str) -> usize {
        self.state
            .read()
            .await
            .instances
            .iter()
            .filter(|i| i.registration.name == service)
            .count()
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn resolve(&self, service: &str) -> Result<ServiceLocation, DiscoveryError> {
        let result = {
            let state = self.state.read().await;
            state
                .instances
                .iter()
                .find(|i| i.healthy && i.registration.name == service)
                .map(|i| i.registration.location.clone())
                .ok_or_else(|| DiscoveryError::NoHealthyInstance {
                    service: service.to_string(),
                })
        };
        record_resolution(service, &result);
        result
    }

    async fn register(&self, registration: &Registration) -> Result<(), DiscoveryError> {
        let mut state = self.state.write().await;
        if state.reject_registrations {
            return Err(DiscoveryError::Rejected(format!(
                "directory refused {}",
                registration.id
            )));
        }

        let instance = Instance {
            registration: registration.clone(),
            healthy: true,
        };
        // Re-registering an id replaces it in place, as Consul does.
        match state
            .instances
            .iter_mut()
            .find(|i| i.registration.id == registration.id)
        {
            Some(existing) => *existing = instance,
            None => state.instances.push(instance),
        }
        Ok(())
    }

    async fn deregister(&self, instance_id: &str) -> Result<(), DiscoveryError> {
        self.state
            .write()
            .await
            .instances
            .retain(|i| i.registration.id != instance_id);
        Ok(())
    }
}
