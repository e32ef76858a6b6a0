//! Consul-backed directory.

use std::time::Duration;

use async_trait::async_trait;
use common::ServiceLocation;
use serde::{Deserialize, Serialize};

use crate::DiscoveryError;
use crate::directory::{Directory, Registration, record_resolution};

/// Directory client for a Consul agent's HTTP API.
///
/// Resolution uses the health endpoint with `passing=true`, so only
/// instances whose checks currently pass are candidates.
#[derive(Clone)]
pub struct ConsulDirectory {
    client: reqwest::Client,
    base_url: String,
}

impl ConsulDirectory {
    /// Creates a client for the agent at `base_url`, e.g. `http://consul:8500`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn query_healthy(&self, service: &str) -> Result<ServiceLocation, DiscoveryError> {
        let url = format!("{}/v1/health/service/{service}", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("passing", "true")])
            .send()
            .await?;

        let response = check_status(response).await?;
        let entries: Vec<HealthEntry> = response.json().await?;

        entries
            .into_iter()
            .next()
            .map(HealthEntry::into_location)
            .ok_or_else(|| DiscoveryError::NoHealthyInstance {
                service: service.to_string(),
            })
    }
}

#[async_trait]
impl Directory for ConsulDirectory {
    async fn resolve(&self, service: &str) -> Result<ServiceLocation, DiscoveryError> {
        let result = self.query_healthy(service).await;
        record_resolution(service, &result);
        result
    }

    #[tracing::instrument(skip(self, registration), fields(id = %registration.id, name = %registration.name))]
    async fn register(&self, registration: &Registration) -> Result<(), DiscoveryError> {
        let url = format!("{}/v1/agent/service/register", self.base_url);
        let body = AgentServiceRegistration::from(registration);

        let response = self.client.put(&url).json(&body).send().await?;
        check_status(response).await?;

        tracing::info!(location = %registration.location, "registered with consul");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn deregister(&self, instance_id: &str) -> Result<(), DiscoveryError> {
        let url = format!(
            "{}/v1/agent/service/deregister/{instance_id}",
            self.base_url
        );
        let response = self.client.put(&url).send().await?;
        check_status(response).await?;

        tracing::info!("deregistered from consul");
        Ok(())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, DiscoveryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(DiscoveryError::UnexpectedStatus {
        status: status.as_u16(),
        body,
    })
}

/// Consul durations are Go duration strings.
fn go_duration(d: Duration) -> String {
    format!("{}s", d.as_secs().max(1))
}

// -- Consul wire types --

#[derive(Deserialize)]
struct HealthEntry {
    #[serde(rename = "Node")]
    node: NodeEntry,
    #[serde(rename = "Service")]
    service: ServiceEntry,
}

#[derive(Deserialize)]
struct NodeEntry {
    #[serde(rename = "Address")]
    address: String,
}

#[derive(Deserialize)]
struct ServiceEntry {
    #[serde(rename = "Address", default)]
    address: String,
    #[serde(rename = "Port")]
    port: u16,
}

impl HealthEntry {
    /// An empty service address means "same as the node".
    fn into_location(self) -> ServiceLocation {
        let host = if self.service.address.is_empty() {
            self.node.address
        } else {
            self.service.address
        };
        ServiceLocation::new(host, self.service.port)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct AgentServiceRegistration {
    #[serde(rename = "ID")]
    id: String,
    name: String,
    address: String,
    port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    check: Option<AgentServiceCheck>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct AgentServiceCheck {
    #[serde(rename = "HTTP")]
    http: String,
    interval: String,
    timeout: String,
    deregister_critical_service_after: String,
}

impl From<&Registration> for AgentServiceRegistration {
    fn from(r: &Registration) -> Self {
        Self {
            id: r.id.clone(),
            name: r.name.clone(),
            address: r.location.host.clone(),
            port: r.location.port,
            check: r.health_check.as_ref().map(|c| AgentServiceCheck {
                http: c.http_url.clone(),
                interval: go_duration(c.interval),
                timeout: go_duration(c.timeout),
                deregister_critical_service_after: go_duration(c.deregister_after),
            }),
        }
    }
}
