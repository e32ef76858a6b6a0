//! ConsulDirectory against a stub of the Consul agent HTTP API.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use common::ServiceLocation;
use discovery::{ConsulDirectory, Directory, DiscoveryError, HealthCheck, Registration};
use serde_json::{Value, json};

#[derive(Clone, Default)]
struct StubConsul {
    registrations: Arc<Mutex<Vec<Value>>>,
}

async fn health_service(
    State(stub): State<StubConsul>,
    Path(name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    if name == "broken" {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    if params.get("passing").map(String::as_str) != Some("true") {
        return Err(StatusCode::BAD_REQUEST);
    }

    let entries: Vec<Value> = stub
        .registrations
        .lock()
        .unwrap()
        .iter()
        .filter(|r| r["Name"] == name.as_str())
        .map(|r| {
            json!({
                "Node": {"Node": "agent-1", "Address": "10.0.0.9"},
                "Service": {
                    "ID": r["ID"],
                    "Service": r["Name"],
                    "Address": r["Address"],
                    "Port": r["Port"],
                },
                "Checks": []
            })
        })
        .collect();
    Ok(Json(Value::Array(entries)))
}

async fn register(State(stub): State<StubConsul>, Json(body): Json<Value>) -> StatusCode {
    stub.registrations.lock().unwrap().push(body);
    StatusCode::OK
}

async fn deregister(State(stub): State<StubConsul>, Path(id): Path<String>) -> StatusCode {
    stub.registrations
        .lock()
        .unwrap()
        .retain(|r| r["ID"] != id.as_str());
    StatusCode::OK
}

async fn start_stub() -> (StubConsul, ConsulDirectory) {
    let stub = StubConsul::default();
    let app = Router::new()
        .route("/v1/health/service/{name}", get(health_service))
        .route("/v1/agent/service/register", put(register))
        .route("/v1/agent/service/deregister/{id}", put(deregister))
        .with_state(stub.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (stub, ConsulDirectory::new(format!("http://{addr}")))
}

#[tokio::test]
async fn test_register_then_resolve() {
    let (stub, directory) = start_stub().await;

    let location = ServiceLocation::new("users-1", 50051);
    let registration = Registration::new("user-authority", location.clone())
        .with_health_check(HealthCheck::http(&location, Duration::from_secs(10)));
    directory.register(&registration).await.unwrap();

    let stored = stub.registrations.lock().unwrap().clone();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0]["Check"]["HTTP"], "http://users-1:50051/health");

    let resolved = directory.resolve("user-authority").await.unwrap();
    assert_eq!(resolved, location);
}

#[tokio::test]
async fn test_first_instance_wins() {
    let (_stub, directory) = start_stub().await;

    for host in ["menu-1", "menu-2"] {
        directory
            .register(&Registration::new(
                "catalog-authority",
                ServiceLocation::new(host, 50052),
            ))
            .await
            .unwrap();
    }

    let resolved = directory.resolve("catalog-authority").await.unwrap();
    assert_eq!(resolved.host, "menu-1");
}

#[tokio::test]
async fn test_unknown_service_has_no_healthy_instance() {
    let (_stub, directory) = start_stub().await;

    let err = directory.resolve("order-service").await.unwrap_err();
    assert!(matches!(
        err,
        DiscoveryError::NoHealthyInstance { ref service } if service == "order-service"
    ));
}

#[tokio::test]
async fn test_deregistered_instance_is_no_longer_resolved() {
    let (_stub, directory) = start_stub().await;

    let registration = Registration::new("order-service", ServiceLocation::new("orders-1", 50053));
    directory.register(&registration).await.unwrap();
    assert!(directory.resolve("order-service").await.is_ok());

    directory.deregister(&registration.id).await.unwrap();
    assert!(directory.resolve("order-service").await.is_err());
}

#[tokio::test]
async fn test_registry_error_status_is_reported() {
    let (_stub, directory) = start_stub().await;

    let err = directory.resolve("broken").await.unwrap_err();
    assert!(matches!(
        err,
        DiscoveryError::UnexpectedStatus { status: 500, .. }
    ));
}

#[tokio::test]
async fn test_unreachable_registry_is_a_registry_error() {
    // Nothing listens on port 9 of the loopback interface.
    let directory = ConsulDirectory::new("http://127.0.0.1:9");
    let err = directory.resolve("user-authority").await.unwrap_err();
    assert!(matches!(err, DiscoveryError::Registry(_)));
}
