//! HTTP surface for every service role.
//!
//! Each backend role serves its records through the service contract traits
//! from `orchestration`, so the same route handlers are mounted by the
//! backend processes (over the local record services) and by the gateway
//! under `/api` (over discovery-backed clients). Every app also exposes
//! `/health` and `/metrics`, with structured request logging.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post, put};
use discovery::SharedDirectory;
use domain::{CatalogService, UserService};
use metrics_exporter_prometheus::PrometheusHandle;
use orchestration::{
    CatalogAuthority, DiscoveredCatalogAuthority, DiscoveredOrderAuthority,
    DiscoveredUserAuthority, FanOutAggregator, HttpInvoker, OrderAuthority, OrderWorkflow,
    UserAuthority,
};
use store::{CatalogStore, OrderStore, UserStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Routes for the user contract.
pub fn user_routes(users: Arc<dyn UserAuthority>) -> Router {
    Router::new()
        .route("/users", post(routes::users::create).get(routes::users::list))
        .route("/users/{id}", get(routes::users::get))
        .with_state(users)
}

/// Routes for the catalog contract.
pub fn catalog_routes(catalog: Arc<dyn CatalogAuthority>) -> Router {
    Router::new()
        .route(
            "/catalog-items",
            post(routes::catalog::create).get(routes::catalog::list),
        )
        .route("/catalog-items/{id}", get(routes::catalog::get))
        .route("/catalog-items/{id}/price", put(routes::catalog::update_price))
        .with_state(catalog)
}

/// Routes for the order contract.
pub fn order_routes(orders: Arc<dyn OrderAuthority>) -> Router {
    Router::new()
        .route("/orders", post(routes::orders::create).get(routes::orders::list))
        .route("/orders/{id}", get(routes::orders::get))
        .with_state(orders)
}

/// Wraps service routes with health, metrics and the shared layers.
pub fn create_app(service_routes: Router, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .merge(service_routes)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Builds the outbound HTTP client used for service-to-service calls.
pub fn http_client(request_timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(request_timeout)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default HTTP client");
            reqwest::Client::new()
        })
}

/// The user authority process.
pub fn user_authority_app<S>(store: S, metrics_handle: PrometheusHandle) -> Router
where
    S: UserStore + 'static,
{
    let users: Arc<dyn UserAuthority> = Arc::new(UserService::new(store));
    create_app(user_routes(users), metrics_handle)
}

/// The catalog authority process.
pub fn catalog_authority_app<S>(store: S, metrics_handle: PrometheusHandle) -> Router
where
    S: CatalogStore + 'static,
{
    let catalog: Arc<dyn CatalogAuthority> = Arc::new(CatalogService::new(store));
    create_app(catalog_routes(catalog), metrics_handle)
}

/// The order service process. References are confirmed with the user and
/// catalog authorities, located through `directory` on every call.
pub fn order_service_app<S>(
    store: S,
    directory: SharedDirectory,
    http: reqwest::Client,
    metrics_handle: PrometheusHandle,
) -> Router
where
    S: OrderStore + Clone + 'static,
{
    let workflow = OrderWorkflow::new(
        store,
        DiscoveredUserAuthority::new(Arc::clone(&directory), http.clone()),
        DiscoveredCatalogAuthority::new(directory, http),
    );
    let orders: Arc<dyn OrderAuthority> = Arc::new(workflow);
    create_app(order_routes(orders), metrics_handle)
}

/// The gateway process: every record operation under `/api`, forwarded to
/// a freshly resolved instance, plus the aggregated purchase read.
pub fn gateway_app(
    directory: SharedDirectory,
    http: reqwest::Client,
    metrics_handle: PrometheusHandle,
) -> Router {
    let users: Arc<dyn UserAuthority> = Arc::new(DiscoveredUserAuthority::new(
        Arc::clone(&directory),
        http.clone(),
    ));
    let catalog: Arc<dyn CatalogAuthority> = Arc::new(DiscoveredCatalogAuthority::new(
        Arc::clone(&directory),
        http.clone(),
    ));
    let orders: Arc<dyn OrderAuthority> = Arc::new(DiscoveredOrderAuthority::new(
        Arc::clone(&directory),
        http.clone(),
    ));
    let aggregator = FanOutAggregator::new(directory, Arc::new(HttpInvoker::new(http)));

    let purchases = Router::new()
        .route(
            "/purchases/user/{user_id}/item/{item_id}",
            get(routes::purchases::user_and_item),
        )
        .with_state(aggregator);

    let api = user_routes(users)
        .merge(catalog_routes(catalog))
        .merge(order_routes(orders))
        .merge(purchases);

    create_app(Router::new().nest("/api", api), metrics_handle)
}
