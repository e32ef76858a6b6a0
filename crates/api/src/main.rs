//! Service entry point. One binary runs one role per process.

use std::process::ExitCode;
use std::sync::Arc;

use api::config::{Config, ConfigError, ServiceRole};
use axum::Router;
use common::ServiceLocation;
use discovery::{
    ConsulDirectory, Directory, DiscoveryError, HealthCheck, Registration, SharedDirectory,
};
use metrics_exporter_prometheus::PrometheusHandle;
use store::{InMemoryStore, PostgresStore, StoreError};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Reasons the process could not start or keep serving.
#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to install Prometheus recorder: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
    #[error("database error: {0}")]
    Database(#[from] StoreError),
    #[error("failed to register with the service directory: {0}")]
    Registration(#[from] DiscoveryError),
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install SIGINT handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(()) => {
            tracing::info!("server shut down gracefully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "service terminated");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), StartupError> {
    let config = Config::from_env()?;
    tracing::info!(role = %config.role, "starting service");

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;

    let directory: SharedDirectory = Arc::new(ConsulDirectory::new(config.consul_addr.clone()));
    let http = api::http_client(config.request_timeout);

    // 3. Build the role's application, backed by PostgreSQL when configured
    let app = match &config.database_url {
        Some(url) if config.role.registers() => {
            let store =
                PostgresStore::connect(url, config.db_connect_retries, config.db_retry_delay)
                    .await?;
            store.run_migrations().await?;
            tracing::info!("database schema is up to date");
            build_app(&config, store, Arc::clone(&directory), http, metrics_handle)
        }
        _ => {
            if config.role.registers() {
                tracing::warn!("DATABASE_URL not set, records are kept in memory");
            }
            build_app(
                &config,
                InMemoryStore::new(),
                Arc::clone(&directory),
                http,
                metrics_handle,
            )
        }
    };

    // 4. Bind, then register so the directory only sees a listening instance
    let listener = tokio::net::TcpListener::bind(config.addr()).await?;
    let port = listener.local_addr()?.port();
    tracing::info!(addr = %config.addr(), port, "listening");

    let registration = if config.role.registers() {
        let location = ServiceLocation::new(config.advertise_host.clone(), port);
        let registration = Registration::new(config.role.service_name(), location.clone())
            .with_health_check(HealthCheck::http(&location, config.health_check_interval));
        directory.register(&registration).await?;
        tracing::info!(
            service = %registration.name,
            instance = %registration.id,
            location = %location,
            "registered with service directory"
        );
        Some(registration)
    } else {
        None
    };

    // 5. Serve until a shutdown signal arrives
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Some(registration) = registration {
        match directory.deregister(&registration.id).await {
            Ok(()) => tracing::info!(instance = %registration.id, "deregistered from service directory"),
            Err(e) => tracing::warn!(instance = %registration.id, error = %e, "deregistration failed"),
        }
    }

    served?;
    Ok(())
}

fn build_app<S>(
    config: &Config,
    store: S,
    directory: SharedDirectory,
    http: reqwest::Client,
    metrics_handle: PrometheusHandle,
) -> Router
where
    S: store::UserStore + store::CatalogStore + store::OrderStore + Clone + 'static,
{
    match config.role {
        ServiceRole::UserAuthority => api::user_authority_app(store, metrics_handle),
        ServiceRole::CatalogAuthority => api::catalog_authority_app(store, metrics_handle),
        ServiceRole::OrderService => {
            api::order_service_app(store, directory, http, metrics_handle)
        }
        ServiceRole::Gateway => api::gateway_app(directory, http, metrics_handle),
    }
}
