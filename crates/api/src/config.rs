//! Application configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use discovery::{CATALOG_AUTHORITY, ORDER_SERVICE, USER_AUTHORITY};
use thiserror::Error;

/// Errors that stop the process from starting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown SERVICE_ROLE {0:?}; expected user-authority, catalog-authority, order-service or gateway")]
    UnknownRole(String),
}

/// The part a process plays. One binary runs one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceRole {
    UserAuthority,
    CatalogAuthority,
    OrderService,
    Gateway,
}

impl ServiceRole {
    /// Logical name registered with the directory.
    pub fn service_name(&self) -> &'static str {
        match self {
            ServiceRole::UserAuthority => USER_AUTHORITY,
            ServiceRole::CatalogAuthority => CATALOG_AUTHORITY,
            ServiceRole::OrderService => ORDER_SERVICE,
            ServiceRole::Gateway => "gateway",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            ServiceRole::UserAuthority => 50051,
            ServiceRole::CatalogAuthority => 50052,
            ServiceRole::OrderService => 50053,
            ServiceRole::Gateway => 8080,
        }
    }

    /// The gateway is a pure client and never registers itself.
    pub fn registers(&self) -> bool {
        !matches!(self, ServiceRole::Gateway)
    }
}

impl FromStr for ServiceRole {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "user-authority" => Ok(ServiceRole::UserAuthority),
            "catalog-authority" => Ok(ServiceRole::CatalogAuthority),
            "order-service" => Ok(ServiceRole::OrderService),
            "gateway" => Ok(ServiceRole::Gateway),
            other => Err(ConfigError::UnknownRole(other.to_string())),
        }
    }
}

impl std::fmt::Display for ServiceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.service_name())
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `SERVICE_ROLE`: which role to run (default: `"gateway"`)
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default depends on the role)
/// - `ADVERTISE_HOST`: address registered with the directory
///   (default: `$HOSTNAME`, else `"127.0.0.1"`)
/// - `CONSUL_ADDR`: registry base URL (default: `"http://consul:8500"`)
/// - `DATABASE_URL`: PostgreSQL DSN; unset selects the in-memory store
/// - `DB_CONNECT_RETRIES`: database connection attempts (default: `10`)
/// - `REQUEST_TIMEOUT_SECS`: outbound call deadline (default: `10`)
/// - `HEALTH_CHECK_INTERVAL_SECS`: registry probe interval (default: `10`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub role: ServiceRole,
    pub host: String,
    pub port: u16,
    pub advertise_host: String,
    pub consul_addr: String,
    pub database_url: Option<String>,
    pub db_connect_retries: u32,
    pub db_retry_delay: Duration,
    pub request_timeout: Duration,
    pub health_check_interval: Duration,
    pub log_level: String,
}

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T: FromStr>(name: &str) -> Option<T> {
    var(name).and_then(|v| v.trim().parse().ok())
}

impl Config {
    /// Loads configuration from environment variables, falling back to
    /// defaults. Only an unknown role is an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let role = match var("SERVICE_ROLE") {
            Some(role) => role.parse()?,
            None => ServiceRole::Gateway,
        };
        let defaults = Self::for_role(role);

        Ok(Self {
            role,
            host: var("HOST").unwrap_or(defaults.host),
            port: parsed("PORT").unwrap_or(defaults.port),
            advertise_host: var("ADVERTISE_HOST")
                .or_else(|| var("HOSTNAME"))
                .unwrap_or(defaults.advertise_host),
            consul_addr: var("CONSUL_ADDR").unwrap_or(defaults.consul_addr),
            database_url: var("DATABASE_URL"),
            db_connect_retries: parsed("DB_CONNECT_RETRIES").unwrap_or(defaults.db_connect_retries),
            db_retry_delay: defaults.db_retry_delay,
            request_timeout: parsed("REQUEST_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            health_check_interval: parsed("HEALTH_CHECK_INTERVAL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.health_check_interval),
            log_level: var("RUST_LOG").unwrap_or(defaults.log_level),
        })
    }

    /// Default configuration for `role`.
    pub fn for_role(role: ServiceRole) -> Self {
        Self {
            role,
            host: "0.0.0.0".to_string(),
            port: role.default_port(),
            advertise_host: "127.0.0.1".to_string(),
            consul_addr: "http://consul:8500".to_string(),
            database_url: None,
            db_connect_retries: 10,
            db_retry_delay: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            health_check_interval: Duration::from_secs(10),
            log_level: "info".to_string(),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::for_role(ServiceRole::Gateway)
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    const VARS: [&str; 11] = [
        "SERVICE_ROLE",
        "HOST",
        "PORT",
        "ADVERTISE_HOST",
        "HOSTNAME",
        "CONSUL_ADDR",
        "DATABASE_URL",
        "DB_CONNECT_RETRIES",
        "REQUEST_TIMEOUT_SECS",
        "HEALTH_CHECK_INTERVAL_SECS",
        "RUST_LOG",
    ];

    fn clear_env() {
        for name in VARS {
            // SAFETY: tests touching the environment are serialized.
            unsafe { std::env::remove_var(name) };
        }
    }

    fn set(name: &str, value: &str) {
        // SAFETY: tests touching the environment are serialized.
        unsafe { std::env::set_var(name, value) };
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.role, ServiceRole::Gateway);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.consul_addr, "http://consul:8500");
        assert_eq!(config.db_connect_retries, 10);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_role_ports() {
        assert_eq!(Config::for_role(ServiceRole::UserAuthority).port, 50051);
        assert_eq!(Config::for_role(ServiceRole::CatalogAuthority).port, 50052);
        assert_eq!(Config::for_role(ServiceRole::OrderService).port, 50053);
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            ..Config::for_role(ServiceRole::UserAuthority)
        };
        assert_eq!(config.addr(), "127.0.0.1:50051");
    }

    #[test]
    fn test_only_backends_register() {
        assert!(ServiceRole::UserAuthority.registers());
        assert!(ServiceRole::OrderService.registers());
        assert!(!ServiceRole::Gateway.registers());
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        let config = Config::from_env().unwrap();
        assert_eq!(config.role, ServiceRole::Gateway);
        assert_eq!(config.port, 8080);
        assert_eq!(config.advertise_host, "127.0.0.1");
        assert!(config.database_url.is_none());
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        set("SERVICE_ROLE", "order-service");
        set("ADVERTISE_HOST", "orders-1");
        set("DATABASE_URL", "postgres://app@db/orders");
        set("REQUEST_TIMEOUT_SECS", "3");
        let config = Config::from_env().unwrap();
        clear_env();

        assert_eq!(config.role, ServiceRole::OrderService);
        assert_eq!(config.port, 50053);
        assert_eq!(config.advertise_host, "orders-1");
        assert_eq!(config.database_url.as_deref(), Some("postgres://app@db/orders"));
        assert_eq!(config.request_timeout, Duration::from_secs(3));
    }

    #[test]
    #[serial]
    fn test_invalid_numbers_fall_back() {
        clear_env();
        set("SERVICE_ROLE", "catalog-authority");
        set("PORT", "not-a-port");
        set("DB_CONNECT_RETRIES", "-1");
        let config = Config::from_env().unwrap();
        clear_env();

        assert_eq!(config.port, 50052);
        assert_eq!(config.db_connect_retries, 10);
    }

    #[test]
    #[serial]
    fn test_hostname_is_advertised() {
        clear_env();
        set("SERVICE_ROLE", "user-authority");
        set("HOSTNAME", "users-7f9c");
        let config = Config::from_env().unwrap();
        clear_env();

        assert_eq!(config.advertise_host, "users-7f9c");
    }

    #[test]
    #[serial]
    fn test_unknown_role_is_an_error() {
        clear_env();
        set("SERVICE_ROLE", "payments");
        let err = Config::from_env().unwrap_err();
        clear_env();

        assert_eq!(err, ConfigError::UnknownRole("payments".to_string()));
    }
}
