//! Service directory client.
//!
//! Callers never hold fixed addresses. Every outbound call first asks a
//! [`Directory`] for a currently healthy instance of a logical service name,
//! and every backend registers itself with the directory on startup.
//!
//! Two implementations are provided:
//! - [`ConsulDirectory`] talks to a Consul agent over its HTTP API
//! - [`InMemoryDirectory`] keeps instances in process, for tests and
//!   single-process runs

pub mod consul;
pub mod directory;
pub mod error;
pub mod memory;

pub use consul::ConsulDirectory;
pub use directory::{Directory, HealthCheck, Registration, SharedDirectory};
pub use error::DiscoveryError;
pub use memory::InMemoryDirectory;

/// Logical name of the user authority.
pub const USER_AUTHORITY: &str = "user-authority";
/// Logical name of the catalog authority.
pub const CATALOG_AUTHORITY: &str = "catalog-authority";
/// Logical name of the order service.
pub const ORDER_SERVICE: &str = "order-service";
