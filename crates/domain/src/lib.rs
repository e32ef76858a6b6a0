//! Backend record services.
//!
//! Each service owns exactly one entity type and is constructed over the
//! store it persists to:
//! - [`UserService`] for the user authority
//! - [`CatalogService`] for the catalog authority
//! - [`OrderQueries`] for reading orders back out of the order service
//!
//! Storage faults never cross this boundary verbatim; they surface as
//! internal errors.

pub mod catalog;
pub mod error;
pub mod orders;
pub mod user;

pub use catalog::{CatalogService, MAX_PRICE};
pub use error::DomainError;
pub use orders::OrderQueries;
pub use user::UserService;
