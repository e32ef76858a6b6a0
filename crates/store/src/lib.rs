//! Record storage for the backend services.
//!
//! Each service talks to its store through one of the traits in [`store`];
//! the in-memory implementation backs tests and single-process runs, the
//! PostgreSQL implementation backs deployments.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use store::{CatalogStore, OrderStore, UserStore};
