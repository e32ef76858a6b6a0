//! Shared types for the service mesh.
//!
//! Every crate in the workspace speaks in terms of these records, ids and
//! errors, so they live here rather than in any one service.

pub mod error;
pub mod ids;
pub mod location;
pub mod money;
pub mod records;

pub use error::{ErrorKind, ServiceError};
pub use ids::{CatalogItemId, OrderId, UserId};
pub use location::ServiceLocation;
pub use money::Money;
pub use records::{
    CatalogItem, NewCatalogItem, NewOrder, NewOrderLine, NewUser, Order, OrderLine, OrderStatus,
    ParseOrderStatusError, User,
};
