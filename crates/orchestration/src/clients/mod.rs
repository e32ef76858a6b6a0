//! Typed clients for the record services.
//!
//! Each service contract is a trait. The `Http*` clients are bound to one
//! resolved [`ServiceLocation`](common::ServiceLocation); the `Discovered*`
//! clients resolve a location through the directory on every call and build
//! a short-lived `Http*` client for it. The `InMemory*` authorities are test
//! doubles. The record services and the order workflow implement the same
//! traits, so one process can serve its own records behind the contract.

pub mod catalog;
pub mod discovered;
pub mod http;
mod local;
pub mod order;
pub mod user;

pub use catalog::{CatalogAuthority, HttpCatalogClient, InMemoryCatalogAuthority, PriceUpdate};
pub use discovered::{
    DiscoveredCatalogAuthority, DiscoveredOrderAuthority, DiscoveredUserAuthority,
};
pub use http::HttpTransport;
pub use order::{CreateOrderRequest, HttpOrderClient, OrderAuthority, OrderItemRequest};
pub use user::{HttpUserClient, InMemoryUserAuthority, UserAuthority};
