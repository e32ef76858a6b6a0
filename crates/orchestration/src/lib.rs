//! Request orchestration over discovered services.
//!
//! This crate holds the parts of the system that talk to more than one
//! service:
//! - typed clients for the user, catalog and order services, including
//!   variants that resolve a fresh location through the directory on every
//!   call ([`clients`])
//! - the [`FanOutAggregator`], which runs independent sub-requests
//!   concurrently and reports either every result or every failure
//! - the [`OrderWorkflow`], which validates an order's references against
//!   the owning services, snapshots their prices and persists the order
//!   atomically

pub mod aggregator;
pub mod clients;
pub mod error;
pub mod order_workflow;
pub mod state;

pub use aggregator::{
    AggregateFailure, AggregateRequest, AggregateRequestError, AggregateResult, AggregateSuccess,
    FanOutAggregator, HttpInvoker, Invoker, RemoteCall, RemoteRecord, SubRequest, UserAndItem,
};
pub use clients::{
    CatalogAuthority, CreateOrderRequest, DiscoveredCatalogAuthority, DiscoveredOrderAuthority,
    DiscoveredUserAuthority, HttpCatalogClient, HttpOrderClient, HttpUserClient,
    InMemoryCatalogAuthority, InMemoryUserAuthority, OrderAuthority, OrderItemRequest,
    UserAuthority,
};
pub use error::OrderWorkflowError;
pub use order_workflow::{MAX_QUANTITY, OrderWorkflow};
pub use state::WorkflowState;
