//! Read side of the order service.

use common::{Order, OrderId};
use store::OrderStore;

use crate::error::DomainError;

/// Reads persisted orders. Creation goes through the order workflow, which
/// has to validate references against the other services first.
pub struct OrderQueries<S: OrderStore> {
    store: S,
}

impl<S: OrderStore> OrderQueries<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Loads an order with all of its lines.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, id: OrderId) -> Result<Order, DomainError> {
        Ok(self.store.get_order(id).await?)
    }

    /// Lists every order with its lines.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<Order>, DomainError> {
        Ok(self.store.list_orders().await?)
    }
}
