//! Order service contract and its HTTP client.

use async_trait::async_trait;
use common::{CatalogItemId, Order, OrderId, ServiceError, ServiceLocation, UserId};
use serde::{Deserialize, Serialize};

use super::http::HttpTransport;

/// A request to place an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub user_id: UserId,
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
}

/// One requested line. `quantity` is optional on the wire so that a missing
/// value is reported as invalid input rather than a decoding failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemRequest {
    pub catalog_item_id: CatalogItemId,
    #[serde(default)]
    pub quantity: Option<i64>,
}

impl OrderItemRequest {
    pub fn new(catalog_item_id: CatalogItemId, quantity: i64) -> Self {
        Self {
            catalog_item_id,
            quantity: Some(quantity),
        }
    }
}

/// Operations offered by the order service.
#[async_trait]
pub trait OrderAuthority: Send + Sync {
    async fn create_order(&self, request: CreateOrderRequest) -> Result<Order, ServiceError>;

    async fn get_order(&self, id: OrderId) -> Result<Order, ServiceError>;

    async fn list_orders(&self) -> Result<Vec<Order>, ServiceError>;
}

/// Calls one resolved order service instance.
#[derive(Clone)]
pub struct HttpOrderClient {
    transport: HttpTransport,
}

impl HttpOrderClient {
    pub fn new(client: reqwest::Client, location: ServiceLocation) -> Self {
        Self {
            transport: HttpTransport::new(client, location),
        }
    }
}

#[async_trait]
impl OrderAuthority for HttpOrderClient {
    async fn create_order(&self, request: CreateOrderRequest) -> Result<Order, ServiceError> {
        self.transport.post("/orders", &request).await
    }

    async fn get_order(&self, id: OrderId) -> Result<Order, ServiceError> {
        self.transport.get(&format!("/orders/{id}")).await
    }

    async fn list_orders(&self) -> Result<Vec<Order>, ServiceError> {
        self.transport.get("/orders").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_quantity_decodes_as_none() {
        let request: CreateOrderRequest = serde_json::from_str(
            r#"{"user_id": 1, "items": [{"catalog_item_id": 3}, {"catalog_item_id": 4, "quantity": 2}]}"#,
        )
        .unwrap();
        assert_eq!(request.user_id, UserId::new(1));
        assert_eq!(request.items[0].quantity, None);
        assert_eq!(request.items[1], OrderItemRequest::new(CatalogItemId::new(4), 2));
    }
}
