//! Catalog service contract, its HTTP client and an in-memory double.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use common::{CatalogItem, CatalogItemId, Money, NewCatalogItem, ServiceError, ServiceLocation};
use serde::{Deserialize, Serialize};

use super::http::HttpTransport;

/// Body of a price update request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriceUpdate {
    pub price_cents: Money,
}

/// Operations offered by the catalog authority.
#[async_trait]
pub trait CatalogAuthority: Send + Sync {
    async fn create_item(&self, item: NewCatalogItem) -> Result<CatalogItem, ServiceError>;

    async fn get_item(&self, id: CatalogItemId) -> Result<CatalogItem, ServiceError>;

    async fn list_items(&self) -> Result<Vec<CatalogItem>, ServiceError>;

    /// Changes the current price. Orders already placed keep their snapshot.
    async fn update_price(
        &self,
        id: CatalogItemId,
        price: Money,
    ) -> Result<CatalogItem, ServiceError>;
}

/// Calls one resolved catalog service instance.
#[derive(Clone)]
pub struct HttpCatalogClient {
    transport: HttpTransport,
}

impl HttpCatalogClient {
    pub fn new(client: reqwest::Client, location: ServiceLocation) -> Self {
        Self {
            transport: HttpTransport::new(client, location),
        }
    }
}

#[async_trait]
impl CatalogAuthority for HttpCatalogClient {
    async fn create_item(&self, item: NewCatalogItem) -> Result<CatalogItem, ServiceError> {
        self.transport.post("/catalog-items", &item).await
    }

    async fn get_item(&self, id: CatalogItemId) -> Result<CatalogItem, ServiceError> {
        self.transport.get(&format!("/catalog-items/{id}")).await
    }

    async fn list_items(&self) -> Result<Vec<CatalogItem>, ServiceError> {
        self.transport.get("/catalog-items").await
    }

    async fn update_price(
        &self,
        id: CatalogItemId,
        price: Money,
    ) -> Result<CatalogItem, ServiceError> {
        self.transport
            .put(
                &format!("/catalog-items/{id}/price"),
                &PriceUpdate { price_cents: price },
            )
            .await
    }
}

#[derive(Debug, Default)]
struct InMemoryCatalogState {
    items: BTreeMap<CatalogItemId, CatalogItem>,
    next_id: i64,
    failing: HashSet<CatalogItemId>,
    lookups: usize,
}

/// In-memory catalog authority for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalogAuthority {
    state: Arc<Mutex<InMemoryCatalogState>>,
}

impl InMemoryCatalogAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes lookups of `id` fail with `Unavailable`.
    pub fn set_unavailable_for(&self, id: CatalogItemId, unavailable: bool) {
        let mut state = self.lock();
        if unavailable {
            state.failing.insert(id);
        } else {
            state.failing.remove(&id);
        }
    }

    /// Number of `get_item` calls received so far.
    pub fn lookup_count(&self) -> usize {
        self.lock().lookups
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, InMemoryCatalogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn missing(id: CatalogItemId) -> ServiceError {
    ServiceError::not_found(format!("catalog item {id} not found"))
}

#[async_trait]
impl CatalogAuthority for InMemoryCatalogAuthority {
    async fn create_item(&self, item: NewCatalogItem) -> Result<CatalogItem, ServiceError> {
        if item.price.is_negative() {
            return Err(ServiceError::invalid_argument("price must not be negative"));
        }
        let mut state = self.lock();
        state.next_id += 1;
        let item = CatalogItem {
            id: CatalogItemId::new(state.next_id),
            name: item.name,
            description: item.description,
            price: item.price,
        };
        state.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn get_item(&self, id: CatalogItemId) -> Result<CatalogItem, ServiceError> {
        let mut state = self.lock();
        state.lookups += 1;
        if state.failing.contains(&id) {
            return Err(ServiceError::unavailable(
                "no healthy instances of service catalog-authority found",
            ));
        }
        state.items.get(&id).cloned().ok_or_else(|| missing(id))
    }

    async fn list_items(&self) -> Result<Vec<CatalogItem>, ServiceError> {
        Ok(self.lock().items.values().cloned().collect())
    }

    async fn update_price(
        &self,
        id: CatalogItemId,
        price: Money,
    ) -> Result<CatalogItem, ServiceError> {
        if price.is_negative() {
            return Err(ServiceError::invalid_argument("price must not be negative"));
        }
        let mut state = self.lock();
        let item = state.items.get_mut(&id).ok_or_else(|| missing(id))?;
        item.price = price;
        Ok(item.clone())
    }
}
