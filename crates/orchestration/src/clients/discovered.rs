//! Clients that resolve a fresh service location on every call.
//!
//! Nothing resolved is cached: each operation asks the directory for a
//! healthy instance, builds a short-lived typed client for it and issues
//! exactly one call. Health changes are therefore observed on the very next
//! operation. The underlying `reqwest::Client` is shared, so connections to
//! an instance may still be pooled.

use async_trait::async_trait;
use common::{
    CatalogItem, CatalogItemId, Money, NewCatalogItem, NewUser, Order, OrderId, ServiceError,
    ServiceLocation, User, UserId,
};
use discovery::{CATALOG_AUTHORITY, ORDER_SERVICE, SharedDirectory, USER_AUTHORITY};

use super::catalog::{CatalogAuthority, HttpCatalogClient};
use super::order::{CreateOrderRequest, HttpOrderClient, OrderAuthority};
use super::user::{HttpUserClient, UserAuthority};

#[derive(Clone)]
struct Resolver {
    directory: SharedDirectory,
    http: reqwest::Client,
    service: &'static str,
}

impl Resolver {
    async fn resolve(&self) -> Result<ServiceLocation, ServiceError> {
        Ok(self.directory.resolve(self.service).await?)
    }
}

/// User authority reached through service discovery.
#[derive(Clone)]
pub struct DiscoveredUserAuthority {
    resolver: Resolver,
}

impl DiscoveredUserAuthority {
    pub fn new(directory: SharedDirectory, http: reqwest::Client) -> Self {
        Self {
            resolver: Resolver {
                directory,
                http,
                service: USER_AUTHORITY,
            },
        }
    }

    async fn connect(&self) -> Result<HttpUserClient, ServiceError> {
        let location = self.resolver.resolve().await?;
        Ok(HttpUserClient::new(self.resolver.http.clone(), location))
    }
}

#[async_trait]
impl UserAuthority for DiscoveredUserAuthority {
    async fn create_user(&self, user: NewUser) -> Result<User, ServiceError> {
        self.connect().await?.create_user(user).await
    }

    async fn get_user(&self, id: UserId) -> Result<User, ServiceError> {
        self.connect().await?.get_user(id).await
    }

    async fn list_users(&self) -> Result<Vec<User>, ServiceError> {
        self.connect().await?.list_users().await
    }
}

/// Catalog authority reached through service discovery.
#[derive(Clone)]
pub struct DiscoveredCatalogAuthority {
    resolver: Resolver,
}

impl DiscoveredCatalogAuthority {
    pub fn new(directory: SharedDirectory, http: reqwest::Client) -> Self {
        Self {
            resolver: Resolver {
                directory,
                http,
                service: CATALOG_AUTHORITY,
            },
        }
    }

    async fn connect(&self) -> Result<HttpCatalogClient, ServiceError> {
        let location = self.resolver.resolve().await?;
        Ok(HttpCatalogClient::new(self.resolver.http.clone(), location))
    }
}

#[async_trait]
impl CatalogAuthority for DiscoveredCatalogAuthority {
    async fn create_item(&self, item: NewCatalogItem) -> Result<CatalogItem, ServiceError> {
        self.connect().await?.create_item(item).await
    }

    async fn get_item(&self, id: CatalogItemId) -> Result<CatalogItem, ServiceError> {
        self.connect().await?.get_item(id).await
    }

    async fn list_items(&self) -> Result<Vec<CatalogItem>, ServiceError> {
        self.connect().await?.list_items().await
    }

    async fn update_price(
        &self,
        id: CatalogItemId,
        price: Money,
    ) -> Result<CatalogItem, ServiceError> {
        self.connect().await?.update_price(id, price).await
    }
}

/// Order service reached through service discovery.
#[derive(Clone)]
pub struct DiscoveredOrderAuthority {
    resolver: Resolver,
}

impl DiscoveredOrderAuthority {
    pub fn new(directory: SharedDirectory, http: reqwest::Client) -> Self {
        Self {
            resolver: Resolver {
                directory,
                http,
                service: ORDER_SERVICE,
            },
        }
    }

    async fn connect(&self) -> Result<HttpOrderClient, ServiceError> {
        let location = self.resolver.resolve().await?;
        Ok(HttpOrderClient::new(self.resolver.http.clone(), location))
    }
}

#[async_trait]
impl OrderAuthority for DiscoveredOrderAuthority {
    async fn create_order(&self, request: CreateOrderRequest) -> Result<Order, ServiceError> {
        self.connect().await?.create_order(request).await
    }

    async fn get_order(&self, id: OrderId) -> Result<Order, ServiceError> {
        self.connect().await?.get_order(id).await
    }

    async fn list_orders(&self) -> Result<Vec<Order>, ServiceError> {
        self.connect().await?.list_orders().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use common::ErrorKind;
    use discovery::InMemoryDirectory;

    #[tokio::test]
    async fn test_empty_directory_is_unavailable() {
        let directory: SharedDirectory = Arc::new(InMemoryDirectory::new());
        let users = DiscoveredUserAuthority::new(directory, reqwest::Client::new());

        let err = users.get_user(UserId::new(1)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unavailable);
        assert_eq!(
            err.message,
            "no healthy instances of service user-authority found"
        );
    }
}
