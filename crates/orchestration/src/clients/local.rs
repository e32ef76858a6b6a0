//! The record services themselves, seen through their service contracts.
//!
//! A backend process serves its own records through these impls, so the
//! HTTP routes are written once against the contract and shared with the
//! gateway, which serves the same routes over discovered clients.

use async_trait::async_trait;
use common::{
    CatalogItem, CatalogItemId, Money, NewCatalogItem, NewUser, Order, OrderId, ServiceError,
    User, UserId,
};
use domain::{CatalogService, UserService};
use store::{CatalogStore, OrderStore, UserStore};

use super::catalog::CatalogAuthority;
use super::order::{CreateOrderRequest, OrderAuthority};
use super::user::UserAuthority;
use crate::order_workflow::OrderWorkflow;

#[async_trait]
impl<S: UserStore> UserAuthority for UserService<S> {
    async fn create_user(&self, user: NewUser) -> Result<User, ServiceError> {
        Ok(UserService::create_user(self, user).await?)
    }

    async fn get_user(&self, id: UserId) -> Result<User, ServiceError> {
        Ok(UserService::get_user(self, id).await?)
    }

    async fn list_users(&self) -> Result<Vec<User>, ServiceError> {
        Ok(UserService::list_users(self).await?)
    }
}

#[async_trait]
impl<S: CatalogStore> CatalogAuthority for CatalogService<S> {
    async fn create_item(&self, item: NewCatalogItem) -> Result<CatalogItem, ServiceError> {
        Ok(CatalogService::create_item(self, item).await?)
    }

    async fn get_item(&self, id: CatalogItemId) -> Result<CatalogItem, ServiceError> {
        Ok(CatalogService::get_item(self, id).await?)
    }

    async fn list_items(&self) -> Result<Vec<CatalogItem>, ServiceError> {
        Ok(CatalogService::list_items(self).await?)
    }

    async fn update_price(
        &self,
        id: CatalogItemId,
        price: Money,
    ) -> Result<CatalogItem, ServiceError> {
        Ok(CatalogService::update_price(self, id, price).await?)
    }
}

#[async_trait]
impl<S, U, C> OrderAuthority for OrderWorkflow<S, U, C>
where
    S: OrderStore + Clone,
    U: UserAuthority,
    C: CatalogAuthority,
{
    async fn create_order(&self, request: CreateOrderRequest) -> Result<Order, ServiceError> {
        Ok(OrderWorkflow::create_order(self, request).await?)
    }

    async fn get_order(&self, id: OrderId) -> Result<Order, ServiceError> {
        Ok(OrderWorkflow::get_order(self, id).await?)
    }

    async fn list_orders(&self) -> Result<Vec<Order>, ServiceError> {
        Ok(OrderWorkflow::list_orders(self).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ErrorKind;
    use store::InMemoryStore;

    #[tokio::test]
    async fn test_user_service_speaks_the_contract() {
        let users: Box<dyn UserAuthority> = Box::new(UserService::new(InMemoryStore::new()));

        let created = users
            .create_user(NewUser {
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(users.get_user(created.id).await.unwrap(), created);

        let err = users.get_user(UserId::new(999)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(err.message, "user 999 not found");
    }

    #[tokio::test]
    async fn test_catalog_service_speaks_the_contract() {
        let catalog: Box<dyn CatalogAuthority> =
            Box::new(CatalogService::new(InMemoryStore::new()));

        let item = catalog
            .create_item(NewCatalogItem {
                name: "Tea".to_string(),
                description: String::new(),
                price: Money::from_cents(200),
            })
            .await
            .unwrap();
        let updated = catalog
            .update_price(item.id, Money::from_cents(-5))
            .await
            .unwrap_err();
        assert_eq!(updated.kind, ErrorKind::InvalidArgument);
        assert_eq!(catalog.list_items().await.unwrap(), vec![item]);
    }
}
