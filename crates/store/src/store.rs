use async_trait::async_trait;
use common::{
    CatalogItem, CatalogItemId, Money, NewCatalogItem, NewOrder, NewUser, Order, OrderId, User,
    UserId,
};

use crate::Result;

/// Storage owned by the user authority.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user and returns it with its assigned id.
    ///
    /// Fails with `UniqueViolation` if the email is already taken.
    async fn insert_user(&self, user: NewUser) -> Result<User>;

    /// Fails with `NotFound` if no user has this id.
    async fn get_user(&self, id: UserId) -> Result<User>;

    /// Returns all users in ascending id order.
    async fn list_users(&self) -> Result<Vec<User>>;
}

/// Storage owned by the catalog authority.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn insert_catalog_item(&self, item: NewCatalogItem) -> Result<CatalogItem>;

    /// Fails with `NotFound` if no item has this id.
    async fn get_catalog_item(&self, id: CatalogItemId) -> Result<CatalogItem>;

    /// Returns all items in ascending id order.
    async fn list_catalog_items(&self) -> Result<Vec<CatalogItem>>;

    /// Replaces an item's price and returns the updated item.
    async fn update_catalog_item_price(
        &self,
        id: CatalogItemId,
        price: Money,
    ) -> Result<CatalogItem>;
}

/// Storage owned by the order service.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts the order row and every line row atomically.
    ///
    /// Either all rows become visible or none do. Lines are stored and
    /// returned in the order given.
    async fn insert_order(&self, order: NewOrder) -> Result<Order>;

    /// Fails with `NotFound` if no order has this id.
    async fn get_order(&self, id: OrderId) -> Result<Order>;

    /// Returns all orders with their lines, in ascending id order.
    async fn list_orders(&self) -> Result<Vec<Order>>;
}
