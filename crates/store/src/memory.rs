use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{
    CatalogItem, CatalogItemId, Money, NewCatalogItem, NewOrder, NewUser, Order, OrderId,
    OrderLine, User, UserId,
};
use tokio::sync::RwLock;

use crate::{
    Result, StoreError,
    store::{CatalogStore, OrderStore, UserStore},
};

#[derive(Default)]
struct State {
    users: BTreeMap<UserId, User>,
    catalog: BTreeMap<CatalogItemId, CatalogItem>,
    orders: BTreeMap<OrderId, Order>,
    next_user_id: i64,
    next_item_id: i64,
    next_order_id: i64,
    /// 1-based index of the order line whose insert should fail.
    fail_on_order_line: Option<usize>,
    fail_all: bool,
}

/// In-memory record store for testing.
///
/// Implements all three store traits with the same observable behavior as
/// the PostgreSQL implementation, including all-or-nothing order inserts.
/// Faults can be injected to exercise error paths.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the insert of the `line`-th order line (1-based) fail.
    pub async fn fail_on_order_line(&self, line: Option<usize>) {
        self.state.write().await.fail_on_order_line = line;
    }

    /// Makes every operation fail with a store fault.
    pub async fn set_fail_all(&self, fail: bool) {
        self.state.write().await.fail_all = fail;
    }

    /// Returns the number of persisted orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Returns the number of persisted order lines across all orders.
    pub async fn order_line_count(&self) -> usize {
        self.state
            .read()
            .await
            .orders
            .values()
            .map(|o| o.lines.len())
            .sum()
    }
}

fn check_fault(state: &State) -> Result<()> {
    if state.fail_all {
        return Err(StoreError::Fault("store unavailable".to_string()));
    }
    Ok(())
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let mut state = self.state.write().await;
        check_fault(&state)?;

        if state.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::UniqueViolation {
                constraint: "users_email_key".to_string(),
            });
        }

        state.next_user_id += 1;
        let user = User {
            id: UserId::new(state.next_user_id),
            name: user.name,
            email: user.email,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<User> {
        let state = self.state.read().await;
        check_fault(&state)?;
        state.users.get(&id).cloned().ok_or(StoreError::NotFound {
            entity: "user",
            id: id.as_i64(),
        })
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let state = self.state.read().await;
        check_fault(&state)?;
        Ok(state.users.values().cloned().collect())
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn insert_catalog_item(&self, item: NewCatalogItem) -> Result<CatalogItem> {
        let mut state = self.state.write().await;
        check_fault(&state)?;

        state.next_item_id += 1;
        let item = CatalogItem {
            id: CatalogItemId::new(state.next_item_id),
            name: item.name,
            description: item.description,
            price: item.price,
        };
        state.catalog.insert(item.id, item.clone());
        Ok(item)
    }

    async fn get_catalog_item(&self, id: CatalogItemId) -> Result<CatalogItem> {
        let state = self.state.read().await;
        check_fault(&state)?;
        state.catalog.get(&id).cloned().ok_or(StoreError::NotFound {
            entity: "catalog item",
            id: id.as_i64(),
        })
    }

    async fn list_catalog_items(&self) -> Result<Vec<CatalogItem>> {
        let state = self.state.read().await;
        check_fault(&state)?;
        Ok(state.catalog.values().cloned().collect())
    }

    async fn update_catalog_item_price(
        &self,
        id: CatalogItemId,
        price: Money,
    ) -> Result<CatalogItem> {
        let mut state = self.state.write().await;
        check_fault(&state)?;
        let item = state.catalog.get_mut(&id).ok_or(StoreError::NotFound {
            entity: "catalog item",
            id: id.as_i64(),
        })?;
        item.price = price;
        Ok(item.clone())
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn insert_order(&self, order: NewOrder) -> Result<Order> {
        let mut state = self.state.write().await;
        check_fault(&state)?;

        let order_id = OrderId::new(state.next_order_id + 1);

        // Stage every line before touching the map; a failure leaves no trace.
        let mut lines = Vec::with_capacity(order.lines.len());
        for (index, line) in order.lines.into_iter().enumerate() {
            if state.fail_on_order_line == Some(index + 1) {
                return Err(StoreError::Fault(format!(
                    "insert of order line {} failed",
                    index + 1
                )));
            }
            lines.push(OrderLine {
                order_id,
                catalog_item_id: line.catalog_item_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
            });
        }

        let order = Order {
            id: order_id,
            user_id: order.user_id,
            status: order.status,
            created_at: Utc::now(),
            lines,
        };
        state.next_order_id = order_id.as_i64();
        state.orders.insert(order_id, order.clone());
        Ok(order)
    }

    async fn get_order(&self, id: OrderId) -> Result<Order> {
        let state = self.state.read().await;
        check_fault(&state)?;
        state.orders.get(&id).cloned().ok_or(StoreError::NotFound {
            entity: "order",
            id: id.as_i64(),
        })
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        check_fault(&state)?;
        Ok(state.orders.values().cloned().collect())
    }
}
