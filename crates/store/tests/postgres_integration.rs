//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use common::{
    CatalogItemId, Money, NewCatalogItem, NewOrder, NewOrderLine, NewUser, OrderId, OrderStatus,
    UserId,
};
use sqlx::PgPool;
use store::{CatalogStore, OrderStore, PostgresStore, StoreError, UserStore};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            PostgresStore::new(temp_pool.clone())
                .run_migrations()
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE order_lines, orders, catalog_items, users RESTART IDENTITY")
        .execute(&pool)
        .await
        .unwrap();

    PostgresStore::new(pool)
}

fn line(item: i64, quantity: u32, cents: i64) -> NewOrderLine {
    NewOrderLine {
        catalog_item_id: CatalogItemId::new(item),
        quantity,
        unit_price: Money::from_cents(cents),
    }
}

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let store = get_test_store().await;
    store.run_migrations().await.unwrap();
    store.run_migrations().await.unwrap();
}

#[tokio::test]
async fn test_insert_and_get_user() {
    let store = get_test_store().await;

    let user = store
        .insert_user(NewUser {
            name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(user.name, "Jane Doe");
    assert_eq!(user.email, "jane@example.com");

    let fetched = store.get_user(user.id).await.unwrap();
    assert_eq!(fetched, user);
}

#[tokio::test]
async fn test_duplicate_email_is_unique_violation() {
    let store = get_test_store().await;
    let new_user = NewUser {
        name: "Jane".to_string(),
        email: "jane@example.com".to_string(),
    };

    store.insert_user(new_user.clone()).await.unwrap();
    let err = store.insert_user(new_user).await.unwrap_err();

    match err {
        StoreError::UniqueViolation { constraint } => assert_eq!(constraint, "users_email_key"),
        other => panic!("expected unique violation, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_user_is_not_found() {
    let store = get_test_store().await;
    let err = store.get_user(UserId::new(999)).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_catalog_price_update() {
    let store = get_test_store().await;

    let item = store
        .insert_catalog_item(NewCatalogItem {
            name: "Coffee".to_string(),
            description: "Filter".to_string(),
            price: Money::from_cents(250),
        })
        .await
        .unwrap();

    let updated = store
        .update_catalog_item_price(item.id, Money::from_cents(275))
        .await
        .unwrap();
    assert_eq!(updated.price, Money::from_cents(275));

    let err = store
        .update_catalog_item_price(CatalogItemId::new(999), Money::from_cents(1))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_order_with_lines_round_trips() {
    let store = get_test_store().await;

    let order = store
        .insert_order(NewOrder {
            user_id: UserId::new(1),
            status: OrderStatus::Pending,
            lines: vec![line(1, 2, 250), line(2, 1, 200)],
        })
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.lines.len(), 2);

    let fetched = store.get_order(order.id).await.unwrap();
    assert_eq!(fetched.lines, order.lines);
    assert_eq!(fetched.total(), Money::from_cents(700));
}

#[tokio::test]
async fn test_failing_second_line_rolls_back_order() {
    let store = get_test_store().await;

    // quantity 0 violates the CHECK constraint on the second insert
    let result = store
        .insert_order(NewOrder {
            user_id: UserId::new(1),
            status: OrderStatus::Pending,
            lines: vec![line(1, 1, 250), line(2, 0, 200)],
        })
        .await;
    assert!(matches!(result, Err(StoreError::Database(_))));

    let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(store.pool())
        .await
        .unwrap();
    let lines: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_lines")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(orders, 0);
    assert_eq!(lines, 0);

    let err = store.get_order(OrderId::new(1)).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_list_orders_attaches_lines_to_their_orders() {
    let store = get_test_store().await;

    let first = store
        .insert_order(NewOrder {
            user_id: UserId::new(1),
            status: OrderStatus::Pending,
            lines: vec![line(1, 2, 250)],
        })
        .await
        .unwrap();
    let second = store
        .insert_order(NewOrder {
            user_id: UserId::new(2),
            status: OrderStatus::Pending,
            lines: vec![line(2, 1, 300), line(3, 4, 100)],
        })
        .await
        .unwrap();

    let orders = store.list_orders().await.unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].id, first.id);
    assert_eq!(orders[0].lines.len(), 1);
    assert_eq!(orders[1].id, second.id);
    assert_eq!(orders[1].lines.len(), 2);
    assert_eq!(orders[1].lines[1].catalog_item_id, CatalogItemId::new(3));
}
