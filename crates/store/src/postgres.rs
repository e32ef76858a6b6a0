use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use common::{
    CatalogItem, CatalogItemId, Money, NewCatalogItem, NewOrder, NewUser, Order, OrderId,
    OrderLine, OrderStatus, User, UserId,
};
use sqlx::{
    PgPool, Row,
    postgres::{PgPoolOptions, PgRow},
};

use crate::{
    Result, StoreError,
    store::{CatalogStore, OrderStore, UserStore},
};

/// PostgreSQL-backed record store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to `database_url`, retrying up to `attempts` times with
    /// `delay` between tries. The database often starts after the service.
    pub async fn connect(database_url: &str, attempts: u32, delay: Duration) -> Result<Self> {
        let attempts = attempts.max(1);
        let mut attempt = 1;
        loop {
            match PgPoolOptions::new()
                .max_connections(10)
                .connect(database_url)
                .await
            {
                Ok(pool) => {
                    tracing::info!(attempt, "connected to database");
                    return Ok(Self::new(pool));
                }
                Err(e) if attempt < attempts => {
                    tracing::warn!(attempt, attempts, error = %e, "database not ready, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Applies the additive schema.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_user(row: PgRow) -> Result<User> {
        Ok(User {
            id: UserId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            email: row.try_get("email")?,
        })
    }

    fn row_to_catalog_item(row: PgRow) -> Result<CatalogItem> {
        Ok(CatalogItem {
            id: CatalogItemId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: Money::from_cents(row.try_get("price_cents")?),
        })
    }

    fn row_to_order(row: &PgRow) -> Result<Order> {
        let status: String = row.try_get("status")?;
        Ok(Order {
            id: OrderId::new(row.try_get("id")?),
            user_id: UserId::new(row.try_get("user_id")?),
            status: status
                .parse::<OrderStatus>()
                .map_err(|e| StoreError::InvalidValue(e.to_string()))?,
            created_at: row.try_get("created_at")?,
            lines: Vec::new(),
        })
    }

    fn row_to_order_line(row: &PgRow) -> Result<OrderLine> {
        let quantity: i32 = row.try_get("quantity")?;
        Ok(OrderLine {
            order_id: OrderId::new(row.try_get("order_id")?),
            catalog_item_id: CatalogItemId::new(row.try_get("catalog_item_id")?),
            quantity: u32::try_from(quantity)
                .map_err(|_| StoreError::InvalidValue(format!("negative quantity {quantity}")))?,
            unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
        })
    }
}

/// Maps unique-constraint failures to `UniqueViolation`, everything else to
/// `Database`.
fn classify_write_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return StoreError::UniqueViolation {
            constraint: db_err.constraint().unwrap_or("unknown").to_string(),
        };
    }
    StoreError::Database(e)
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (name, email)
            VALUES ($1, $2)
            RETURNING id, name, email
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .fetch_one(&self.pool)
        .await
        .map_err(classify_write_error)?;

        Self::row_to_user(row)
    }

    async fn get_user(&self, id: UserId) -> Result<User> {
        let row = sqlx::query("SELECT id, name, email FROM users WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Self::row_to_user(row),
            None => Err(StoreError::NotFound {
                entity: "user",
                id: id.as_i64(),
            }),
        }
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let rows = sqlx::query("SELECT id, name, email FROM users ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_user).collect()
    }
}

#[async_trait]
impl CatalogStore for PostgresStore {
    async fn insert_catalog_item(&self, item: NewCatalogItem) -> Result<CatalogItem> {
        let row = sqlx::query(
            r#"
            INSERT INTO catalog_items (name, description, price_cents)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, price_cents
            "#,
        )
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.price.cents())
        .fetch_one(&self.pool)
        .await
        .map_err(classify_write_error)?;

        Self::row_to_catalog_item(row)
    }

    async fn get_catalog_item(&self, id: CatalogItemId) -> Result<CatalogItem> {
        let row = sqlx::query(
            "SELECT id, name, description, price_cents FROM catalog_items WHERE id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_catalog_item(row),
            None => Err(StoreError::NotFound {
                entity: "catalog item",
                id: id.as_i64(),
            }),
        }
    }

    async fn list_catalog_items(&self) -> Result<Vec<CatalogItem>> {
        let rows = sqlx::query(
            "SELECT id, name, description, price_cents FROM catalog_items ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_catalog_item).collect()
    }

    async fn update_catalog_item_price(
        &self,
        id: CatalogItemId,
        price: Money,
    ) -> Result<CatalogItem> {
        let row = sqlx::query(
            r#"
            UPDATE catalog_items
            SET price_cents = $2, updated_at = now()
            WHERE id = $1
            RETURNING id, name, description, price_cents
            "#,
        )
        .bind(id.as_i64())
        .bind(price.cents())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_catalog_item(row),
            None => Err(StoreError::NotFound {
                entity: "catalog item",
                id: id.as_i64(),
            }),
        }
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn insert_order(&self, order: NewOrder) -> Result<Order> {
        // Dropping `tx` on any early return rolls the whole order back.
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            INSERT INTO orders (user_id, status)
            VALUES ($1, $2)
            RETURNING id, user_id, status, created_at
            "#,
        )
        .bind(order.user_id.as_i64())
        .bind(order.status.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let mut persisted = Self::row_to_order(&row)?;

        for (position, line) in order.lines.into_iter().enumerate() {
            let quantity = i32::try_from(line.quantity).map_err(|_| {
                StoreError::InvalidValue(format!("quantity {} out of range", line.quantity))
            })?;
            let position = i32::try_from(position)
                .map_err(|_| StoreError::InvalidValue("too many order lines".to_string()))?;

            sqlx::query(
                r#"
                INSERT INTO order_lines (order_id, position, catalog_item_id, quantity, unit_price_cents)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(persisted.id.as_i64())
            .bind(position)
            .bind(line.catalog_item_id.as_i64())
            .bind(quantity)
            .bind(line.unit_price.cents())
            .execute(&mut *tx)
            .await?;

            persisted.lines.push(OrderLine {
                order_id: persisted.id,
                catalog_item_id: line.catalog_item_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
            });
        }

        tx.commit().await?;
        Ok(persisted)
    }

    async fn get_order(&self, id: OrderId) -> Result<Order> {
        let row = sqlx::query("SELECT id, user_id, status, created_at FROM orders WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        let mut order = match row {
            Some(row) => Self::row_to_order(&row)?,
            None => {
                return Err(StoreError::NotFound {
                    entity: "order",
                    id: id.as_i64(),
                });
            }
        };

        let lines = sqlx::query(
            r#"
            SELECT order_id, catalog_item_id, quantity, unit_price_cents
            FROM order_lines
            WHERE order_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        order.lines = lines
            .iter()
            .map(Self::row_to_order_line)
            .collect::<Result<_>>()?;
        Ok(order)
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query("SELECT id, user_id, status, created_at FROM orders ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;

        let mut orders: Vec<Order> = rows.iter().map(Self::row_to_order).collect::<Result<_>>()?;
        if orders.is_empty() {
            return Ok(orders);
        }

        let ids: Vec<i64> = orders.iter().map(|o| o.id.as_i64()).collect();
        let line_rows = sqlx::query(
            r#"
            SELECT order_id, catalog_item_id, quantity, unit_price_cents
            FROM order_lines
            WHERE order_id = ANY($1)
            ORDER BY order_id ASC, position ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut lines_by_order: HashMap<OrderId, Vec<OrderLine>> = HashMap::new();
        for row in &line_rows {
            let line = Self::row_to_order_line(row)?;
            lines_by_order.entry(line.order_id).or_default().push(line);
        }
        for order in &mut orders {
            order.lines = lines_by_order.remove(&order.id).unwrap_or_default();
        }

        Ok(orders)
    }
}
