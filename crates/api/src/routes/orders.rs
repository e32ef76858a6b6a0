//! Order endpoints, served against any [`OrderAuthority`].

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{Order, OrderId};
use orchestration::{CreateOrderRequest, OrderAuthority};

use crate::error::{ApiError, parse_id};

pub type OrderState = Arc<dyn OrderAuthority>;

/// POST /orders: place an order; prices are captured at this moment.
#[tracing::instrument(skip_all)]
pub async fn create(
    State(orders): State<OrderState>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let Json(request) = payload?;
    let order = orders.create_order(request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /orders/{id}: fetch one order with its lines.
#[tracing::instrument(skip(orders))]
pub async fn get(
    State(orders): State<OrderState>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let id: OrderId = parse_id(&id, "order")?;
    Ok(Json(orders.get_order(id).await?))
}

/// GET /orders: list every order with its lines.
pub async fn list(State(orders): State<OrderState>) -> Result<Json<Vec<Order>>, ApiError> {
    Ok(Json(orders.list_orders().await?))
}
