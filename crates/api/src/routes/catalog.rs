//! Catalog item endpoints, served against any [`CatalogAuthority`].

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{CatalogItem, CatalogItemId, NewCatalogItem};
use orchestration::CatalogAuthority;
use orchestration::clients::PriceUpdate;

use crate::error::{ApiError, parse_id};

pub type CatalogState = Arc<dyn CatalogAuthority>;

/// POST /catalog-items: add an item to the catalog.
#[tracing::instrument(skip_all)]
pub async fn create(
    State(catalog): State<CatalogState>,
    payload: Result<Json<NewCatalogItem>, JsonRejection>,
) -> Result<(StatusCode, Json<CatalogItem>), ApiError> {
    let Json(item) = payload?;
    let item = catalog.create_item(item).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// GET /catalog-items/{id}: fetch one item with its current price.
#[tracing::instrument(skip(catalog))]
pub async fn get(
    State(catalog): State<CatalogState>,
    Path(id): Path<String>,
) -> Result<Json<CatalogItem>, ApiError> {
    let id: CatalogItemId = parse_id(&id, "catalog item")?;
    Ok(Json(catalog.get_item(id).await?))
}

/// GET /catalog-items: list the catalog.
pub async fn list(State(catalog): State<CatalogState>) -> Result<Json<Vec<CatalogItem>>, ApiError> {
    Ok(Json(catalog.list_items().await?))
}

/// PUT /catalog-items/{id}/price: change an item's current price.
#[tracing::instrument(skip(catalog, payload))]
pub async fn update_price(
    State(catalog): State<CatalogState>,
    Path(id): Path<String>,
    payload: Result<Json<PriceUpdate>, JsonRejection>,
) -> Result<Json<CatalogItem>, ApiError> {
    let id: CatalogItemId = parse_id(&id, "catalog item")?;
    let Json(update) = payload?;
    Ok(Json(catalog.update_price(id, update.price_cents).await?))
}
