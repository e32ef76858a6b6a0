//! Aggregated reads across the record services.

use axum::Json;
use axum::extract::{Path, State};
use common::{CatalogItemId, UserId};
use orchestration::{FanOutAggregator, UserAndItem};

use crate::error::{ApiError, parse_id};

/// GET /purchases/user/{user_id}/item/{item_id}: a user and a catalog item,
/// fetched concurrently. Fails with every sub-request failure itemized.
#[tracing::instrument(skip(aggregator))]
pub async fn user_and_item(
    State(aggregator): State<FanOutAggregator>,
    Path((user_id, item_id)): Path<(String, String)>,
) -> Result<Json<UserAndItem>, ApiError> {
    let user_id: UserId = parse_id(&user_id, "user")?;
    let item_id: CatalogItemId = parse_id(&item_id, "catalog item")?;
    Ok(Json(aggregator.user_and_item(user_id, item_id).await?))
}
