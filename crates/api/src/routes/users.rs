//! User endpoints, served against any [`UserAuthority`].

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{NewUser, User, UserId};
use orchestration::UserAuthority;

use crate::error::{ApiError, parse_id};

pub type UserState = Arc<dyn UserAuthority>;

/// POST /users: register a user.
#[tracing::instrument(skip_all)]
pub async fn create(
    State(users): State<UserState>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let Json(new_user) = payload?;
    let user = users.create_user(new_user).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /users/{id}: fetch one user.
#[tracing::instrument(skip(users))]
pub async fn get(
    State(users): State<UserState>,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let id: UserId = parse_id(&id, "user")?;
    Ok(Json(users.get_user(id).await?))
}

/// GET /users: list every user in ascending id order.
pub async fn list(State(users): State<UserState>) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(users.list_users().await?))
}
