use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use clubhub_core::{Identity, ListResult, ServiceError};

use crate::api::{reject, AppState};
use crate::model::{CreateUser, User, UserListQuery};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/{id}", get(get_user).patch(update_user))
}

async fn list_users(
    State(svc): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<ListResult<User>>, ServiceError> {
    let users = svc.list_users(&query).map_err(|e| reject("list users", e))?;
    Ok(Json(users))
}

async fn create_user(
    State(svc): State<AppState>,
    Json(input): Json<CreateUser>,
) -> Result<(StatusCode, Json<User>), ServiceError> {
    let user = svc.create_user(input).map_err(|e| reject("create user", e))?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn get_user(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, ServiceError> {
    let user = svc.get_user(&id).map_err(|e| reject("get user", e))?;
    Ok(Json(user))
}

async fn update_user(
    State(svc): State<AppState>,
    who: Identity,
    Path(id): Path<String>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<User>, ServiceError> {
    let user = svc
        .update_user(&who, &id, patch)
        .map_err(|e| reject("update user", e))?;
    Ok(Json(user))
}
