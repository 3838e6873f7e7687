use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use clubhub_core::{Identity, ServiceError};

use crate::api::{reject, AppState};
use crate::model::FollowState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/clubs/{id}/follow",
            get(follow_state).put(follow).delete(unfollow),
        )
        .route("/me/follows", get(followed_clubs))
}

async fn follow_state(
    State(svc): State<AppState>,
    who: Identity,
    Path(id): Path<String>,
) -> Result<Json<FollowState>, ServiceError> {
    let state = svc
        .follow_state(&who, &id)
        .map_err(|e| reject("follow state", e))?;
    Ok(Json(state))
}

async fn follow(
    State(svc): State<AppState>,
    who: Identity,
    Path(id): Path<String>,
) -> Result<Json<FollowState>, ServiceError> {
    let state = svc.follow(&who, &id).map_err(|e| reject("follow", e))?;
    Ok(Json(state))
}

async fn unfollow(
    State(svc): State<AppState>,
    who: Identity,
    Path(id): Path<String>,
) -> Result<Json<FollowState>, ServiceError> {
    let state = svc.unfollow(&who, &id).map_err(|e| reject("unfollow", e))?;
    Ok(Json(state))
}

async fn followed_clubs(
    State(svc): State<AppState>,
    who: Identity,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let clubs = svc
        .followed_clubs(&who)
        .map_err(|e| reject("list followed clubs", e))?;
    Ok(Json(serde_json::json!({ "items": clubs })))
}
