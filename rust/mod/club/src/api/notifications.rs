use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use clubhub_core::{Identity, ServiceError};

use crate::api::{reject, AppState};
use crate::model::Notification;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/me/notifications", get(list_notifications))
        .route("/me/notifications/{id}/@read", post(mark_read))
}

async fn list_notifications(
    State(svc): State<AppState>,
    who: Identity,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let inbox = svc
        .list_notifications(&who)
        .map_err(|e| reject("list notifications", e))?;
    Ok(Json(serde_json::json!({ "items": inbox })))
}

async fn mark_read(
    State(svc): State<AppState>,
    who: Identity,
    Path(id): Path<String>,
) -> Result<Json<Notification>, ServiceError> {
    let notification = svc
        .mark_notification_read(&who, &id)
        .map_err(|e| reject("mark notification read", e))?;
    Ok(Json(notification))
}
