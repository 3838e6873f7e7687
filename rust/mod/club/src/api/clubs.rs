use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use clubhub_core::{Identity, ListResult, ServiceError};

use crate::api::{reject, AppState};
use crate::model::{Club, ClubListQuery, CreateClub, NotifyFollowers, NotifyReport};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/clubs", get(list_clubs).post(create_club))
        .route(
            "/clubs/{id}",
            get(get_club).patch(update_club).delete(delete_club),
        )
        .route("/clubs/{id}/@notify", post(notify_followers))
}

async fn list_clubs(
    State(svc): State<AppState>,
    Query(query): Query<ClubListQuery>,
) -> Result<Json<ListResult<Club>>, ServiceError> {
    let clubs = svc.list_clubs(&query).map_err(|e| reject("list clubs", e))?;
    Ok(Json(clubs))
}

async fn create_club(
    State(svc): State<AppState>,
    who: Identity,
    Json(input): Json<CreateClub>,
) -> Result<(StatusCode, Json<Club>), ServiceError> {
    let club = svc
        .create_club(&who, input)
        .map_err(|e| reject("create club", e))?;
    Ok((StatusCode::CREATED, Json(club)))
}

async fn get_club(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Club>, ServiceError> {
    let club = svc.get_club(&id).map_err(|e| reject("get club", e))?;
    Ok(Json(club))
}

async fn update_club(
    State(svc): State<AppState>,
    who: Identity,
    Path(id): Path<String>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<Club>, ServiceError> {
    let club = svc
        .update_club(&who, &id, patch)
        .map_err(|e| reject("update club", e))?;
    Ok(Json(club))
}

async fn delete_club(
    State(svc): State<AppState>,
    who: Identity,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    svc.delete_club(&who, &id)
        .map_err(|e| reject("delete club", e))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn notify_followers(
    State(svc): State<AppState>,
    who: Identity,
    Path(id): Path<String>,
    Json(input): Json<NotifyFollowers>,
) -> Result<Json<NotifyReport>, ServiceError> {
    let report = svc
        .notify_followers(&who, &id, input)
        .map_err(|e| reject("notify followers", e))?;
    Ok(Json(report))
}
