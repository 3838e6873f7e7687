use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use clubhub_core::{Identity, ServiceError};

use crate::api::{reject, AppState};
use crate::model::{CreateEvent, DecideRegistration, Event, Registration};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/clubs/{id}/events", get(list_events).post(create_event))
        .route("/events/{id}", get(get_event))
        .route(
            "/events/{id}/registrations",
            get(list_registrations)
                .post(register)
                .delete(cancel_registration),
        )
        .route(
            "/events/{id}/registrations/{user_id}/@decide",
            post(decide_registration),
        )
}

async fn list_events(
    State(svc): State<AppState>,
    Path(club_id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let events = svc
        .list_events(&club_id)
        .map_err(|e| reject("list events", e))?;
    Ok(Json(serde_json::json!({ "items": events })))
}

async fn create_event(
    State(svc): State<AppState>,
    who: Identity,
    Path(club_id): Path<String>,
    Json(input): Json<CreateEvent>,
) -> Result<(StatusCode, Json<Event>), ServiceError> {
    let event = svc
        .create_event(&who, &club_id, input)
        .map_err(|e| reject("create event", e))?;
    Ok((StatusCode::CREATED, Json(event)))
}

async fn get_event(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Event>, ServiceError> {
    let event = svc.get_event(&id).map_err(|e| reject("get event", e))?;
    Ok(Json(event))
}

async fn list_registrations(
    State(svc): State<AppState>,
    who: Identity,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let registrations = svc
        .list_registrations(&who, &id)
        .map_err(|e| reject("list registrations", e))?;
    Ok(Json(serde_json::json!({ "items": registrations })))
}

async fn register(
    State(svc): State<AppState>,
    who: Identity,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<Registration>), ServiceError> {
    let registration = svc.register(&who, &id).map_err(|e| reject("register", e))?;
    Ok((StatusCode::CREATED, Json(registration)))
}

async fn cancel_registration(
    State(svc): State<AppState>,
    who: Identity,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    svc.cancel_registration(&who, &id)
        .map_err(|e| reject("cancel registration", e))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn decide_registration(
    State(svc): State<AppState>,
    who: Identity,
    Path((id, user_id)): Path<(String, String)>,
    Json(input): Json<DecideRegistration>,
) -> Result<Json<Registration>, ServiceError> {
    let registration = svc
        .decide_registration(&who, &id, &user_id, input.status)
        .map_err(|e| reject("decide registration", e))?;
    Ok(Json(registration))
}
