use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use tracing::info;

use clubhub_core::{Identity, ServiceError};

use crate::api::{reject, AppState};
use crate::model::ReconcileReport;

pub fn routes() -> Router<AppState> {
    Router::new().route("/admin/@reconcile", post(reconcile))
}

/// Run a follower-count reconciliation pass now instead of waiting for the worker.
async fn reconcile(
    State(svc): State<AppState>,
    who: Identity,
) -> Result<Json<ReconcileReport>, ServiceError> {
    info!("reconcile requested by {}", who.user_id);
    let report = svc
        .reconcile_followers()
        .map_err(|e| reject("reconcile", e))?;
    Ok(Json(report))
}
