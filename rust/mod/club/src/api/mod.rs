mod users;
mod clubs;
mod follows;
mod events;
mod notifications;
mod admin;

use std::sync::Arc;

use axum::Router;
use tracing::{error, warn};

use clubhub_core::ServiceError;

use crate::service::{ClubError, ClubService};

/// Shared application state.
pub type AppState = Arc<ClubService>;

/// Build the complete club API router.
///
/// All routes are relative; the caller nests them under `/club`.
pub fn build_router(svc: Arc<ClubService>) -> Router {
    Router::new()
        .merge(users::routes())
        .merge(clubs::routes())
        .merge(follows::routes())
        .merge(events::routes())
        .merge(notifications::routes())
        .merge(admin::routes())
        .with_state(svc)
}

/// Log a failed operation and map it onto the HTTP error model.
pub(crate) fn reject(op: &str, e: ClubError) -> ServiceError {
    match &e {
        ClubError::Storage(_) | ClubError::Internal(_) => error!("{op} failed: {e}"),
        _ => warn!("{op} failed: {e}"),
    }
    ServiceError::from(e)
}
