pub mod user;
pub mod club;
pub mod follow;
pub mod reconcile;
pub mod event;
pub mod notification;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use clubhub_core::{Identity, ListParams};
use clubhub_kv::{KVError, KVRead, KVStore, KVTxn};

use crate::model::{Club, User};

/// Club service error type.
#[derive(Debug, Error)]
pub enum ClubError {
    #[error("not found: {0}")]
    NotFound(String),

    /// A concurrent transaction won; nothing was written. Safe to retry.
    #[error("aborted: {0}")]
    Aborted(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation: {0}")]
    Validation(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("storage: {0}")]
    Storage(String),

    #[error("internal: {0}")]
    Internal(String),
}

impl From<KVError> for ClubError {
    fn from(e: KVError) -> Self {
        match e {
            KVError::Conflict(m) => ClubError::Aborted(m),
            KVError::Storage(m) => ClubError::Storage(m),
            KVError::Serialization(m) => ClubError::Internal(m),
        }
    }
}

impl From<ClubError> for clubhub_core::ServiceError {
    fn from(e: ClubError) -> Self {
        use clubhub_core::ServiceError;
        match e {
            ClubError::NotFound(m) => ServiceError::NotFound(m),
            ClubError::Aborted(m) => ServiceError::Aborted(m),
            ClubError::Conflict(m) => ServiceError::Conflict(m),
            ClubError::Validation(m) => ServiceError::Validation(m),
            ClubError::Unauthorized(m) => ServiceError::Unauthorized(m),
            ClubError::Forbidden(m) => ServiceError::PermissionDenied(m),
            ClubError::Storage(m) => ServiceError::Storage(m),
            ClubError::Internal(m) => ServiceError::Internal(m),
        }
    }
}

/// Configuration for the club service.
#[derive(Debug, Clone)]
pub struct ClubConfig {
    /// Page size when a list request gives no `limit`.
    pub default_page_size: usize,
    /// Upper bound on any requested `limit`.
    pub max_page_size: usize,
}

impl Default for ClubConfig {
    fn default() -> Self {
        Self {
            default_page_size: 50,
            max_page_size: 200,
        }
    }
}

/// KV key layout.
pub(crate) mod keys {
    pub const USER_PREFIX: &str = "club:user:";
    pub const CLUB_PREFIX: &str = "club:club:";
    pub const EVENT_PREFIX: &str = "club:event:";

    pub fn user(id: &str) -> String {
        format!("{USER_PREFIX}{id}")
    }

    pub fn club(id: &str) -> String {
        format!("{CLUB_PREFIX}{id}")
    }

    pub fn event(id: &str) -> String {
        format!("{EVENT_PREFIX}{id}")
    }

    pub fn registrations_of(event_id: &str) -> String {
        format!("club:registration:{event_id}:")
    }

    pub fn registration(event_id: &str, user_id: &str) -> String {
        format!("club:registration:{event_id}:{user_id}")
    }

    pub fn notifications_of(user_id: &str) -> String {
        format!("club:notification:{user_id}:")
    }

    pub fn notification(user_id: &str, id: &str) -> String {
        format!("club:notification:{user_id}:{id}")
    }
}

/// The club service. Every document lives in the KV store as JSON.
pub struct ClubService {
    pub(crate) kv: Arc<dyn KVStore>,
    pub(crate) config: ClubConfig,
}

impl ClubService {
    pub fn new(kv: Arc<dyn KVStore>, config: ClubConfig) -> Arc<Self> {
        Arc::new(Self { kv, config })
    }

    /// Turn optional paging fields into bounded [`ListParams`].
    pub(crate) fn page(
        &self,
        limit: Option<usize>,
        offset: Option<usize>,
        sort: Option<String>,
        q: Option<String>,
    ) -> ListParams {
        ListParams {
            limit: limit.unwrap_or(self.config.default_page_size),
            offset: offset.unwrap_or(0),
            sort,
            q,
        }
        .clamped(self.config.max_page_size)
    }

    // ── Document helpers ──

    pub(crate) fn get_doc<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ClubError> {
        match self.kv.get(key)? {
            Some(raw) => decode(&raw).map(Some),
            None => Ok(None),
        }
    }

    pub(crate) fn scan_docs<T: DeserializeOwned>(&self, prefix: &str) -> Result<Vec<T>, ClubError> {
        self.kv
            .scan(prefix)?
            .iter()
            .map(|(_, raw)| decode(raw))
            .collect()
    }

    pub(crate) fn require_user(&self, id: &str) -> Result<User, ClubError> {
        self.get_doc(&keys::user(id))?
            .ok_or_else(|| ClubError::NotFound(format!("user {id}")))
    }

    pub(crate) fn require_club(&self, id: &str) -> Result<Club, ClubError> {
        self.get_doc(&keys::club(id))?
            .ok_or_else(|| ClubError::NotFound(format!("club {id}")))
    }
}

// ── Transaction-scoped helpers ──

pub(crate) fn decode<T: DeserializeOwned>(raw: &[u8]) -> Result<T, ClubError> {
    serde_json::from_slice(raw).map_err(|e| ClubError::Internal(e.to_string()))
}

pub(crate) fn encode<T: Serialize>(doc: &T) -> Result<Vec<u8>, ClubError> {
    serde_json::to_vec(doc).map_err(|e| ClubError::Internal(e.to_string()))
}

pub(crate) fn txn_get<T: DeserializeOwned, R: KVRead + ?Sized>(
    txn: &R,
    key: &str,
) -> Result<Option<T>, ClubError> {
    match txn.get(key)? {
        Some(raw) => decode(&raw).map(Some),
        None => Ok(None),
    }
}

pub(crate) fn txn_put<T: Serialize>(
    txn: &mut dyn KVTxn,
    key: &str,
    doc: &T,
) -> Result<(), ClubError> {
    txn.set(key, &encode(doc)?)?;
    Ok(())
}

pub(crate) fn txn_scan<T: DeserializeOwned, R: KVRead + ?Sized>(
    txn: &R,
    prefix: &str,
) -> Result<Vec<T>, ClubError> {
    txn.scan(prefix)?
        .iter()
        .map(|(_, raw)| decode(raw))
        .collect()
}

pub(crate) fn txn_require_club<R: KVRead + ?Sized>(
    txn: &R,
    id: &str,
) -> Result<Club, ClubError> {
    txn_get(txn, &keys::club(id))?.ok_or_else(|| ClubError::NotFound(format!("club {id}")))
}

pub(crate) fn txn_require_user<R: KVRead + ?Sized>(
    txn: &R,
    id: &str,
) -> Result<User, ClubError> {
    txn_get(txn, &keys::user(id))?.ok_or_else(|| ClubError::NotFound(format!("user {id}")))
}

/// Fail unless `who` heads `club`.
pub(crate) fn ensure_head(who: &Identity, club: &Club) -> Result<(), ClubError> {
    if club.head_id != who.user_id {
        return Err(ClubError::Forbidden(format!(
            "user {} is not the head of club {}",
            who.user_id, club.id
        )));
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use clubhub_core::ServiceError;

    use super::*;

    #[test]
    fn test_kv_errors_map_to_club_errors() {
        let err = ClubError::from(KVError::Conflict("club c1".into()));
        assert!(matches!(err, ClubError::Aborted(ref m) if m == "club c1"));

        let err = ClubError::from(KVError::Storage("disk full".into()));
        assert!(matches!(err, ClubError::Storage(_)));

        let err = ClubError::from(KVError::Serialization("bad json".into()));
        assert!(matches!(err, ClubError::Internal(_)));
    }

    #[test]
    fn test_write_conflict_surfaces_as_retryable_409() {
        let err = ServiceError::from(ClubError::from(KVError::Conflict("club c1".into())));
        assert!(matches!(err, ServiceError::Aborted(_)));
        assert_eq!(err.status_code().as_u16(), 409);
        assert_eq!(err.error_code(), "ABORTED");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_club_errors_map_to_service_errors() {
        let cases = [
            (ClubError::NotFound("x".into()), 404, "NOT_FOUND"),
            (ClubError::Conflict("x".into()), 409, "ALREADY_EXISTS"),
            (ClubError::Validation("x".into()), 400, "VALIDATION_FAILED"),
            (ClubError::Unauthorized("x".into()), 401, "UNAUTHENTICATED"),
            (ClubError::Forbidden("x".into()), 403, "PERMISSION_DENIED"),
            (ClubError::Storage("x".into()), 500, "STORAGE_ERROR"),
            (ClubError::Internal("x".into()), 500, "INTERNAL"),
        ];
        for (err, status, code) in cases {
            let err = ServiceError::from(err);
            assert_eq!(err.status_code().as_u16(), status, "{err:?}");
            assert_eq!(err.error_code(), code, "{err:?}");
            assert!(!err.is_retryable(), "{err:?}");
        }
    }
}
