//! Caller identity.
//!
//! Every operation that acts on behalf of a user receives an explicit
//! [`Identity`]. Handlers obtain it through the axum extractor below, which
//! reads the `X-User-Id` header set by the fronting auth proxy.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::ServiceError;

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The user on whose behalf a request runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ServiceError::Unauthorized("missing X-User-Id header".into()))?;
        let user_id = value
            .to_str()
            .map_err(|_| ServiceError::Unauthorized("malformed X-User-Id header".into()))?
            .trim();
        if user_id.is_empty() {
            return Err(ServiceError::Unauthorized("empty X-User-Id header".into()));
        }
        Ok(Identity::new(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(req: Request<()>) -> Result<Identity, ServiceError> {
        let (mut parts, _) = req.into_parts();
        Identity::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn reads_header() {
        let req = Request::builder()
            .header("X-User-Id", "u1")
            .body(())
            .unwrap();
        assert_eq!(extract(req).await.unwrap(), Identity::new("u1"));
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let req = Request::builder().body(()).unwrap();
        let err = extract(req).await.unwrap_err();
        assert_eq!(err.error_code(), "UNAUTHENTICATED");
    }

    #[tokio::test]
    async fn blank_header_is_unauthorized() {
        let req = Request::builder()
            .header("X-User-Id", "   ")
            .body(())
            .unwrap();
        assert!(matches!(extract(req).await, Err(ServiceError::Unauthorized(_))));
    }
}
