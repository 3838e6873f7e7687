use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Machine-readable codes carried in every error body.
///
/// Clients branch on `code`; `message` is for humans and may be reworded.
pub mod error_code {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const ALREADY_EXISTS: &str = "ALREADY_EXISTS";
    pub const ABORTED: &str = "ABORTED";
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
    pub const UNAUTHENTICATED: &str = "UNAUTHENTICATED";
    pub const PERMISSION_DENIED: &str = "PERMISSION_DENIED";
    pub const INTERNAL: &str = "INTERNAL";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
}

/// Error returned by every HTTP handler.
///
/// Rendered as
///
/// ```json
/// {"code": "ABORTED", "message": "write conflict on club c1", "retryable": true}
/// ```
///
/// `retryable` is omitted unless the request can be sent again unchanged.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// 404.
    #[error("{0}")]
    NotFound(String),

    /// Duplicate resource. 409.
    #[error("{0}")]
    Conflict(String),

    /// Lost a race with a concurrent transaction; nothing was written. 409.
    #[error("{0}")]
    Aborted(String),

    /// 400.
    #[error("{0}")]
    Validation(String),

    /// No caller identity on the request. 401.
    #[error("{0}")]
    Unauthorized(String),

    /// Caller is known but may not do this. 403.
    #[error("{0}")]
    PermissionDenied(String),

    /// 500.
    #[error("{0}")]
    Storage(String),

    /// 500.
    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    retryable: bool,
}

impl ServiceError {
    fn parts(&self) -> (StatusCode, &'static str) {
        use error_code::*;
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, NOT_FOUND),
            Self::Conflict(_) => (StatusCode::CONFLICT, ALREADY_EXISTS),
            Self::Aborted(_) => (StatusCode::CONFLICT, ABORTED),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, VALIDATION_FAILED),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, UNAUTHENTICATED),
            Self::PermissionDenied(_) => (StatusCode::FORBIDDEN, PERMISSION_DENIED),
            Self::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, STORAGE_ERROR),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL),
        }
    }

    pub fn error_code(&self) -> &'static str {
        self.parts().1
    }

    pub fn status_code(&self) -> StatusCode {
        self.parts().0
    }

    /// Whether the same request may succeed if simply sent again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Aborted(_))
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, code) = self.parts();
        let body = ErrorBody {
            code,
            retryable: self.is_retryable(),
            message: self.to_string(),
        };
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(err: ServiceError) -> (StatusCode, serde_json::Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 64 * 1024)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_status_and_code_table() {
        let cases = [
            (ServiceError::NotFound("x".into()), 404, "NOT_FOUND"),
            (ServiceError::Conflict("x".into()), 409, "ALREADY_EXISTS"),
            (ServiceError::Aborted("x".into()), 409, "ABORTED"),
            (ServiceError::Validation("x".into()), 400, "VALIDATION_FAILED"),
            (ServiceError::Unauthorized("x".into()), 401, "UNAUTHENTICATED"),
            (ServiceError::PermissionDenied("x".into()), 403, "PERMISSION_DENIED"),
            (ServiceError::Storage("x".into()), 500, "STORAGE_ERROR"),
            (ServiceError::Internal("x".into()), 500, "INTERNAL"),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.status_code().as_u16(), status, "{err:?}");
            assert_eq!(err.error_code(), code, "{err:?}");
        }
    }

    #[tokio::test]
    async fn test_aborted_body_is_retryable() {
        let (status, body) = body_of(ServiceError::Aborted("write conflict".into())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "ABORTED");
        assert_eq!(body["message"], "write conflict");
        assert_eq!(body["retryable"], true);
    }

    #[tokio::test]
    async fn test_not_found_body_omits_retryable() {
        let (status, body) = body_of(ServiceError::NotFound("club c1".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
        assert_eq!(body["message"], "club c1");
        assert!(body.get("retryable").is_none());
    }
}
