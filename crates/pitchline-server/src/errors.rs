//! HTTP error mapping.
//!
//! Credential failures deliberately collapse into one generic 401 body so a
//! caller cannot tell a malformed token from an expired one or from a wrong
//! password. Internal details are logged, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pitchline_auth::AuthError;
use pitchline_store::StoreError;
use serde_json::json;
use tracing::error;

/// Errors surfaced by REST handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Credential missing or failed verification. Always rendered as the
    /// same generic body.
    #[error("authentication failed")]
    Unauthenticated,

    /// The caller is authenticated but not allowed to do this.
    #[error("forbidden")]
    Forbidden,

    /// The requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A uniqueness invariant was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The request payload was malformed.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Unexpected internal failure; detail is logged, not returned.
    #[error("internal error")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "AUTHENTICATION_FAILED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn message(&self) -> String {
        match self {
            // Generic on purpose: no hint about which check failed
            Self::Unauthenticated => "authentication failed".into(),
            Self::Forbidden => "forbidden".into(),
            Self::Internal(_) => "internal error".into(),
            Self::NotFound(m) | Self::Conflict(m) | Self::BadRequest(m) => m.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(detail) = &self {
            error!(detail, "internal error in request handler");
        }
        let body = json!({
            "error": { "code": self.code(), "message": self.message() }
        });
        (self.status(), Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken => Self::Unauthenticated,
            AuthError::Signing { reason } => Self::Internal(reason),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(m) => Self::NotFound(m),
            StoreError::Conflict(m) => Self::Conflict(m),
            other => Self::Internal(other.to_string()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthenticated_is_401_generic() {
        let err = ApiError::Unauthenticated;
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.message(), "authentication failed");
    }

    #[test]
    fn auth_error_collapses_to_unauthenticated() {
        let err = ApiError::from(AuthError::InvalidToken);
        assert!(matches!(err, ApiError::Unauthenticated));
    }

    #[test]
    fn store_not_found_maps_to_404() {
        let err = ApiError::from(StoreError::NotFound("organization 9".into()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn store_conflict_maps_to_409() {
        let err = ApiError::from(StoreError::Conflict("already subscribed".into()));
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn other_store_errors_map_to_500_without_detail() {
        let err = ApiError::from(StoreError::Internal("pool exhausted".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "internal error");
    }
}
