//! # API Error Mapping
//!
//! Translates domain and database errors into HTTP responses.
//!
//! ## Status Mapping
//! ```text
//! CoreError::NotFound            → 404
//! CoreError::PermissionDenied    → 403
//! CoreError::InvalidState        → 409
//! CoreError::ValidationConflict  → 422
//! CoreError::Conflict            → 409
//! DbError::UniqueViolation       → 409
//! DbError::ForeignKeyViolation   → 409
//! DbError::PoolExhausted         → 503
//! Unauthorized (auth layer)      → 401
//! everything else                → 500, details logged not leaked
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use zargar_core::CoreError;
use zargar_db::DbError;

/// Errors a handler can return.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Db(#[from] DbError),

    /// Missing, malformed, or expired credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// Structurally invalid request before it reaches the domain.
    #[error("{0}")]
    BadRequest(String),

    /// Anything we cannot attribute to the caller.
    #[error("internal server error")]
    Internal(String),
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::Db(DbError::Domain(err))
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Db(DbError::Domain(core)) => match core {
                CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
                CoreError::PermissionDenied(_) => StatusCode::FORBIDDEN,
                CoreError::InvalidState(_) => StatusCode::CONFLICT,
                CoreError::ValidationConflict(_) => StatusCode::UNPROCESSABLE_ENTITY,
                CoreError::Conflict { .. } => StatusCode::CONFLICT,
            },
            ApiError::Db(DbError::UniqueViolation { .. }) => StatusCode::CONFLICT,
            ApiError::Db(DbError::ForeignKeyViolation { .. }) => StatusCode::CONFLICT,
            ApiError::Db(DbError::PoolExhausted) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // 5xx details go to the log, not the client.
        let message = if status.is_server_error() {
            match &self {
                ApiError::Internal(detail) => {
                    tracing::error!(detail = %detail, "Internal error");
                }
                other => {
                    tracing::error!(error = %other, "Internal error");
                }
            }
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;
