//! Unified Error Handling
//!
//! [`ApiError`] wraps the core structured error and performs the single
//! taxonomy-code-to-status translation. The service-supplied message passes
//! through to the client unmodified; the HTTP layer never re-derives a code
//! from message text.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;
use vigil_core::{Error, ErrorCode};

/// Handler result alias.
pub type ApiResult<T> = Result<T, ApiError>;

/// HTTP-facing wrapper around [`vigil_core::Error`].
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub Error);

/// Wire shape of an error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Taxonomy code (machine-readable)
    pub code: &'static str,
    /// Human-readable message, passed through from the failing layer
    pub message: String,
    /// Name of the operation that failed, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub op: Option<&'static str>,
}

fn status_and_code(code: ErrorCode) -> (StatusCode, &'static str) {
    match code {
        ErrorCode::Invalid => (StatusCode::BAD_REQUEST, "invalid"),
        ErrorCode::NotFound => (StatusCode::NOT_FOUND, "not found"),
        ErrorCode::Conflict => (StatusCode::CONFLICT, "conflict"),
        ErrorCode::UnprocessableEntity => {
            (StatusCode::UNPROCESSABLE_ENTITY, "unprocessable entity")
        }
        ErrorCode::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "internal error"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = status_and_code(self.0.code());

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(target: "api", error = %self.0, "internal error");
        }

        let body = Json(ErrorBody {
            code,
            message: self.0.message().to_string(),
            op: self.0.op(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_the_documented_statuses() {
        assert_eq!(status_and_code(ErrorCode::Invalid).0, StatusCode::BAD_REQUEST);
        assert_eq!(status_and_code(ErrorCode::NotFound).0, StatusCode::NOT_FOUND);
        assert_eq!(status_and_code(ErrorCode::Conflict).0, StatusCode::CONFLICT);
        assert_eq!(
            status_and_code(ErrorCode::UnprocessableEntity).0,
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_and_code(ErrorCode::Internal).0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
