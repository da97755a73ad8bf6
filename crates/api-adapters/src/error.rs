//! `DomainError` → HTTP response mapping.
//!
//! Every domain failure becomes a structured JSON body with a stable
//! machine-readable `error` code; only storage failures surface as 500 and
//! those never leak backend details to the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use domains::DomainError;

pub struct ApiError(DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self.0 {
            DomainError::Validation(violations) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "validation-failed", "violations": violations }),
            ),
            DomainError::Forbidden(reason) => (
                StatusCode::FORBIDDEN,
                json!({ "error": "forbidden", "reason": reason }),
            ),
            DomainError::NotFound(id) => (
                StatusCode::NOT_FOUND,
                json!({ "error": "not-found", "id": id }),
            ),
            DomainError::InvalidTransition { from, action } => (
                StatusCode::CONFLICT,
                json!({ "error": "invalid-transition", "from": from, "action": action }),
            ),
            DomainError::Storage(message) => {
                tracing::error!(%message, "storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "internal" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
