//! Maps `freyja_core::Error` onto HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Wraps a core error so it can be returned directly from a handler.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub freyja_core::Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            freyja_core::Error::KeyNotFound => StatusCode::NOT_FOUND,
            freyja_core::Error::InvalidKey | freyja_core::Error::RecordTooLarge { .. } => {
                StatusCode::BAD_REQUEST
            }
            freyja_core::Error::NotOpen
            | freyja_core::Error::Io { .. }
            | freyja_core::Error::Corruption(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}
