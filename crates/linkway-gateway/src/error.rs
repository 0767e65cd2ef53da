use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use linkway_core::ShortenerError;
use linkway_redirector::RedirectorError;
use thiserror::Error;
use tracing::{debug, error};

use crate::model::ErrorResponse;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// The request could not be read: wrong content type or malformed body.
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Shortener(#[from] ShortenerError),
    #[error(transparent)]
    Redirector(#[from] RedirectorError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Each kind gets its own status and tag so clients can tell them apart.
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Shortener(ShortenerError::InvalidUrl(_)) => {
                (StatusCode::BAD_REQUEST, "invalid_url")
            }
            AppError::Shortener(ShortenerError::GenerationExhausted { .. }) => {
                (StatusCode::SERVICE_UNAVAILABLE, "generation_exhausted")
            }
            AppError::Shortener(ShortenerError::Storage(_))
            | AppError::Redirector(RedirectorError::Storage(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "storage")
            }
            AppError::Redirector(RedirectorError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "not_found")
            }
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();

        if status.is_server_error() {
            error!(error = %self, kind, "request failed");
        } else {
            debug!(error = %self, kind, "request rejected");
        }

        let body = ErrorResponse {
            error: kind.to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
