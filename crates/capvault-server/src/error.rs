use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use capvault_core::error::AppError;

use crate::dto::ErrorResponse;

/// Error returned by route handlers, rendered as `{error, message}` JSON.
#[derive(Debug)]
pub enum ApiError {
    App(AppError),
    /// The request body was missing or malformed.
    BadRequest(String),
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self::App(err)
    }
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::App(err) => match err {
                AppError::StorageUnavailable(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "storage_unavailable")
                }
                AppError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "timeout"),
                AppError::DatabaseError(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "database_error")
                }
                AppError::ConfigError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.parts();
        let message = match self {
            ApiError::BadRequest(message) => message,
            ApiError::App(err) => {
                tracing::error!(error = %err, storage = err.is_storage(), "Request failed");
                err.to_string()
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
        };

        (status, axum::Json(body)).into_response()
    }
}
