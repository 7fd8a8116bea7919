//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use domain::{CatalogError, OrderError};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client, business rejections included.
    BadRequest(String),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        match &err {
            OrderError::RecordNotFound(_) => ApiError::NotFound(err.to_string()),
            OrderError::InsufficientStock { .. } | OrderError::InvalidQuantity(_) => {
                ApiError::BadRequest(err.to_string())
            }
            OrderError::TransactionFailed(_) | OrderError::Store(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match &err {
            CatalogError::NotFound(_) => ApiError::NotFound(err.to_string()),
            CatalogError::Invalid(_) => ApiError::BadRequest(err.to_string()),
            CatalogError::Metadata(_) | CatalogError::Store(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}
