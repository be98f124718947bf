use crate::models::book::FieldError;
use crate::models::storage::StorageError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Errors a handler can surface to the client. Storage failures become an
/// opaque 500; everything else carries a structured JSON body.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    #[error("malformed request body: {0}")]
    BadRequest(String),
    #[error("book not found")]
    NotFound,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "validation_error",
                    "fields": fields,
                })),
            )
                .into_response(),
            ApiError::BadRequest(detail) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "validation_error",
                    "detail": detail,
                })),
            )
                .into_response(),
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "not_found",
                    "detail": "book not found",
                })),
            )
                .into_response(),
            ApiError::Storage(e) => {
                error!("Storage error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "internal_error",
                        "detail": "storage failure",
                    })),
                )
                    .into_response()
            }
        }
    }
}
