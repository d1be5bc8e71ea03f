use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),

    #[error("Staging failed: {0}")]
    Staging(String),

    #[error("Conversion failed: {0}")]
    Conversion(String),

    #[error("Conversion timed out after {0} seconds")]
    ConversionTimeout(u64),

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::UnsupportedFormat(msg) => (StatusCode::UNSUPPORTED_MEDIA_TYPE, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            AppError::Staging(msg) => {
                tracing::error!("Staging error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to stage upload: {}", msg),
                )
            }
            AppError::Conversion(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::ConversionTimeout(secs) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Conversion timed out after {} seconds", secs),
            ),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::Anyhow(e) => {
                tracing::error!("Anyhow error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
