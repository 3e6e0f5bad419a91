use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced across the HTTP boundary, tagged to match the
/// `{"error": tag, "message": ...}` contract clients depend on.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("The 'format' parameter is required.")]
    MissingParameter,

    #[error("The 'format' parameter '{0}' is not supported.")]
    InvalidParameter(String),

    #[error("{0}")]
    InvalidJson(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Store schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, tag, message) = match &self {
            AppError::MissingParameter => (
                StatusCode::BAD_REQUEST,
                "Missing Parameter",
                self.to_string(),
            ),
            AppError::InvalidParameter(_) => (
                StatusCode::BAD_REQUEST,
                "Invalid Parameter",
                self.to_string(),
            ),
            AppError::InvalidJson(_) => {
                (StatusCode::BAD_REQUEST, "Invalid JSON", self.to_string())
            }
            AppError::StoreUnavailable(e) => {
                tracing::error!("Store unavailable: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Service Unavailable",
                    "The archetype store is temporarily unavailable.".to_string(),
                )
            }
            AppError::SchemaMismatch(e) => {
                tracing::error!("Store schema mismatch: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Schema Mismatch",
                    "The archetype store's schema does not match this service.".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Error",
                    "An internal error occurred.".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": tag, "message": message }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
