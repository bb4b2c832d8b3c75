use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The remote service refused the change. `current` carries the authoritative
    /// record re-read after the refusal, when it could be fetched.
    #[error("Rejected: {message}")]
    Rejected { message: String, current: Option<Value> },

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::Rejected { .. } => StatusCode::CONFLICT,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::ExternalService(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match self {
            AppError::Rejected { message, current } => {
                tracing::warn!("Rejected: {}: {}", status, message);
                json!({
                    "error": message,
                    "current": current,
                })
            }
            AppError::Auth(message)
            | AppError::Forbidden(message)
            | AppError::NotFound(message)
            | AppError::BadRequest(message)
            | AppError::ValidationError(message)
            | AppError::Unavailable(message)
            | AppError::ExternalService(message)
            | AppError::Internal(message) => {
                tracing::error!("Error: {}: {}", status, message);
                json!({ "error": message })
            }
        };

        (status, Json(body)).into_response()
    }
}
