use reqwest::StatusCode;
use thiserror::Error;

use shared_models::error::AppError;

/// Failures talking to the remote hospital service, classified by who is at fault.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Authentication error: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The remote service understood the request and refused it (4xx).
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Remote service error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response payload: {0}")]
    Decode(String),

    #[error("Invalid request header: {0}")]
    InvalidHeader(String),
}

impl RemoteError {
    pub fn from_status(status: StatusCode, message: String) -> Self {
        match status.as_u16() {
            401 => RemoteError::Unauthorized(message),
            403 => RemoteError::Forbidden(message),
            404 => RemoteError::NotFound(message),
            code @ 400..=499 => RemoteError::Rejected { status: code, message },
            code => RemoteError::Server { status: code, message },
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, RemoteError::Rejected { .. })
    }

    /// Transport failures are safe for the user to resubmit; nothing reached the store.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RemoteError::Transport(_) | RemoteError::Server { .. })
    }
}

impl From<RemoteError> for AppError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Unauthorized(message) => AppError::Auth(message),
            RemoteError::Forbidden(message) => AppError::Forbidden(message),
            RemoteError::NotFound(message) => AppError::NotFound(message),
            RemoteError::Rejected { message, .. } => AppError::Rejected { message, current: None },
            RemoteError::Transport(e) => AppError::Unavailable(format!(
                "Hospital service unreachable, please try again: {}",
                e
            )),
            RemoteError::Server { status, message } => {
                AppError::ExternalService(format!("Hospital service error ({}): {}", status, message))
            }
            RemoteError::Decode(message) => AppError::ExternalService(message),
            RemoteError::InvalidHeader(message) => AppError::Auth(message),
        }
    }
}
