use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::storage::StorageError;

/// Errors surfaced to HTTP callers as a status code plus a plain-text message.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed input
    #[error("{0}")]
    Validation(String),
    /// A unique key is already taken
    #[error("{0}")]
    Conflict(String),
    /// Login with an unknown email or a wrong password
    #[error("{0}")]
    InvalidCredentials(String),
    /// The operation needs a session and the caller has none
    #[error("{0}")]
    NotLoggedIn(String),
    /// Authenticated, but the entity belongs to someone else
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials(_) => StatusCode::FORBIDDEN,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_)
            | AppError::Conflict(_)
            | AppError::NotLoggedIn(_)
            | AppError::Forbidden(_)
            | AppError::NotFound(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn not_logged_in() -> Self {
        AppError::NotLoggedIn("You must be logged in to do that.".to_string())
    }

    pub fn link_not_found(id: &str) -> Self {
        AppError::NotFound(format!("Short URL '{id}' does not exist."))
    }

    pub fn link_forbidden(id: &str) -> Self {
        AppError::Forbidden(format!("Short URL '{id}' does not belong to you."))
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::DuplicateEmail => AppError::Conflict(
                "Email already exists. Please try a different email.".to_string(),
            ),
            StorageError::DuplicateId => AppError::Conflict("Identifier already exists.".to_string()),
            StorageError::NotOwner => {
                AppError::Forbidden("That does not belong to you.".to_string())
            }
            StorageError::Other(e) => AppError::Internal(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            AppError::Internal(err) => {
                tracing::error!(error = %err, "request failed");
                (status, "Internal server error").into_response()
            }
            other => (status, other.to_string()).into_response(),
        }
    }
}
