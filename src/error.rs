// src/error.rs
use crate::{documents::DocumentStoreError, models::achievement::AchievementStatus};
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    SqlxMigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Document store error: {0}")]
    DocumentStoreError(#[from] DocumentStoreError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    // --- Achievement lifecycle ---
    #[error("{0} profile not found")]
    ProfileNotFound(&'static str),

    #[error("Achievement not found")]
    ReferenceNotFound,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Cannot {action} achievement with status '{current}'")]
    InvalidStateTransition {
        action: &'static str,
        current: AchievementStatus,
    },

    #[error("Failed to save achievement document: {0}")]
    DocumentWriteFailed(String),

    #[error("Failed to save achievement reference: {0}")]
    ReferenceWriteFailed(String),

    // --- Auth & session ---
    #[error("Error while processing password")]
    PasswordHashingError,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Account is inactive")]
    AccountInactive,

    #[error("Session error: {0}")]
    SessionError(String),

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Forbidden")]
    Forbidden,

    // --- Request level ---
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Unexpected internal error")]
    InternalServerError,
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ProfileNotFound(_) | AppError::Unauthorized(_) | AppError::Forbidden => {
                StatusCode::FORBIDDEN
            }
            AppError::ReferenceNotFound | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidStateTransition { .. } | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::AccountInactive | AppError::Unauthenticated => {
                StatusCode::UNAUTHORIZED
            }
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the client. Infrastructure causes stay in the logs.
    fn public_message(&self) -> String {
        match self {
            AppError::SqlxError(_) | AppError::SqlxMigrateError(_) => {
                "Error while accessing data.".to_string()
            }
            AppError::DocumentStoreError(_) => "Error while accessing achievement data.".to_string(),
            AppError::ConfigError(_) => "Configuration error.".to_string(),
            AppError::PasswordHashingError => "Error while processing credentials.".to_string(),
            AppError::SessionError(_) => "Error while managing your session.".to_string(),
            AppError::InternalServerError => "An unexpected error occurred.".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {:?}", self);
        } else {
            tracing::debug!("Request rejected ({}): {}", status.as_u16(), self);
        }

        let message = self.public_message();
        (
            status,
            Json(json!({
                "status": "error",
                "message": message,
                "error": message,
            })),
        )
            .into_response()
    }
}

pub type AppResult<T = ()> = Result<T, AppError>;
