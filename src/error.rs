use axum::{http::StatusCode, response::IntoResponse};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// Application error type
///
/// Missing sessions and unsupported locales are not errors; they are handled
/// by the before-action pipeline. This type covers the failures that end a
/// request with an error status.
#[derive(Error, Debug)]
pub enum AppError {
    // ===== HTTP Errors =====
    #[error("HTTP header error: {0}")]
    HttpHeader(#[from] axum::http::header::InvalidHeaderValue),

    // ===== Serialization Errors =====
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ===== Storage Errors =====
    #[error("Session store error: {0}")]
    Session(String),

    #[error("User store error: {0}")]
    UserStore(String),

    // ===== Validation Errors =====
    #[error("Validation error: {0}")]
    Validation(String),

    // ===== Internal Server Errors =====
    #[error("Unknown error: {0}")]
    Unknown(#[from] anyhow::Error),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Json(_) => StatusCode::BAD_REQUEST,
            AppError::Session(_) | AppError::UserStore(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a user-friendly error message (without sensitive details)
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) => format!("Validation error: {}", msg),
            AppError::Json(_) => "Malformed request body".to_string(),
            AppError::Session(_) => "Session storage unavailable".to_string(),
            AppError::UserStore(_) => "User storage unavailable".to_string(),
            _ => "Internal server error".to_string(),
        }
    }

    /// Get error code for programmatic error handling
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::HttpHeader(_) => "HTTP_HEADER_ERROR",
            AppError::Json(_) => "JSON_ERROR",
            AppError::Session(_) => "SESSION_STORE_ERROR",
            AppError::UserStore(_) => "USER_STORE_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Unknown(_) => "UNKNOWN_ERROR",
        }
    }

    /// Log this error with appropriate level and context
    pub fn log(&self) {
        let status = self.status_code();
        let code = self.error_code();

        if status.is_server_error() {
            tracing::error!(
                error = %self,
                error_code = %code,
                status = %status.as_u16(),
                "Server error occurred"
            );
        } else {
            tracing::debug!(
                error = %self,
                error_code = %code,
                "Client error occurred"
            );
        }
    }

    pub fn session(err: impl std::fmt::Display) -> Self {
        AppError::Session(err.to_string())
    }

    pub fn user_store(err: impl std::fmt::Display) -> Self {
        AppError::UserStore(err.to_string())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        self.log();

        let status = self.status_code();
        let error_code = self.error_code();

        // Internal details never reach the client
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Internal server error".to_string()
        } else {
            self.user_message()
        };

        let body = json!({
            "error": message,
            "error_code": error_code,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
