//! Error handling module for the waterlog backend.
//!
//! Every failure is converted into the response envelope at the handler
//! boundary (`success: false` plus a code and a notification message).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const DUPLICATE_EMAIL: &str = "DUPLICATE_EMAIL";
    pub const INVALID_CREDENTIALS: &str = "INVALID_CREDENTIALS";
    pub const USER_NOT_FOUND: &str = "USER_NOT_FOUND";
    pub const ROLE_MISMATCH: &str = "ROLE_MISMATCH";
    pub const NO_WORKER_SELECTED: &str = "NO_WORKER_SELECTED";
    pub const MISSING_COMPLETION_PROOF: &str = "MISSING_COMPLETION_PROOF";
    pub const INVALID_TRANSITION: &str = "INVALID_TRANSITION";
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const FORBIDDEN: &str = "FORBIDDEN";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const VERSION_MISMATCH: &str = "VERSION_MISMATCH";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
}

/// Application error type.
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Signup with an email that is already registered
    DuplicateEmail(String),
    /// No credential matches the email/password pair
    InvalidCredentials,
    /// Credential references a user that no longer exists
    UserNotFound(String),
    /// Stored role differs from the role the login form claimed
    RoleMismatch(String),
    /// Assignment attempted without choosing a field worker
    NoWorkerSelected,
    /// Completion attempted before a proof image was attached
    MissingCompletionProof,
    /// Action not allowed from the report's current status
    InvalidTransition(String),
    /// Missing or stale session
    Unauthorized(String),
    /// Session user may not perform this action
    Forbidden(String),
    /// Resource not found
    NotFound(String),
    /// Validation error
    Validation(String),
    /// Optimistic concurrency conflict
    Conflict {
        message: String,
        current_version: i64,
    },
    /// Database error
    Database(String),
    /// Internal server error
    Internal(String),
    /// Bad request
    BadRequest(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::DuplicateEmail(_) => StatusCode::CONFLICT,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::UserNotFound(_) => StatusCode::NOT_FOUND,
            AppError::RoleMismatch(_) => StatusCode::FORBIDDEN,
            AppError::NoWorkerSelected => StatusCode::BAD_REQUEST,
            AppError::MissingCompletionProof => StatusCode::BAD_REQUEST,
            AppError::InvalidTransition(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::DuplicateEmail(_) => codes::DUPLICATE_EMAIL,
            AppError::InvalidCredentials => codes::INVALID_CREDENTIALS,
            AppError::UserNotFound(_) => codes::USER_NOT_FOUND,
            AppError::RoleMismatch(_) => codes::ROLE_MISMATCH,
            AppError::NoWorkerSelected => codes::NO_WORKER_SELECTED,
            AppError::MissingCompletionProof => codes::MISSING_COMPLETION_PROOF,
            AppError::InvalidTransition(_) => codes::INVALID_TRANSITION,
            AppError::Unauthorized(_) => codes::UNAUTHORIZED,
            AppError::Forbidden(_) => codes::FORBIDDEN,
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::Validation(_) => codes::VALIDATION_ERROR,
            AppError::Conflict { .. } => codes::VERSION_MISMATCH,
            AppError::Database(_) => codes::DATABASE_ERROR,
            AppError::Internal(_) => codes::INTERNAL_ERROR,
            AppError::BadRequest(_) => codes::BAD_REQUEST,
        }
    }

    /// Get the error message shown to the user.
    pub fn message(&self) -> String {
        match self {
            AppError::DuplicateEmail(email) => format!("Email already registered: {}", email),
            AppError::InvalidCredentials => "Invalid email or password".to_string(),
            AppError::UserNotFound(msg) => msg.clone(),
            AppError::RoleMismatch(msg) => msg.clone(),
            AppError::NoWorkerSelected => "Please select a field worker".to_string(),
            AppError::MissingCompletionProof => {
                "Please upload completion proof first".to_string()
            }
            AppError::InvalidTransition(msg) => msg.clone(),
            AppError::Unauthorized(msg) => msg.clone(),
            AppError::Forbidden(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::Validation(msg) => msg.clone(),
            AppError::Conflict { message, .. } => message.clone(),
            AppError::Database(msg) => msg.clone(),
            AppError::Internal(msg) => msg.clone(),
            AppError::BadRequest(msg) => msg.clone(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        AppError::Database(format!("Database error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        AppError::BadRequest(format!("JSON error: {}", err))
    }
}

/// Error details in the response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetails,
    pub revision_id: i64,
}

impl ErrorResponse {
    pub fn new(error: &AppError, revision_id: i64) -> Self {
        let details = match error {
            AppError::Conflict {
                current_version, ..
            } => Some(serde_json::json!({ "currentVersion": current_version })),
            _ => None,
        };

        Self {
            success: false,
            error: ErrorDetails {
                code: error.error_code().to_string(),
                message: error.message(),
                details,
            },
            revision_id,
        }
    }
}

/// Wrapper type for errors that carry revision_id context.
pub struct AppErrorWithRevision {
    pub error: AppError,
    pub revision_id: i64,
}

impl IntoResponse for AppErrorWithRevision {
    fn into_response(self) -> Response {
        let status = self.error.status_code();
        let body = ErrorResponse::new(&self.error, self.revision_id);
        (status, Json(body)).into_response()
    }
}
