//! Error types for talentshow.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Client Errors ===
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    // === Show Errors ===
    #[error("Voting is closed for act {0}")]
    VotingClosed(String),

    /// Soft failure: the voter already rated this act.
    #[error("Already voted (vote {vote_id}, rating {rating})")]
    AlreadyVoted { vote_id: String, rating: i32 },

    #[error("Invalid trivia option {index} (question has {options} options)")]
    InvalidOption { index: i32, options: usize },

    // === Server Errors ===
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Activation committed but the active set is not exactly the target.
    #[error("Activation of {target} left {} other act(s) active", .inconsistent.len())]
    PartialBatchFailure {
        target: String,
        inconsistent: Vec<String>,
    },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Redis error: {0}")]
    Redis(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            // 4xx Client Errors
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) | Self::Validation(_) | Self::InvalidOption { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::Conflict(_) | Self::VotingClosed(_) | Self::AlreadyVoted { .. } => {
                StatusCode::CONFLICT
            }

            // 5xx Server Errors
            Self::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::PartialBatchFailure { .. }
            | Self::Database(_)
            | Self::Redis(_)
            | Self::Config(_)
            | Self::ExternalService(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::VotingClosed(_) => "VOTING_CLOSED",
            Self::AlreadyVoted { .. } => "ALREADY_VOTED",
            Self::InvalidOption { .. } => "INVALID_OPTION",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::PartialBatchFailure { .. } => "PARTIAL_BATCH_FAILURE",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Redis(_) => "REDIS_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Returns whether retrying the same operation may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }

    /// Structured payload for errors that carry more than a message.
    #[must_use]
    pub fn details(&self) -> Option<Value> {
        match self {
            Self::AlreadyVoted { vote_id, rating } => Some(json!({
                "voteId": vote_id,
                "rating": rating,
            })),
            Self::InvalidOption { index, options } => Some(json!({
                "index": index,
                "options": options,
            })),
            Self::PartialBatchFailure {
                target,
                inconsistent,
            } => Some(json!({
                "target": target,
                "inconsistent": inconsistent,
            })),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        // Log server errors
        if self.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
        } else {
            tracing::debug!(error = %self, code = code, "Client error occurred");
        }

        let mut error = json!({
            "code": code,
            "message": self.to_string(),
        });
        if let Some(details) = self.details() {
            error["details"] = details;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}
