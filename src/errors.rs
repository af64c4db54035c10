use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Unique error codes for client identification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Database errors (1xxx)
    DatabaseConnection = 1001,
    DatabaseQuery = 1002,
    TransactionFailed = 1003,

    // Validation errors (2xxx)
    ValidationFailed = 2001,

    // Resource errors (3xxx)
    NotFound = 3001,
    DuplicatePair = 3002,

    // Source provider errors (4xxx)
    SourceFetchFailed = 4001,

    // Image synthesis errors (5xxx)
    RateLimited = 5001,
    BudgetExceeded = 5002,
    GenerationFailed = 5003,

    // Internal errors (9xxx)
    InternalError = 9001,
    ConfigurationError = 9002,
}

impl ErrorCode {
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Database errors
    #[error("Database connection error: {0}")]
    DatabaseConnection(String),

    #[error("Database query error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Transaction aborted for a reason other than a duplicate pair.
    /// The rollback has already happened when this surfaces.
    #[error("Transaction failed: {0}")]
    Persist(String),

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),

    // Resource errors
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    #[error("An identical image pair already exists")]
    DuplicatePair,

    // Source provider errors
    #[error("APOD fetch failed: {0}")]
    SourceFetch(String),

    // Image synthesis errors
    #[error("Image generation rate limit exceeded")]
    RateLimited,

    #[error("Image generation budget exhausted")]
    BudgetExceeded,

    #[error("Image generation failed: {0}")]
    Generation(String),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl AppError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::DatabaseConnection(_) => ErrorCode::DatabaseConnection,
            Self::Database(_) => ErrorCode::DatabaseQuery,
            Self::Persist(_) => ErrorCode::TransactionFailed,
            Self::Validation(_) => ErrorCode::ValidationFailed,
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::DuplicatePair => ErrorCode::DuplicatePair,
            Self::SourceFetch(_) => ErrorCode::SourceFetchFailed,
            Self::RateLimited => ErrorCode::RateLimited,
            Self::BudgetExceeded => ErrorCode::BudgetExceeded,
            Self::Generation(_) => ErrorCode::GenerationFailed,
            Self::Internal(_) => ErrorCode::InternalError,
            Self::Config(_) => ErrorCode::ConfigurationError,
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::DatabaseConnection(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Persist(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::DuplicatePair => StatusCode::CONFLICT,
            Self::SourceFetch(_) => StatusCode::BAD_GATEWAY,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::BudgetExceeded => StatusCode::FORBIDDEN,
            Self::Generation(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();

        // Log based on severity
        match &self {
            AppError::Validation(_) | AppError::NotFound { .. } | AppError::DuplicatePair => {
                tracing::debug!(error_code = error_code.as_u16(), %message, "Client error");
            }
            AppError::SourceFetch(_)
            | AppError::RateLimited
            | AppError::BudgetExceeded
            | AppError::Generation(_) => {
                tracing::warn!(error_code = error_code.as_u16(), %message, "Upstream error");
            }
            _ => {
                tracing::error!(error_code = error_code.as_u16(), %message, error = ?self, "Server error");
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code.as_u16(),
                "status": status.as_u16(),
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
