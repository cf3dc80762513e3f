//! Structured error handling for the API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
    pub request_id: String,
    pub timestamp: i64,
}

/// Error detail structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

/// Application error types
#[derive(Debug)]
pub enum AppError {
    // Client errors (4xx)
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    ValidationError { field: String, message: String },

    // Business logic errors
    AlreadySettled { bet_id: String },
    InsufficientCoins { required: u64, available: u64 },

    // Server errors (5xx)
    Internal(String),
    PersistenceError(String),
}

impl AppError {
    /// Get HTTP status code for error
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ValidationError { .. } => StatusCode::BAD_REQUEST,

            AppError::AlreadySettled { .. } => StatusCode::CONFLICT,
            AppError::InsufficientCoins { .. } => StatusCode::BAD_REQUEST,

            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::PersistenceError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code
    fn error_code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::ValidationError { .. } => "VALIDATION_ERROR",

            AppError::AlreadySettled { .. } => "ALREADY_SETTLED",
            AppError::InsufficientCoins { .. } => "INSUFFICIENT_COINS",

            AppError::Internal(_) => "INTERNAL_ERROR",
            AppError::PersistenceError(_) => "PERSISTENCE_ERROR",
        }
    }

    /// Get user-friendly message
    fn message(&self) -> String {
        match self {
            AppError::BadRequest(msg) => msg.clone(),
            AppError::Unauthorized(msg) => msg.clone(),
            AppError::NotFound(what) => format!("{} not found", what),
            AppError::ValidationError { field, message } => {
                format!("Validation error on field '{}': {}", field, message)
            }

            AppError::AlreadySettled { bet_id } => {
                format!("Bet {} has already been settled", bet_id)
            }
            AppError::InsufficientCoins { required, available } => {
                format!(
                    "Insufficient coins. Required: {}, Available: {}",
                    required, available
                )
            }

            AppError::Internal(_) => "Internal server error occurred".to_string(),
            AppError::PersistenceError(_) => "Data persistence failed".to_string(),
        }
    }

    /// Get error details as JSON
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            AppError::ValidationError { field, .. } => Some(serde_json::json!({
                "field": field
            })),
            AppError::AlreadySettled { bet_id } => Some(serde_json::json!({
                "bet_id": bet_id
            })),
            AppError::InsufficientCoins { required, available } => Some(serde_json::json!({
                "required": required,
                "available": available
            })),
            _ => None,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.message(),
                details: self.details(),
            },
            request_id: Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().timestamp(),
        };

        // Log error for monitoring
        tracing::error!(
            request_id = %error_response.request_id,
            error_code = %error_response.error.code,
            status = %status,
            "API error occurred"
        );

        (status, Json(error_response)).into_response()
    }
}

// Convenient type alias
pub type Result<T> = std::result::Result<T, AppError>;

// From implementations for common errors
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(format!("Invalid JSON: {}", err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::PersistenceError(err.to_string())
    }
}
