//! Standardized API response format

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt::Display;

/// Standard API response structure
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

/// API error structure
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful response
    pub fn success(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = if self.success {
            StatusCode::OK
        } else {
            match self.error.as_ref().map(|e| e.code.as_str()) {
                Some("BAD_REQUEST") | Some("VALIDATION_ERROR") => StatusCode::BAD_REQUEST,
                Some("UNAUTHORIZED") => StatusCode::UNAUTHORIZED,
                Some("NOT_FOUND") => StatusCode::NOT_FOUND,
                Some("ALREADY_SETTLED") => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            }
        };

        (status, Json(self)).into_response()
    }
}

/// Helper functions for common responses
pub mod responses {
    use super::*;

    /// Success response with data
    pub fn ok<T: Serialize>(data: T) -> ApiResponse<T> {
        ApiResponse::success(data)
    }

    /// Not found error
    pub fn not_found(resource: impl Display) -> ApiResponse<()> {
        ApiResponse::<()>::error("NOT_FOUND", format!("{} not found", resource))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_response() {
        let response = ApiResponse::success(json!({ "id": 1, "name": "Test" }));
        assert!(response.success);
        assert!(response.data.is_some());
        assert!(response.error.is_none());
    }

    #[test]
    fn test_error_response() {
        let response = ApiResponse::<()>::error("NOT_FOUND", "Match not found");
        assert!(!response.success);
        assert!(response.data.is_none());

        let error = response.error.as_ref().unwrap();
        assert_eq!(error.code, "NOT_FOUND");
        assert_eq!(error.message, "Match not found");
    }

    #[test]
    fn test_status_code_mapping() {
        let test_cases = vec![
            ("BAD_REQUEST", StatusCode::BAD_REQUEST),
            ("UNAUTHORIZED", StatusCode::UNAUTHORIZED),
            ("NOT_FOUND", StatusCode::NOT_FOUND),
            ("ALREADY_SETTLED", StatusCode::CONFLICT),
            ("UNKNOWN_ERROR", StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (code, expected_status) in test_cases {
            let response = ApiResponse::<()>::error(code, "test");
            let http_response = response.into_response();
            assert_eq!(http_response.status(), expected_status);
        }
    }
}
