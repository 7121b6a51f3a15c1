//! Type-safe error codes for API responses.
//!
//! Each error code carries:
//! - String representation for client consumption (e.g., "VALIDATION_ERROR")
//! - Integer code for logging and monitoring (e.g., 1001)
//! - Default human-readable message
//!
//! # Example
//!
//! ```rust
//! use axum_helpers::errors::ErrorCode;
//!
//! let code = ErrorCode::ValidationError;
//! assert_eq!(code.as_str(), "VALIDATION_ERROR");
//! assert_eq!(code.code(), 1001);
//! assert_eq!(code.default_message(), "Request validation failed");
//! ```

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::messages;

/// Standardized error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Client errors (1000-1999)
    /// Request validation failed
    ValidationError,

    /// Path identifier is not a valid integer id
    InvalidId,

    /// JSON extraction from request body failed
    JsonExtraction,

    /// Requested resource was not found
    NotFound,

    /// Request could not be understood
    BadRequest,

    /// HTTP method is not allowed on this route
    MethodNotAllowed,

    // Server errors
    /// An unexpected internal server error occurred
    InternalError,
}

impl ErrorCode {
    /// SCREAMING_SNAKE_CASE identifier clients can match on.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::InvalidId => "INVALID_ID",
            ErrorCode::JsonExtraction => "JSON_EXTRACTION",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Integer code for logs and dashboards.
    pub fn code(&self) -> i32 {
        match self {
            ErrorCode::ValidationError => messages::CODE_VALIDATION,
            ErrorCode::InvalidId => messages::CODE_INVALID_ID,
            ErrorCode::JsonExtraction => messages::CODE_JSON_EXTRACTION,
            ErrorCode::NotFound => messages::CODE_NOT_FOUND,
            ErrorCode::InternalError => messages::CODE_INTERNAL,
            ErrorCode::BadRequest => messages::CODE_BAD_REQUEST,
            ErrorCode::MethodNotAllowed => messages::CODE_METHOD_NOT_ALLOWED,
        }
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => messages::VALIDATION_FAILED,
            ErrorCode::InvalidId => messages::INVALID_ID,
            ErrorCode::JsonExtraction => messages::INVALID_JSON,
            ErrorCode::NotFound => messages::NOT_FOUND_RESOURCE,
            ErrorCode::BadRequest => messages::BAD_REQUEST,
            ErrorCode::MethodNotAllowed => messages::METHOD_NOT_ALLOWED,
            ErrorCode::InternalError => messages::INTERNAL_ERROR,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
