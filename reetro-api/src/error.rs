//! Error Types for the reetro API
//!
//! This module defines error handling for the API layer, including:
//! - ApiError struct for structured error responses
//! - ErrorCode enum for categorizing errors
//! - IntoResponse implementation for Axum HTTP responses
//!
//! Every error body has the shape `{"detail": "<reason>"}`, with an extra
//! `errors` list for field-level validation failures.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use reetro_core::{ConfigError, ReetroError, StorageError, ValidationError};
use serde::Serialize;
use std::fmt;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
///
/// Each error code maps to a specific HTTP status code. The code itself is
/// not part of the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // ========================================================================
    // Authentication Errors (401)
    // ========================================================================
    /// Missing, malformed or rejected credentials, or a role check failed
    Unauthorized,

    /// Token is invalid, expired, or signed with an unexpected algorithm
    InvalidToken,

    // ========================================================================
    // Validation Errors (400)
    // ========================================================================
    /// Request validation failed
    ValidationFailed,

    /// Request contains invalid input data
    InvalidInput,

    /// Token issuance failed
    SigningFailed,

    // ========================================================================
    // Not Found / Conflict
    // ========================================================================
    /// Requested entity does not exist
    EntityNotFound,

    /// Entity with the same unique field already exists
    EntityAlreadyExists,

    // ========================================================================
    // Server Errors (500, 503)
    // ========================================================================
    /// Internal server error
    InternalError,

    /// Database operation failed
    DatabaseError,

    /// Service is temporarily unavailable
    ServiceUnavailable,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::Unauthorized | ErrorCode::InvalidToken => StatusCode::UNAUTHORIZED,

            ErrorCode::ValidationFailed | ErrorCode::InvalidInput | ErrorCode::SigningFailed => {
                StatusCode::BAD_REQUEST
            }

            ErrorCode::EntityNotFound => StatusCode::NOT_FOUND,

            ErrorCode::EntityAlreadyExists => StatusCode::CONFLICT,

            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,

            ErrorCode::InternalError | ErrorCode::DatabaseError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::Unauthorized => "Unauthorized",
            ErrorCode::InvalidToken => "Invalid token",
            ErrorCode::ValidationFailed => "Request validation failed",
            ErrorCode::InvalidInput => "Invalid input data",
            ErrorCode::SigningFailed => "Error While Generating Token",
            ErrorCode::EntityNotFound => "Not found",
            ErrorCode::EntityAlreadyExists => "Already exists",
            ErrorCode::InternalError => "An internal error occurred",
            ErrorCode::DatabaseError => "Database operation failed",
            ErrorCode::ServiceUnavailable => "Service temporarily unavailable",
        }
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// One failing field in a validation error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Structured API error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub code: ErrorCode,

    /// Human-readable reason
    pub detail: String,

    /// Field-level failures, only for validation errors
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl ApiError {
    /// Create a new API error with a custom detail message.
    pub fn new(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self {
            code,
            detail: detail.into(),
            errors: Vec::new(),
        }
    }

    /// Create an error using the code's default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // ========================================================================
    // Convenience Constructors
    // ========================================================================

    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, detail)
    }

    pub fn invalid_token(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidToken, detail)
    }

    pub fn invalid_input(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, detail)
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::EntityNotFound, detail)
    }

    pub fn database_error() -> Self {
        Self::from_code(ErrorCode::DatabaseError)
    }

    pub fn internal_error(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, detail)
    }

    pub fn service_unavailable(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, detail)
    }

    pub fn signing_failed() -> Self {
        Self::from_code(ErrorCode::SigningFailed)
    }

    /// Collect domain validation failures into one 400 response.
    pub fn validation(errors: Vec<ValidationError>) -> Self {
        Self {
            code: ErrorCode::ValidationFailed,
            detail: ErrorCode::ValidationFailed.default_message().to_string(),
            errors: errors
                .into_iter()
                .map(|e| FieldError {
                    field: e.field().to_string(),
                    message: e.to_string(),
                })
                .collect(),
        }
    }

    /// Fail with a validation error unless `errors` is empty.
    pub fn check(errors: Vec<ValidationError>) -> ApiResult<()> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Self::validation(errors))
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.detail)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(self)).into_response()
    }
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(vec![err])
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        tracing::error!(error = %err, "Configuration error");
        ApiError::internal_error("Server configuration error")
    }
}

/// Store errors never reach the client verbatim. Not-found becomes a generic
/// "<entity> not found"; everything else becomes the database error shape.
impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match &err {
            StorageError::NotFound { entity_type, .. }
            | StorageError::NoMatch { entity_type, .. } => {
                ApiError::not_found(format!("{} not found", capitalize(entity_type.as_str())))
            }
            StorageError::Conflict { entity_type, .. } => ApiError::new(
                ErrorCode::EntityAlreadyExists,
                format!("{} already exists", capitalize(entity_type.as_str())),
            ),
            StorageError::Unavailable { .. } => {
                tracing::error!(error = %err, "Storage unavailable");
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            _ => {
                tracing::error!(error = %err, "Storage operation failed");
                ApiError::database_error()
            }
        }
    }
}

impl From<ReetroError> for ApiError {
    fn from(err: ReetroError) -> Self {
        match err {
            ReetroError::Storage(e) => e.into(),
            ReetroError::Validation(e) => e.into(),
            ReetroError::Config(e) => e.into(),
            ReetroError::Cache(e) => {
                // The coordinator never propagates cache errors; reaching this
                // means a handler called the cache directly.
                tracing::warn!(error = %e, "Cache error reached the API boundary");
                ApiError::service_unavailable("Cache temporarily unavailable")
            }
        }
    }
}

/// Convert tokio_postgres errors to ApiError.
impl From<tokio_postgres::Error> for ApiError {
    fn from(err: tokio_postgres::Error) -> Self {
        tracing::error!(error = %err, "Database error");
        ApiError::database_error()
    }
}

/// Convert deadpool_postgres pool errors to ApiError.
impl From<deadpool_postgres::PoolError> for ApiError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        tracing::error!(error = %err, "Connection pool error");
        ApiError::service_unavailable("Database connection pool exhausted")
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

// ============================================================================
// TESTS
// ============================================================================
