//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Handler ── Result<Json<_>, ApiError>                                   │
//! │                                                                         │
//! │  MarketError::NotFound            ──► 404 NOT_FOUND                     │
//! │  MarketError::InvalidArgument     ──► 400 VALIDATION_ERROR              │
//! │  MarketError::InsufficientSupply  ──► 400 INSUFFICIENT_SUPPLY           │
//! │  MarketError::AlreadyExists       ──► 500 CONFLICT                      │
//! │  MarketError::Internal            ──► 500 INTERNAL (details logged)     │
//! │  missing / bad token              ──► 401 UNAUTHORIZED                  │
//! │  not an admin                     ──► 403 FORBIDDEN                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Bodies are always:
//! ```json
//! { "code": "NOT_FOUND", "message": "Token not found: 3f2c..." }
//! ```

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use fodi_market::MarketError;

/// Error returned from every handler.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Not enough tokens in circulation (400)
    InsufficientSupply,

    /// Resource already exists (500, the code tells it apart)
    Conflict,

    /// Missing or invalid credentials (401)
    Unauthorized,

    /// Authenticated but not allowed (403)
    Forbidden,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError | ErrorCode::InsufficientSupply => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::Conflict | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Forbidden, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl From<MarketError> for ApiError {
    fn from(err: MarketError) -> Self {
        match err {
            MarketError::NotFound { .. } => ApiError::new(ErrorCode::NotFound, err.to_string()),
            MarketError::InvalidArgument(msg) => ApiError::validation(msg),
            MarketError::InsufficientSupply { .. } => {
                ApiError::new(ErrorCode::InsufficientSupply, err.to_string())
            }
            MarketError::AlreadyExists { .. } => ApiError::new(ErrorCode::Conflict, err.to_string()),
            MarketError::Internal(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Market operation failed: {}", e);
                ApiError::internal("Internal server error")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_error_mapping() {
        let err: ApiError = MarketError::not_found("Token", "b1").into();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Token not found: b1");

        let err: ApiError = MarketError::InvalidArgument("amount must be positive".into()).into();
        assert_eq!(err.code.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "amount must be positive");

        let err: ApiError = MarketError::InsufficientSupply {
            available: 1,
            requested: 5,
        }
        .into();
        assert_eq!(err.code, ErrorCode::InsufficientSupply);
        assert_eq!(err.code.status(), StatusCode::BAD_REQUEST);

        // Duplicates fall under "everything else"
        let err: ApiError = MarketError::already_exists("Token", "b1").into();
        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(err.code.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Token already exists: b1");
    }

    #[test]
    fn test_internal_details_hidden() {
        let err: ApiError = MarketError::Internal("disk I/O error at page 42".into()).into();
        assert_eq!(err.code.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Internal server error");
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_value(ApiError::forbidden("Admin role required")).unwrap();
        assert_eq!(json["code"], "FORBIDDEN");
        assert_eq!(json["message"], "Admin role required");
    }
}
