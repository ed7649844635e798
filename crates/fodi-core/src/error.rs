//! # Error Types
//!
//! Domain-specific error types for fodi-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  fodi-core errors (this file)                                          │
//! │  ├── CoreError        - Market rule violations                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  fodi-db errors                                                        │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  fodi-market errors                                                    │
//! │  └── MarketError      - Engine taxonomy (NotFound, InvalidArgument...) │
//! │                                                                         │
//! │  fodi-api errors                                                       │
//! │  └── ApiError         - What HTTP clients see (serialized)             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → MarketError → ApiError → Client   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core market rule errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Not enough tokens in circulation to complete the operation.
    ///
    /// ## When This Occurs
    /// - Subscribing to more tokens than the current supply
    /// - Burning more tokens than the current supply
    ///
    /// ```text
    /// Subscribe (tokens: 150)
    ///      │
    ///      ▼
    /// Check supply: available=100
    ///      │
    ///      ▼
    /// InsufficientSupply { available: 100, requested: 150 }
    /// ```
    #[error("Insufficient token supply: available {available}, requested {requested}")]
    InsufficientSupply { available: i64, requested: i64 },

    /// An amount computation left the representable range.
    #[error("{what} overflows the supported range")]
    AmountOverflow { what: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before any storage is touched.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid symbol characters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientSupply {
            available: 100,
            requested: 150,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient token supply: available 100, requested 150"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "symbol".to_string(),
        };
        assert_eq!(err.to_string(), "symbol is required");

        let err = ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        };
        assert_eq!(err.to_string(), "name must be at most 200 characters");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "amount".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
