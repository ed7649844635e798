//! # Market Error Types
//!
//! The engine's error taxonomy. Every service method returns
//! [`MarketResult`].
//!
//! ## Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ValidationError                     → InvalidArgument                  │
//! │  CoreError::InsufficientSupply       → InsufficientSupply               │
//! │  CoreError::AmountOverflow           → InvalidArgument                  │
//! │  DbError::NotFound                   → NotFound                         │
//! │  DbError::UniqueViolation            → AlreadyExists                    │
//! │  any other DbError                   → Internal                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Nothing is retried. An error inside a unit rolls back all of its writes.

use thiserror::Error;

use fodi_core::{CoreError, ValidationError};
use fodi_db::DbError;

/// Market engine errors.
#[derive(Debug, Error)]
pub enum MarketError {
    /// Business, token or subscription does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Caller input rejected (non-positive amount, bad symbol, overflow).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The entity to create is already there (e.g. a second token).
    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: String, id: String },

    /// Not enough tokens in circulation.
    #[error("Insufficient token supply: available {available}, requested {requested}")]
    InsufficientSupply { available: i64, requested: i64 },

    /// Storage failure or concurrent modification.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MarketError {
    /// Creates a NotFound error.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        MarketError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates an AlreadyExists error.
    pub fn already_exists(entity: impl Into<String>, id: impl Into<String>) -> Self {
        MarketError::AlreadyExists {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

impl From<DbError> for MarketError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => MarketError::NotFound { entity, id },
            DbError::UniqueViolation { entity, constraint } => MarketError::AlreadyExists {
                entity,
                id: constraint,
            },
            other => MarketError::Internal(other.to_string()),
        }
    }
}

impl From<CoreError> for MarketError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InsufficientSupply {
                available,
                requested,
            } => MarketError::InsufficientSupply {
                available,
                requested,
            },
            CoreError::AmountOverflow { .. } => MarketError::InvalidArgument(err.to_string()),
            CoreError::Validation(v) => MarketError::InvalidArgument(v.to_string()),
        }
    }
}

impl From<ValidationError> for MarketError {
    fn from(err: ValidationError) -> Self {
        MarketError::InvalidArgument(err.to_string())
    }
}

/// Result type for market operations.
pub type MarketResult<T> = Result<T, MarketError>;

// =============================================================================
// Unit Tests
// =============================================================================
