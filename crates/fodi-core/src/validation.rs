//! # Validation Module
//!
//! Input validation for market operations.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler (axum)                                          │
//! │  └── Type validation (JSON deserialization)                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: fodi-market services                                         │
//! │  └── THIS MODULE: amounts, symbols, names                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints (supply >= 0, tokens > 0)                       │
//! │  ├── UNIQUE constraints (one token per business)                       │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::{MAX_BUSINESS_NAME_LEN, MAX_SYMBOL_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Default page size for ledger queries.
pub const DEFAULT_LIMIT: i64 = 50;

/// Largest page size for ledger queries.
pub const MAX_LIMIT: i64 = 1000;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a business name.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 200 characters
///
/// ## Example
/// ```rust
/// use fodi_core::validation::validate_business_name;
///
/// assert!(validate_business_name("Pizza Palace").is_ok());
/// assert!(validate_business_name("   ").is_err());
/// ```
pub fn validate_business_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_BUSINESS_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_BUSINESS_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a token symbol.
///
/// ## Rules
/// - Must not be empty
/// - At most 16 characters
/// - Letters and digits only
///
/// ## Example
/// ```rust
/// use fodi_core::validation::validate_symbol;
///
/// assert!(validate_symbol("PIZT").is_ok());
/// assert!(validate_symbol("").is_err());
/// assert!(validate_symbol("PIZ-T").is_err());
/// ```
pub fn validate_symbol(symbol: &str) -> ValidationResult<()> {
    if symbol.is_empty() {
        return Err(ValidationError::Required {
            field: "symbol".to_string(),
        });
    }

    if symbol.chars().count() > MAX_SYMBOL_LEN {
        return Err(ValidationError::TooLong {
            field: "symbol".to_string(),
            max: MAX_SYMBOL_LEN,
        });
    }

    if !symbol.chars().all(char::is_alphanumeric) {
        return Err(ValidationError::InvalidFormat {
            field: "symbol".to_string(),
            reason: "must contain only letters and numbers".to_string(),
        });
    }

    Ok(())
}

/// Validates that an identifier is present.
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a token amount for mint, burn, subscribe or create.
///
/// ## Rules
/// - Must be positive (> 0)
pub fn validate_token_amount(field: &str, amount: i64) -> ValidationResult<()> {
    if amount <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Normalizes a requested page size.
///
/// Anything outside `1..=1000` (or missing) falls back to 50.
///
/// ## Example
/// ```rust
/// use fodi_core::validation::normalize_limit;
///
/// assert_eq!(normalize_limit(None), 50);
/// assert_eq!(normalize_limit(Some(10)), 10);
/// assert_eq!(normalize_limit(Some(0)), 50);
/// assert_eq!(normalize_limit(Some(5000)), 50);
/// ```
pub fn normalize_limit(limit: Option<i64>) -> i64 {
    match limit {
        Some(l) if (1..=MAX_LIMIT).contains(&l) => l,
        _ => DEFAULT_LIMIT,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_business_name() {
        assert!(validate_business_name("Pizza Palace").is_ok());
        assert!(validate_business_name("").is_err());
        assert!(validate_business_name(&"A".repeat(200)).is_ok());
        assert!(validate_business_name(&"A".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_symbol() {
        assert!(validate_symbol("PIZT").is_ok());
        assert!(validate_symbol("ABC123").is_ok());
        assert!(validate_symbol(&"A".repeat(16)).is_ok());

        assert!(validate_symbol("").is_err());
        assert!(validate_symbol(&"A".repeat(17)).is_err());
        assert!(validate_symbol("has space").is_err());
        assert!(validate_symbol("PIZ_T").is_err());
    }

    #[test]
    fn test_validate_token_amount() {
        assert!(validate_token_amount("amount", 1).is_ok());
        assert!(matches!(
            validate_token_amount("amount", 0),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(validate_token_amount("amount", -5).is_err());
    }

    #[test]
    fn test_validate_id() {
        assert!(validate_id("userId", "u-1").is_ok());
        assert!(validate_id("userId", "  ").is_err());
    }

    #[test]
    fn test_normalize_limit() {
        assert_eq!(normalize_limit(Some(1)), 1);
        assert_eq!(normalize_limit(Some(1000)), 1000);
        assert_eq!(normalize_limit(Some(1001)), 50);
        assert_eq!(normalize_limit(Some(-3)), 50);
    }
}
