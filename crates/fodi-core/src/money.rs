//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    19.0 * 1.491 = 28.328999999999997  ❌ rounds to 28.32!              │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Token prices, investments, refunds are all i64 cents.               │
//! │    Pricing is evaluated as an exact fraction, rounded once.            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use fodi_core::money::Money;
//!
//! let price = Money::from_cents(1900); // $19.00
//!
//! // Investment for 10 tokens
//! let investment = price.checked_mul_tokens(10).unwrap();
//! assert_eq!(investment.cents(), 19_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: profit on a position can be negative
/// - **Single field tuple struct**: Zero-cost abstraction over i64
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  BusinessToken.price_cents ──┬──► investment = price × tokens          │
/// │                              │         │                                │
/// │                              │         ▼                                │
/// │                              │   Subscription.invested_cents            │
/// │                              │   Transaction.amount_cents (buy)         │
/// │                              │                                          │
/// │                              └──► refund = price × tokens_owned        │
/// │                                        │                                │
/// │                                        ▼                                │
/// │                                  Transaction.amount_cents (sell)        │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use fodi_core::money::Money;
    ///
    /// let price = Money::from_cents(2833); // Represents $28.33
    /// assert_eq!(price.cents(), 2833);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Multiplies a per-token price by a token count.
    ///
    /// Returns `None` on overflow instead of wrapping, so a huge order is
    /// rejected rather than silently priced at garbage.
    ///
    /// ## Example
    /// ```rust
    /// use fodi_core::money::Money;
    ///
    /// let price = Money::from_cents(2833);
    /// assert_eq!(price.checked_mul_tokens(3).unwrap().cents(), 8499);
    /// assert!(price.checked_mul_tokens(i64::MAX).is_none());
    /// ```
    #[inline]
    pub fn checked_mul_tokens(&self, tokens: i64) -> Option<Money> {
        self.0.checked_mul(tokens).map(Money)
    }
}

// =============================================================================
// Display Implementation
// =============================================================================

impl fmt::Display for Money {
    /// Formats money for display.
    ///
    /// ## Example
    /// ```rust
    /// use fodi_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(2833).to_string(), "$28.33");
    /// assert_eq!(Money::from_cents(-550).to_string(), "-$5.50");
    /// ```
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}${}.{:02}", sign, abs / 100, abs % 100)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        assert_eq!(Money::from_cents(1900).cents(), 1900);
        assert_eq!(Money::from_cents(-550).cents(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1900).to_string(), "$19.00");
        assert_eq!(Money::from_cents(5).to_string(), "$0.05");
        assert_eq!(Money::from_cents(-550).to_string(), "-$5.50");
        assert_eq!(Money::from_cents(0).to_string(), "$0.00");
    }

    #[test]
    fn test_checked_mul_tokens() {
        let price = Money::from_cents(1900);
        assert_eq!(price.checked_mul_tokens(10), Some(Money::from_cents(19_000)));
        assert_eq!(price.checked_mul_tokens(0), Some(Money::from_cents(0)));
        assert_eq!(price.checked_mul_tokens(i64::MAX / 2), None);
    }
}
