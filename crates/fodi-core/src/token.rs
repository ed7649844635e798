//! # Token Rules
//!
//! Symbol derivation and the supply arithmetic shared by minting, burning,
//! subscribing and unsubscribing.
//!
//! ```text
//!   Mint / Unsubscribe            Burn / Subscribe
//!   ──────────────────            ────────────────
//!   deposit_supply(s, n)          withdraw_supply(s, n)
//!     s + n (overflow → error)      n > s → InsufficientSupply
//!                                   s - n
//! ```

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

/// Suffix appended to every derived symbol.
pub const SYMBOL_SUFFIX: char = 'T';

/// Number of name characters used in a derived symbol.
const SYMBOL_PREFIX_CHARS: usize = 3;

/// Derives a token symbol from a business name.
///
/// First three characters of the trimmed name (char-wise, so multi-byte
/// names are never split), upper-cased, followed by `T`.
///
/// ## Example
/// ```rust
/// use fodi_core::token::generate_token_symbol;
///
/// assert_eq!(generate_token_symbol("Pizza Palace"), "PIZT");
/// assert_eq!(generate_token_symbol("  Суши Бар"), "СУШT");
/// assert_eq!(generate_token_symbol("Io"), "IOT");
/// ```
pub fn generate_token_symbol(business_name: &str) -> String {
    let prefix: String = business_name
        .trim()
        .chars()
        .take(SYMBOL_PREFIX_CHARS)
        .collect();

    let mut symbol = prefix.to_uppercase();
    symbol.push(SYMBOL_SUFFIX);
    symbol
}

/// Removes `amount` tokens from circulation.
pub fn withdraw_supply(supply: i64, amount: i64) -> CoreResult<i64> {
    if amount > supply {
        return Err(CoreError::InsufficientSupply {
            available: supply,
            requested: amount,
        });
    }
    Ok(supply - amount)
}

/// Returns `amount` tokens to circulation.
pub fn deposit_supply(supply: i64, amount: i64) -> CoreResult<i64> {
    supply.checked_add(amount).ok_or_else(|| CoreError::AmountOverflow {
        what: "total supply".to_string(),
    })
}

/// Cost of `tokens` at `price`.
pub fn position_value(price: Money, tokens: i64) -> CoreResult<Money> {
    price
        .checked_mul_tokens(tokens)
        .ok_or_else(|| CoreError::AmountOverflow {
            what: "investment amount".to_string(),
        })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_symbol() {
        assert_eq!(generate_token_symbol("Pizza Palace"), "PIZT");
        assert_eq!(generate_token_symbol("burger"), "BURT");
        assert_eq!(generate_token_symbol("  tacos  "), "TACT");
        assert_eq!(generate_token_symbol("A"), "AT");
        assert_eq!(generate_token_symbol("Кафе Пушкин"), "КАФT");
        assert_eq!(generate_token_symbol("寿司屋さん"), "寿司屋T");
    }

    #[test]
    fn test_withdraw_supply() {
        assert_eq!(withdraw_supply(100, 10).unwrap(), 90);
        assert_eq!(withdraw_supply(10, 10).unwrap(), 0);

        let err = withdraw_supply(5, 6).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientSupply {
                available: 5,
                requested: 6
            }
        ));
    }

    #[test]
    fn test_deposit_supply() {
        assert_eq!(deposit_supply(90, 10).unwrap(), 100);
        assert!(matches!(
            deposit_supply(i64::MAX, 1),
            Err(CoreError::AmountOverflow { .. })
        ));
    }

    #[test]
    fn test_position_value() {
        assert_eq!(
            position_value(Money::from_cents(1900), 10).unwrap().cents(),
            19_000
        );
        assert!(position_value(Money::from_cents(1900), i64::MAX).is_err());
    }
}
