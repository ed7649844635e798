//! # Pricing Module
//!
//! The demand-driven token price formula.
//!
//! ## Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Token Price Computation                           │
//! │                                                                         │
//! │  supply_mult      = (supply / 10)            × 0.05                    │
//! │  investor_mult    = investor_count           × 0.02                    │
//! │  investment_mult  = (total_invested / $100)  × 0.01                    │
//! │  transaction_mult = (transaction_count / 5)  × 0.01                    │
//! │                                                                         │
//! │  multiplier = 1 + Σ                                                     │
//! │  price      = min(base × multiplier, base × max_multiplier)            │
//! │             → rounded half-up to the cent                              │
//! │                                                                         │
//! │  Divisions are exact: 7 transactions contribute 7/5 × 0.01.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Exact Arithmetic
//! Every term is brought over the common denominator
//! `10000 × supply_step × investment_step × transaction_step` and summed in
//! i128, so the quote is the same on every machine and never drifts the way
//! `f64` products do. Rounding happens exactly once, at the end.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

/// Denominator for all `*_bps` weights: 10000 bps = 1.0.
pub const BPS_DENOMINATOR: i64 = 10_000;

// Upper bounds keep every intermediate product inside i128.
const MAX_STEP: i64 = 1_000_000;
const MAX_WEIGHT_BPS: i64 = 1_000_000;
const MAX_MULTIPLIER: i64 = 1_000;
const MAX_BASE_PRICE_CENTS: i64 = 1_000_000_000;

// =============================================================================
// Pricing Config
// =============================================================================

/// Coefficients of the price formula.
///
/// `Default` reproduces the production constants: base $19.00, +5% per 10
/// tokens of supply, +2% per investor, +1% per $100 invested, +1% per 5
/// transactions, capped at 10× base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct PricingConfig {
    /// Price of a token with no market activity, in cents.
    pub base_price_cents: i64,

    /// Tokens of supply per supply increment.
    pub supply_step: i64,

    /// Multiplier added per supply step, in basis points.
    pub supply_weight_bps: i64,

    /// Multiplier added per investor, in basis points.
    pub investor_weight_bps: i64,

    /// Invested cents per investment increment.
    pub investment_step_cents: i64,

    /// Multiplier added per investment step, in basis points.
    pub investment_weight_bps: i64,

    /// Transactions per transaction increment.
    pub transaction_step: i64,

    /// Multiplier added per transaction step, in basis points.
    pub transaction_weight_bps: i64,

    /// Ceiling on the total multiplier.
    pub max_multiplier: i64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        PricingConfig {
            base_price_cents: 1900,
            supply_step: 10,
            supply_weight_bps: 500,
            investor_weight_bps: 200,
            investment_step_cents: 10_000,
            investment_weight_bps: 100,
            transaction_step: 5,
            transaction_weight_bps: 100,
            max_multiplier: 10,
        }
    }
}

/// Aggregate demand signals for one business, as read from the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MarketSignals {
    /// Tokens currently in circulation.
    pub supply: i64,
    /// Number of subscription rows.
    pub investor_count: i64,
    /// Sum of `invested_cents` over all subscriptions.
    pub total_invested_cents: i64,
    /// Number of ledger transactions.
    pub transaction_count: i64,
}

/// Result of one price computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceQuote {
    /// Final per-token price, rounded half-up to the cent.
    pub price: Money,
    /// Effective multiplier in basis points (14910 = 1.491×), floored.
    pub multiplier_bps: i64,
    /// Whether the max multiplier clamped the price.
    pub capped: bool,
}

impl PricingConfig {
    /// Base price as Money.
    #[inline]
    pub fn base_price(&self) -> Money {
        Money::from_cents(self.base_price_cents)
    }

    /// Highest price the formula can return.
    #[inline]
    pub fn max_price(&self) -> Money {
        Money::from_cents(self.base_price_cents.saturating_mul(self.max_multiplier))
    }

    /// Checks the coefficients.
    ///
    /// ## Rules
    /// - base price in `1..=1_000_000_000` cents
    /// - steps in `1..=1_000_000`
    /// - weights in `0..=1_000_000` bps
    /// - max multiplier in `1..=1000`
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_range("base_price_cents", self.base_price_cents, 1, MAX_BASE_PRICE_CENTS)?;

        for (field, step) in [
            ("supply_step", self.supply_step),
            ("investment_step_cents", self.investment_step_cents),
            ("transaction_step", self.transaction_step),
        ] {
            check_range(field, step, 1, MAX_STEP)?;
        }

        for (field, weight) in [
            ("supply_weight_bps", self.supply_weight_bps),
            ("investor_weight_bps", self.investor_weight_bps),
            ("investment_weight_bps", self.investment_weight_bps),
            ("transaction_weight_bps", self.transaction_weight_bps),
        ] {
            check_range(field, weight, 0, MAX_WEIGHT_BPS)?;
        }

        check_range("max_multiplier", self.max_multiplier, 1, MAX_MULTIPLIER)
    }

    /// Computes the token price for the given signals.
    ///
    /// Pure: same config and signals always give the same quote. Negative
    /// signals are treated as zero, so the result is always within
    /// `[base_price, max_price]` for a validated config.
    ///
    /// ## Example
    /// ```rust
    /// use fodi_core::pricing::{MarketSignals, PricingConfig};
    ///
    /// let quote = PricingConfig::default().compute(&MarketSignals::default());
    /// assert_eq!(quote.price.cents(), 1900);
    /// assert_eq!(quote.multiplier_bps, 10_000);
    /// ```
    pub fn compute(&self, signals: &MarketSignals) -> PriceQuote {
        let b = BPS_DENOMINATOR as i128;
        let ss = self.supply_step.max(1) as i128;
        let is = self.investment_step_cents.max(1) as i128;
        let ts = self.transaction_step.max(1) as i128;

        let supply = signals.supply.max(0) as i128;
        let investors = signals.investor_count.max(0) as i128;
        let invested = signals.total_invested_cents.max(0) as i128;
        let transactions = signals.transaction_count.max(0) as i128;

        // multiplier = num / den
        let den = mul_all(&[b, ss, is, ts]);
        let num = [
            mul_all(&[supply, self.supply_weight_bps as i128, is, ts]),
            mul_all(&[investors, self.investor_weight_bps as i128, ss, is, ts]),
            mul_all(&[invested, self.investment_weight_bps as i128, ss, ts]),
            mul_all(&[transactions, self.transaction_weight_bps as i128, ss, is]),
        ]
        .into_iter()
        .fold(den, i128::saturating_add);

        let cap_num = den.saturating_mul(self.max_multiplier as i128);
        let base = self.base_price_cents as i128;

        if num >= cap_num {
            return PriceQuote {
                price: self.max_price(),
                multiplier_bps: self.max_multiplier * BPS_DENOMINATOR,
                capped: true,
            };
        }

        // Half-up: floor((2·base·num + den) / (2·den))
        let cents = (2 * base * num + den) / (2 * den);

        PriceQuote {
            price: Money::from_cents(cents as i64),
            multiplier_bps: (num * b / den) as i64,
            capped: false,
        }
    }
}

fn mul_all(factors: &[i128]) -> i128 {
    factors.iter().fold(1i128, |acc, f| acc.saturating_mul(*f))
}

fn check_range(field: &str, value: i64, min: i64, max: i64) -> Result<(), ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min,
            max,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(supply: i64, investors: i64, invested: i64, transactions: i64) -> MarketSignals {
        MarketSignals {
            supply,
            investor_count: investors,
            total_invested_cents: invested,
            transaction_count: transactions,
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(PricingConfig::default().validate().is_ok());
    }

    #[test]
    fn test_no_activity_is_base_price() {
        let quote = PricingConfig::default().compute(&signals(0, 0, 0, 0));
        assert_eq!(quote.price.cents(), 1900);
        assert!(!quote.capped);
    }

    #[test]
    fn test_first_subscriber_scenario() {
        // 100 tokens, one investor buys 10 at $19.00
        let quote = PricingConfig::default().compute(&signals(90, 1, 19_000, 1));
        assert_eq!(quote.multiplier_bps, 14_910);
        assert_eq!(quote.price.cents(), 2833);
    }

    #[test]
    fn test_transaction_steps_are_fractional() {
        // 7/5 × 0.01 = 0.014 → 19.266 → 19.27
        let quote = PricingConfig::default().compute(&signals(0, 0, 0, 7));
        assert_eq!(quote.price.cents(), 1927);
    }

    #[test]
    fn test_rounds_half_up() {
        // 1 token: 19.00 × 1.005 = 19.095 → 19.10
        let quote = PricingConfig::default().compute(&signals(1, 0, 0, 0));
        assert_eq!(quote.price.cents(), 1910);
    }

    #[test]
    fn test_price_is_capped() {
        let quote = PricingConfig::default().compute(&signals(10_000, 0, 0, 0));
        assert!(quote.capped);
        assert_eq!(quote.price.cents(), 19_000);
        assert_eq!(quote.multiplier_bps, 100_000);

        let quote = PricingConfig::default().compute(&signals(i64::MAX, i64::MAX, i64::MAX, i64::MAX));
        assert_eq!(quote.price.cents(), 19_000);
    }

    #[test]
    fn test_negative_signals_count_as_zero() {
        let quote = PricingConfig::default().compute(&signals(-50, -1, -10_000, -3));
        assert_eq!(quote.price.cents(), 1900);
    }

    #[test]
    fn test_price_stays_within_bounds() {
        let config = PricingConfig::default();
        for supply in [0, 1, 9, 10, 55, 100, 1_000, 1_000_000] {
            for investors in [0, 1, 7, 300] {
                for invested in [0, 1, 9_999, 10_000, 5_000_000] {
                    for transactions in [0, 1, 4, 5, 123] {
                        let s = signals(supply, investors, invested, transactions);
                        let price = config.compute(&s).price;
                        assert!(price >= config.base_price(), "{s:?} → {price}");
                        assert!(price <= config.max_price(), "{s:?} → {price}");
                        assert_eq!(price, config.compute(&s).price);
                    }
                }
            }
        }
    }

    #[test]
    fn test_custom_weights() {
        let config = PricingConfig {
            supply_weight_bps: 0,
            investor_weight_bps: 10_000,
            ..PricingConfig::default()
        };
        // 1 + 2 investors × 1.0 = 3×
        let quote = config.compute(&signals(500, 2, 0, 0));
        assert_eq!(quote.price.cents(), 5700);
    }

    #[test]
    fn test_validate_rejects_bad_coefficients() {
        let bad_step = PricingConfig {
            supply_step: 0,
            ..PricingConfig::default()
        };
        assert!(bad_step.validate().is_err());

        let bad_weight = PricingConfig {
            investor_weight_bps: -1,
            ..PricingConfig::default()
        };
        assert!(bad_weight.validate().is_err());

        let bad_cap = PricingConfig {
            max_multiplier: 0,
            ..PricingConfig::default()
        };
        assert!(bad_cap.validate().is_err());
    }
}
