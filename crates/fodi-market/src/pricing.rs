//! # Pricing Engine
//!
//! `price = compute_price(business_id, supply)`.
//!
//! ```text
//! LedgerTx ──► market_signals(business_id, supply)   (sees pending writes)
//!                      │
//!                      ▼
//!          PricingConfig::compute(&signals)          (pure, fodi-core)
//!                      │
//!                      ▼
//!                 PriceQuote
//! ```
//!
//! Stateless apart from its coefficients, and `Copy`, so it can be moved
//! into transaction closures.

use tracing::debug;

use crate::error::MarketResult;
use fodi_core::{PriceQuote, PricingConfig};
use fodi_db::LedgerTx;

#[derive(Debug, Clone, Copy, Default)]
pub struct PricingEngine {
    config: PricingConfig,
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Self {
        PricingEngine { config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Prices a business token at `supply` from the signals visible in `tx`.
    ///
    /// Unknown businesses price at the base price; storage errors propagate.
    pub async fn compute_price(
        &self,
        tx: &mut LedgerTx,
        business_id: &str,
        supply: i64,
    ) -> MarketResult<PriceQuote> {
        let signals = tx.market_signals(business_id, supply).await?;
        let quote = self.config.compute(&signals);

        debug!(
            business_id = %business_id,
            supply = signals.supply,
            investors = signals.investor_count,
            invested_cents = signals.total_invested_cents,
            transactions = signals.transaction_count,
            multiplier_bps = quote.multiplier_bps,
            capped = quote.capped,
            price = %quote.price,
            "Token price computed"
        );

        Ok(quote)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
