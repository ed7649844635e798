//! # fodi-market: Token Pricing and Subscription Engine
//!
//! Every market operation (issuing, minting, burning, repricing, buying in,
//! selling out) runs here as one atomic unit on the ledger store.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Market (facade)                                │
//! │                                                                         │
//! │  ┌────────────────┐  ┌─────────────────────┐  ┌────────────────────┐   │
//! │  │ BusinessService│  │ SubscriptionService │  │  AnalyticsService  │   │
//! │  │                │  │                     │  │                    │   │
//! │  │ create ──────┐ │  │ subscribe           │  │ ledger listings    │   │
//! │  │ list / get   │ │  │ unsubscribe         │  │ buy/sell stats     │   │
//! │  │ deactivate   │ │  │ positions           │  │ daily stats        │   │
//! │  └──────────────┼─┘  └──────────┬──────────┘  └────────────────────┘   │
//! │                 ▼               │                                       │
//! │  ┌────────────────────────┐     │                                       │
//! │  │      TokenService      │     │                                       │
//! │  │ mint_initial, create,  │     │                                       │
//! │  │ mint, burn, recalc     │     │                                       │
//! │  └───────────┬────────────┘     │                                       │
//! │              └───────┬──────────┘                                       │
//! │                      ▼                                                  │
//! │   Database::with_transaction ── LedgerTx ── PricingEngine              │
//! │                      │                                                  │
//! │                      ▼ (after commit)                                   │
//! │             EventPublisher::publish(MarketEvent)                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`token_service`] - Token lifecycle
//! - [`subscription_service`] - Investor positions
//! - [`analytics`] - Ledger reads
//! - [`registry`] - Businesses
//! - [`pricing`] - Price computation inside a unit
//! - [`events`] - Post-commit notifications
//! - [`error`] - Engine error taxonomy
//!
//! ## Usage
//!
//! ```rust,ignore
//! let market = Market::new(db, PricingConfig::default(), Arc::new(NoopPublisher));
//!
//! let receipt = market.subscriptions().subscribe("alice", &business_id, 10).await?;
//! println!("{} now costs {}", receipt.token.symbol, receipt.token.price());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod analytics;
pub mod error;
pub mod events;
pub mod pricing;
pub mod registry;
pub mod subscription_service;
pub mod token_service;

#[cfg(test)]
mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use analytics::{AnalyticsService, LedgerQuery};
pub use error::{MarketError, MarketResult};
pub use events::{EventPublisher, NoopPublisher};
pub use pricing::PricingEngine;
pub use registry::{BusinessCreated, BusinessService};
pub use subscription_service::{SubscriptionReceipt, SubscriptionService};
pub use token_service::TokenService;

use std::sync::Arc;

use fodi_core::PricingConfig;
use fodi_db::Database;

// =============================================================================
// Market
// =============================================================================

/// All engine services over one database and one event sink.
///
/// Cheap to clone; share one per process.
#[derive(Clone)]
pub struct Market {
    db: Database,
    tokens: TokenService,
    subscriptions: SubscriptionService,
    analytics: AnalyticsService,
    businesses: BusinessService,
}

impl Market {
    pub fn new(db: Database, pricing: PricingConfig, events: Arc<dyn EventPublisher>) -> Self {
        let engine = PricingEngine::new(pricing);
        let tokens = TokenService::new(db.clone(), engine, events.clone());

        Market {
            subscriptions: SubscriptionService::new(db.clone(), engine, events),
            analytics: AnalyticsService::new(db.clone(), engine.config().base_price_cents),
            businesses: BusinessService::new(db.clone(), tokens.clone()),
            tokens,
            db,
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn subscriptions(&self) -> &SubscriptionService {
        &self.subscriptions
    }

    pub fn analytics(&self) -> &AnalyticsService {
        &self.analytics
    }

    pub fn businesses(&self) -> &BusinessService {
        &self.businesses
    }
}
