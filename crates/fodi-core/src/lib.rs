//! # fodi-core: Pure Business Logic for Fodi Market
//!
//! This crate holds the rules of the token market as pure functions with
//! zero I/O dependencies: what a token costs, how supply moves, and which
//! inputs are acceptable.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Fodi Market Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  fodi-api (axum REST + WebSocket)               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        fodi-market (TokenService, SubscriptionService)          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ fodi-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  pricing  │  │ validation│  │   │
//! │  │   │  Token    │  │   Money   │  │  Config   │  │   rules   │  │   │
//! │  │   │  Position │  │           │  │  Quote    │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    fodi-db (Ledger Store)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Business, BusinessToken, subscriptions, ledger rows)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - Demand-driven token price formula
//! - [`token`] - Symbol derivation and supply arithmetic
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use fodi_core::pricing::{MarketSignals, PricingConfig};
//!
//! let config = PricingConfig::default();
//! let quote = config.compute(&MarketSignals {
//!     supply: 90,
//!     investor_count: 1,
//!     total_invested_cents: 19_000,
//!     transaction_count: 1,
//! });
//!
//! // 19.00 × 1.491 = 28.329 → 28.33
//! assert_eq!(quote.price.cents(), 2833);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod pricing;
pub mod token;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use fodi_core::Money` instead of
// `use fodi_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::{MarketSignals, PriceQuote, PricingConfig};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Supply of a freshly minted business token.
pub const INITIAL_SUPPLY: i64 = 1;

/// Maximum length of a token symbol.
pub const MAX_SYMBOL_LEN: usize = 16;

/// Maximum length of a business name.
pub const MAX_BUSINESS_NAME_LEN: usize = 200;
