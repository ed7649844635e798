//! # fodi-db: Ledger Store for Fodi Market
//!
//! This crate exclusively owns persisted market state: businesses, tokens,
//! investor positions and the append-only transaction log. It uses SQLite
//! with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Fodi Market Data Flow                            │
//! │                                                                         │
//! │  fodi-market (TokenService / SubscriptionService)                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     fodi-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ BusinessRepo  │    │ 001_init.sql │  │   │
//! │  │   │ SqlitePool    │◄───│ TokenRepo     │    │              │  │   │
//! │  │   │ with_trans-   │    │ Subscription  │    │              │  │   │
//! │  │   │   action()    │    │ Transaction   │    │              │  │   │
//! │  │   └───────┬───────┘    └───────────────┘    └──────────────┘  │   │
//! │  │           │                                                     │   │
//! │  │           ▼                                                     │   │
//! │  │   LedgerTx (unit_of_work.rs) ← one atomic unit per operation   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (WAL)                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation, configuration, `with_transaction`
//! - [`unit_of_work`] - The `LedgerTx` handed to transaction closures
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fodi_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("market.db")).await?;
//!
//! // Reads
//! let token = db.tokens().get_by_business(&business_id).await?;
//!
//! // Writes, atomically
//! db.with_transaction(move |tx| Box::pin(async move {
//!     let token = tx.token_for_business(&business_id).await?;
//!     // ...
//!     Ok::<_, DbError>(token)
//! })).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod unit_of_work;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use unit_of_work::LedgerTx;

// Repository re-exports for convenience
pub use repository::business::{BusinessRepository, BusinessUpdate, NewBusiness};
pub use repository::{new_id, now};
pub use repository::subscription::SubscriptionRepository;
pub use repository::token::TokenRepository;
pub use repository::transaction::{TransactionFilter, TransactionRepository};
