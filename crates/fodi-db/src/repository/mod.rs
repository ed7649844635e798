//! # Repository Module
//!
//! Database repository implementations for the ledger store.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Two Ways Into The Same SQL                           │
//! │                                                                         │
//! │  Read path (pool)                   Write path (one unit)              │
//! │  ─────────────────                  ─────────────────────              │
//! │  db.tokens()                        db.with_transaction(|tx| ..)       │
//! │    .get_by_business(id)               tx.token_for_business(id)        │
//! │       │                               tx.update_token_state(..)        │
//! │       │                                  │                              │
//! │       └──────────────┬───────────────────┘                              │
//! │                      ▼                                                  │
//! │        fn fetch_*(conn: &mut SqliteConnection, ..)                     │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │                SQLite Database                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`BusinessRepository`](business::BusinessRepository) - Business registry
//! - [`TokenRepository`](token::TokenRepository) - Token reads and writes
//! - [`SubscriptionRepository`](subscription::SubscriptionRepository) - Investor positions
//! - [`TransactionRepository`](transaction::TransactionRepository) - Ledger log and analytics
//!
//! Queries are built at runtime with `sqlx::query_as` + `FromRow` rows from
//! fodi-core, so the crate builds without a live database or offline data.

pub mod business;
pub mod signals;
pub mod subscription;
pub mod token;
pub mod transaction;

use chrono::{DateTime, SubsecRound, Utc};

/// Current time truncated to microseconds, the precision stored in the ledger.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// New UUID v4 identifier.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
