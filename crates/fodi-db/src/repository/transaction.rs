//! # Transaction Repository
//!
//! The append-only token ledger and the analytics read from it.
//!
//! ## Append-Only
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  INSERT INTO transactions ...   ✅                                       │
//! │  UPDATE transactions ...        ❌ trigger: RAISE(ABORT)                │
//! │  DELETE FROM transactions ...   ❌ trigger: RAISE(ABORT)                │
//! │                                                                         │
//! │  The log is the only source of historical analytics; positions and    │
//! │  supply are current state, the log is what happened.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::unit_of_work::LedgerTx;
use fodi_core::validation::DEFAULT_LIMIT;
use fodi_core::{
    ActiveUsers, BusinessTransactionStats, DailyStats, TokenTransaction, TxType, UserTransactionStats,
};

const SELECT_TRANSACTION: &str = r#"
    SELECT id, business_id, from_user, to_user, tokens, amount_cents, tx_type, created_at
    FROM transactions
"#;

/// Optional narrowing for ledger listings.
#[derive(Debug, Clone)]
pub struct TransactionFilter {
    pub tx_type: Option<TxType>,
    /// Only applied to per-user listings.
    pub business_id: Option<String>,
    pub limit: i64,
}

impl Default for TransactionFilter {
    fn default() -> Self {
        TransactionFilter {
            tx_type: None,
            business_id: None,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Repository for ledger reads and analytics.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Transactions of a business, newest first.
    pub async fn list_for_business(
        &self,
        business_id: &str,
        filter: &TransactionFilter,
    ) -> DbResult<Vec<TokenTransaction>> {
        let mut qb = QueryBuilder::<Sqlite>::new(SELECT_TRANSACTION);
        qb.push(" WHERE business_id = ").push_bind(business_id);
        push_type_filter(&mut qb, filter.tx_type);
        push_order_and_limit(&mut qb, filter.limit);

        let txs = qb
            .build_query_as::<TokenTransaction>()
            .fetch_all(&self.pool)
            .await?;

        debug!(business_id = %business_id, count = txs.len(), "Listed business transactions");
        Ok(txs)
    }

    /// Transactions where the user is either party, newest first.
    pub async fn list_for_user(
        &self,
        user_id: &str,
        filter: &TransactionFilter,
    ) -> DbResult<Vec<TokenTransaction>> {
        let mut qb = QueryBuilder::<Sqlite>::new(SELECT_TRANSACTION);
        qb.push(" WHERE (from_user = ")
            .push_bind(user_id)
            .push(" OR to_user = ")
            .push_bind(user_id)
            .push(")");
        if let Some(business_id) = &filter.business_id {
            qb.push(" AND business_id = ").push_bind(business_id);
        }
        push_type_filter(&mut qb, filter.tx_type);
        push_order_and_limit(&mut qb, filter.limit);

        let txs = qb
            .build_query_as::<TokenTransaction>()
            .fetch_all(&self.pool)
            .await?;

        debug!(user_id = %user_id, count = txs.len(), "Listed user transactions");
        Ok(txs)
    }

    /// Buy/sell totals of a business.
    pub async fn business_stats(&self, business_id: &str) -> DbResult<BusinessTransactionStats> {
        let stats = sqlx::query_as::<_, BusinessTransactionStats>(
            r#"
            SELECT
                COUNT(*) AS total_transactions,
                COALESCE(SUM(CASE WHEN tx_type = 'buy' THEN 1 ELSE 0 END), 0) AS buy_count,
                COALESCE(SUM(CASE WHEN tx_type = 'sell' THEN 1 ELSE 0 END), 0) AS sell_count,
                COALESCE(SUM(CASE WHEN tx_type = 'buy' THEN amount_cents ELSE 0 END), 0) AS total_buy_cents,
                COALESCE(SUM(CASE WHEN tx_type = 'sell' THEN amount_cents ELSE 0 END), 0) AS total_sell_cents,
                COALESCE(SUM(CASE WHEN tx_type = 'buy' THEN tokens ELSE 0 END), 0) AS tokens_bought,
                COALESCE(SUM(CASE WHEN tx_type = 'sell' THEN tokens ELSE 0 END), 0) AS tokens_sold,
                COALESCE(SUM(CASE WHEN tx_type = 'buy' THEN amount_cents
                                  WHEN tx_type = 'sell' THEN -amount_cents
                                  ELSE 0 END), 0) AS net_amount_cents,
                COALESCE(SUM(CASE WHEN tx_type = 'buy' THEN tokens
                                  WHEN tx_type = 'sell' THEN -tokens
                                  ELSE 0 END), 0) AS net_tokens
            FROM transactions
            WHERE business_id = ?1
            "#,
        )
        .bind(business_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }

    /// Buy/sell totals of a user across all businesses.
    ///
    /// A user buys as `from_user` of a `buy` and is paid as `to_user` of a
    /// `sell`.
    pub async fn user_stats(&self, user_id: &str) -> DbResult<UserTransactionStats> {
        let stats = sqlx::query_as::<_, UserTransactionStats>(
            r#"
            SELECT
                COUNT(*) AS total_transactions,
                COALESCE(SUM(CASE WHEN tx_type = 'buy' AND from_user = ?1 THEN tokens ELSE 0 END), 0)
                    AS tokens_bought,
                COALESCE(SUM(CASE WHEN tx_type = 'sell' AND to_user = ?1 THEN tokens ELSE 0 END), 0)
                    AS tokens_sold,
                COALESCE(SUM(CASE WHEN tx_type = 'buy' AND from_user = ?1 THEN amount_cents ELSE 0 END), 0)
                    AS total_invested_cents,
                COALESCE(SUM(CASE WHEN tx_type = 'sell' AND to_user = ?1 THEN amount_cents ELSE 0 END), 0)
                    AS total_returned_cents,
                COALESCE(SUM(CASE WHEN tx_type = 'sell' AND to_user = ?1 THEN amount_cents
                                  WHEN tx_type = 'buy' AND from_user = ?1 THEN -amount_cents
                                  ELSE 0 END), 0) AS net_profit_cents,
                COALESCE(SUM(CASE WHEN tx_type = 'buy' AND from_user = ?1 THEN tokens
                                  WHEN tx_type = 'sell' AND to_user = ?1 THEN -tokens
                                  ELSE 0 END), 0) AS net_tokens
            FROM transactions
            WHERE from_user = ?1 OR to_user = ?1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }

    /// Per-day buy/sell activity since `since`, newest day first.
    ///
    /// Days are UTC calendar days (`YYYY-MM-DD`); days without activity are
    /// absent.
    pub async fn daily_stats(&self, business_id: &str, since: DateTime<Utc>) -> DbResult<Vec<DailyStats>> {
        let days = sqlx::query_as::<_, DailyStats>(
            r#"
            SELECT
                substr(created_at, 1, 10) AS day,
                COALESCE(SUM(CASE WHEN tx_type = 'buy' THEN 1 ELSE 0 END), 0) AS buy_count,
                COALESCE(SUM(CASE WHEN tx_type = 'sell' THEN 1 ELSE 0 END), 0) AS sell_count,
                COALESCE(SUM(CASE WHEN tx_type = 'buy' THEN amount_cents ELSE 0 END), 0) AS buy_amount_cents,
                COALESCE(SUM(CASE WHEN tx_type = 'sell' THEN amount_cents ELSE 0 END), 0) AS sell_amount_cents,
                COALESCE(SUM(CASE WHEN tx_type = 'buy' THEN tokens ELSE 0 END), 0) AS tokens_bought,
                COALESCE(SUM(CASE WHEN tx_type = 'sell' THEN tokens ELSE 0 END), 0) AS tokens_sold
            FROM transactions
            WHERE business_id = ?1 AND created_at >= ?2
            GROUP BY day
            ORDER BY day DESC
            "#,
        )
        .bind(business_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        debug!(business_id = %business_id, days = days.len(), "Computed daily stats");
        Ok(days)
    }

    /// Distinct investors with a buy or sell since `day_since` / `week_since`.
    pub async fn active_users(
        &self,
        business_id: &str,
        day_since: DateTime<Utc>,
        week_since: DateTime<Utc>,
    ) -> DbResult<ActiveUsers> {
        let active = sqlx::query_as::<_, ActiveUsers>(
            r#"
            SELECT
                COUNT(DISTINCT CASE WHEN created_at >= ?2 THEN investor END) AS daily,
                COUNT(DISTINCT investor) AS weekly
            FROM (
                SELECT
                    CASE WHEN tx_type = 'sell' THEN to_user ELSE from_user END AS investor,
                    created_at
                FROM transactions
                WHERE business_id = ?1
                  AND tx_type IN ('buy', 'sell')
                  AND created_at >= ?3
            )
            "#,
        )
        .bind(business_id)
        .bind(day_since)
        .bind(week_since)
        .fetch_one(&self.pool)
        .await?;

        Ok(active)
    }
}

// =============================================================================
// Ledger operations
// =============================================================================

impl LedgerTx {
    /// Appends an entry to the ledger.
    pub async fn insert_transaction(&mut self, tx: &TokenTransaction) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, business_id, from_user, to_user, tokens, amount_cents, tx_type, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&tx.id)
        .bind(&tx.business_id)
        .bind(&tx.from_user)
        .bind(&tx.to_user)
        .bind(tx.tokens)
        .bind(tx.amount_cents)
        .bind(tx.tx_type)
        .bind(tx.created_at)
        .execute(self.conn())
        .await?;

        debug!(
            transaction_id = %tx.id,
            tx_type = %tx.tx_type,
            tokens = tx.tokens,
            amount_cents = tx.amount_cents,
            "Transaction appended"
        );
        Ok(())
    }
}

fn push_type_filter(qb: &mut QueryBuilder<'_, Sqlite>, tx_type: Option<TxType>) {
    if let Some(tx_type) = tx_type {
        qb.push(" AND tx_type = ").push_bind(tx_type.as_str());
    }
}

fn push_order_and_limit(qb: &mut QueryBuilder<'_, Sqlite>, limit: i64) {
    qb.push(" ORDER BY created_at DESC, rowid DESC LIMIT ")
        .push_bind(limit);
}

// =============================================================================
// Unit Tests
// =============================================================================
