//! # Market Signals
//!
//! Aggregate demand reads feeding the price formula.
//!
//! Inside a unit these see the unit's own pending writes, so a subscribe
//! prices the token with the new investor and the new buy already counted.

use sqlx::{FromRow, SqliteConnection};

use crate::error::DbResult;
use crate::unit_of_work::LedgerTx;
use fodi_core::MarketSignals;

#[derive(Debug, FromRow)]
struct Aggregates {
    investor_count: i64,
    total_invested_cents: i64,
    transaction_count: i64,
}

impl LedgerTx {
    /// Reads the demand signals of a business for the given supply.
    ///
    /// Unknown businesses yield zero aggregates.
    pub async fn market_signals(&mut self, business_id: &str, supply: i64) -> DbResult<MarketSignals> {
        load_signals(self.conn(), business_id, supply).await
    }
}

pub(crate) async fn load_signals(
    conn: &mut SqliteConnection,
    business_id: &str,
    supply: i64,
) -> DbResult<MarketSignals> {
    let agg = sqlx::query_as::<_, Aggregates>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM business_subscriptions WHERE business_id = ?1) AS investor_count,
            (SELECT COALESCE(SUM(invested_cents), 0) FROM business_subscriptions WHERE business_id = ?1)
                AS total_invested_cents,
            (SELECT COUNT(*) FROM transactions WHERE business_id = ?1) AS transaction_count
        "#,
    )
    .bind(business_id)
    .fetch_one(conn)
    .await?;

    Ok(MarketSignals {
        supply,
        investor_count: agg.investor_count,
        total_invested_cents: agg.total_invested_cents,
        transaction_count: agg.transaction_count,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_unknown_business_has_zero_signals() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let signals = db
            .with_transaction(|tx| Box::pin(async move { tx.market_signals("nobody", 42).await }))
            .await
            .unwrap();

        assert_eq!(signals.supply, 42);
        assert_eq!(signals.investor_count, 0);
        assert_eq!(signals.total_invested_cents, 0);
        assert_eq!(signals.transaction_count, 0);
    }
}
