//! # Transaction Analytics
//!
//! Read-only queries over the append-only ledger.

use chrono::Duration;
use serde::Deserialize;
use tracing::debug;

use crate::error::{MarketError, MarketResult};
use fodi_core::validation::normalize_limit;
use fodi_core::{
    BusinessMetrics, BusinessSubscribers, BusinessTransactionStats, DailyStats, TokenTransaction, TxType,
    UserTransactionStats,
};
use fodi_db::{now, Database, TransactionFilter};

/// Days covered by [`AnalyticsService::daily_stats`] when none are given.
pub const DEFAULT_ANALYTICS_DAYS: i64 = 30;

/// Longest window accepted by [`AnalyticsService::daily_stats`].
pub const MAX_ANALYTICS_DAYS: i64 = 365;

/// Caller-facing listing options, as they arrive from a query string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerQuery {
    #[serde(rename = "type")]
    pub tx_type: Option<TxType>,
    pub business_id: Option<String>,
    pub limit: Option<i64>,
}

impl LedgerQuery {
    fn into_filter(self) -> TransactionFilter {
        TransactionFilter {
            tx_type: self.tx_type,
            business_id: self.business_id,
            limit: normalize_limit(self.limit),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalyticsService {
    db: Database,
    /// Price a token starts at; the reference for price change.
    initial_price_cents: i64,
}

impl AnalyticsService {
    pub fn new(db: Database, initial_price_cents: i64) -> Self {
        AnalyticsService {
            db,
            initial_price_cents,
        }
    }

    pub async fn business_transactions(
        &self,
        business_id: &str,
        query: LedgerQuery,
    ) -> MarketResult<Vec<TokenTransaction>> {
        Ok(self
            .db
            .transactions()
            .list_for_business(business_id, &query.into_filter())
            .await?)
    }

    /// Rows where the user is buyer or seller.
    pub async fn user_transactions(&self, user_id: &str, query: LedgerQuery) -> MarketResult<Vec<TokenTransaction>> {
        Ok(self
            .db
            .transactions()
            .list_for_user(user_id, &query.into_filter())
            .await?)
    }

    pub async fn business_stats(&self, business_id: &str) -> MarketResult<BusinessTransactionStats> {
        Ok(self.db.transactions().business_stats(business_id).await?)
    }

    pub async fn user_stats(&self, user_id: &str) -> MarketResult<UserTransactionStats> {
        Ok(self.db.transactions().user_stats(user_id).await?)
    }

    /// Per-day buy/sell figures for the last `days` days, newest day first.
    ///
    /// `days` defaults to 30 and is clamped to `1..=365`.
    pub async fn daily_stats(&self, business_id: &str, days: Option<i64>) -> MarketResult<Vec<DailyStats>> {
        let days = days
            .unwrap_or(DEFAULT_ANALYTICS_DAYS)
            .clamp(1, MAX_ANALYTICS_DAYS);
        let since = now() - Duration::days(days);

        Ok(self.db.transactions().daily_stats(business_id, since).await?)
    }

    /// Market, investment and activity figures for a business token.
    ///
    /// `NotFound` when the business has no token.
    pub async fn business_metrics(&self, business_id: &str) -> MarketResult<BusinessMetrics> {
        let token = self
            .db
            .tokens()
            .get_by_business(business_id)
            .await?
            .ok_or_else(|| MarketError::not_found("Token", business_id))?;

        let positions = self.db.subscriptions().list_for_business(business_id).await?;
        let holders = BusinessSubscribers::from_rows(business_id, positions);
        let ledger = self.db.transactions().business_stats(business_id).await?;

        let at = now();
        let active = self
            .db
            .transactions()
            .active_users(business_id, at - Duration::hours(24), at - Duration::days(7))
            .await?;

        let metrics = BusinessMetrics::evaluate(&token, self.initial_price_cents, &holders, &ledger, active);
        debug!(
            business_id = %business_id,
            price_cents = metrics.current_price_cents,
            investors = metrics.total_investors,
            roi_percent = metrics.roi_percent,
            "Computed business metrics"
        );
        Ok(metrics)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{create_business, setup};

    #[tokio::test]
    async fn test_ledger_reads() {
        let (market, _) = setup().await;
        let business = create_business(&market, "Pasta Place").await;
        market.tokens().create_token(&business.id, "PAST", 0, 100).await.unwrap();

        market.subscriptions().subscribe("alice", &business.id, 10).await.unwrap();
        market.subscriptions().subscribe("bob", &business.id, 5).await.unwrap();
        market.subscriptions().unsubscribe("alice", &business.id).await.unwrap();

        let analytics = market.analytics();

        let all = analytics
            .business_transactions(&business.id, LedgerQuery::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].tx_type, TxType::Sell);

        let buys = analytics
            .business_transactions(
                &business.id,
                LedgerQuery {
                    tx_type: Some(TxType::Buy),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(buys.len(), 2);

        let limited = analytics
            .business_transactions(
                &business.id,
                LedgerQuery {
                    limit: Some(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);

        let alice = analytics.user_transactions("alice", LedgerQuery::default()).await.unwrap();
        assert_eq!(alice.len(), 2);

        let stats = analytics.business_stats(&business.id).await.unwrap();
        assert_eq!(stats.total_transactions, 3);
        assert_eq!(stats.buy_count, 2);
        assert_eq!(stats.sell_count, 1);
        assert_eq!(stats.tokens_bought, 15);
        assert_eq!(stats.tokens_sold, 10);
        assert_eq!(stats.net_tokens, 5);
        assert_eq!(stats.net_amount_cents, stats.total_buy_cents - stats.total_sell_cents);

        let user = analytics.user_stats("alice").await.unwrap();
        assert_eq!(user.tokens_bought, 10);
        assert_eq!(user.tokens_sold, 10);
        assert_eq!(user.total_invested_cents, 19_000);
        assert_eq!(user.net_profit_cents, user.total_returned_cents - 19_000);
        assert_eq!(user.net_tokens, 0);
    }

    #[tokio::test]
    async fn test_daily_stats_window() {
        let (market, _) = setup().await;
        let business = create_business(&market, "Soup Kitchen").await;
        market.tokens().create_token(&business.id, "SOUT", 0, 100).await.unwrap();
        market.subscriptions().subscribe("alice", &business.id, 4).await.unwrap();

        let days = market.analytics().daily_stats(&business.id, None).await.unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].buy_count, 1);
        assert_eq!(days[0].tokens_bought, 4);
        assert_eq!(days[0].buy_amount_cents, 4 * 1900);

        // Out-of-range windows are clamped, not rejected
        let days = market.analytics().daily_stats(&business.id, Some(-10)).await.unwrap();
        assert_eq!(days.len(), 1);

        let none = market.analytics().daily_stats("missing", Some(7)).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_business_metrics() {
        let (market, _) = setup().await;
        let business = create_business(&market, "Dumpling House").await;
        market.tokens().create_token(&business.id, "DUMT", 0, 100).await.unwrap();

        market.subscriptions().subscribe("alice", &business.id, 10).await.unwrap();
        market.subscriptions().subscribe("bob", &business.id, 5).await.unwrap();
        market.subscriptions().unsubscribe("bob", &business.id).await.unwrap();

        let token = market.tokens().get_business_token(&business.id).await.unwrap();
        let m = market.analytics().business_metrics(&business.id).await.unwrap();

        assert_eq!(m.token_symbol, "DUMT");
        assert_eq!(m.initial_price_cents, 1900);
        assert_eq!(m.current_price_cents, token.price_cents);
        assert_eq!(m.total_supply, 90);
        assert_eq!(m.tokens_held, 10);
        assert_eq!(m.total_investors, 1);
        assert_eq!(m.total_invested_cents, 19_000);
        assert_eq!(m.holdings_value_cents, 10 * token.price_cents);
        assert_eq!(m.market_cap_cents, 90 * token.price_cents);
        assert_eq!(m.buy_count, 2);
        assert_eq!(m.sell_count, 1);
        assert_eq!(m.net_inflow_cents, m.buy_volume_cents - m.sell_volume_cents);
        assert_eq!(m.daily_active_users, 2);
        assert_eq!(m.weekly_active_users, 2);
        assert!(m.price_change_percent > 0.0);

        let err = market.analytics().business_metrics("missing").await.unwrap_err();
        assert!(matches!(err, MarketError::NotFound { .. }));
    }
}
