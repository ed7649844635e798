//! # Domain Types
//!
//! Core domain types used throughout Fodi Market.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐ 1   0..1 ┌─────────────────┐                      │
//! │  │    Business     │─────────►│  BusinessToken  │                      │
//! │  │  ─────────────  │          │  ─────────────  │                      │
//! │  │  id (UUID)      │          │  symbol         │                      │
//! │  │  owner_id       │          │  total_supply   │                      │
//! │  │  name           │          │  price_cents    │                      │
//! │  └───────┬─────────┘          └─────────────────┘                      │
//! │          │ 1                                                            │
//! │          ├──────────────► * BusinessSubscription (user position)       │
//! │          │                  tokens_owned, invested_cents               │
//! │          │                                                              │
//! │          └──────────────► * TokenTransaction (append-only log)         │
//! │                             buy | sell | burn | transfer               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Identifiers are UUID v4 strings. Monetary fields are `*_cents: i64` with a
//! `Money` accessor next to them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Business
// =============================================================================

/// A restaurant or shop that can issue a token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Business {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// User who owns the business; counterparty of every buy and sell.
    pub owner_id: String,

    /// Display name. The token symbol is derived from it.
    pub name: String,

    pub description: Option<String>,
    pub category: Option<String>,
    pub city: Option<String>,

    /// Whether the business is active (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Business Token
// =============================================================================

/// The synthetic token of a business. At most one per business.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct BusinessToken {
    pub id: String,

    /// Owning business (unique).
    pub business_id: String,

    /// Ticker, e.g. "PIZT".
    pub symbol: String,

    /// Tokens currently in circulation. Never negative.
    pub total_supply: i64,

    /// Current per-token price in cents.
    pub price_cents: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl BusinessToken {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Supply × price. Saturates instead of overflowing.
    pub fn market_cap(&self) -> Money {
        Money::from_cents(self.total_supply.saturating_mul(self.price_cents))
    }
}

// =============================================================================
// Business Subscription
// =============================================================================

/// A user's position in a business token. Unique per (user, business).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct BusinessSubscription {
    pub id: String,
    pub user_id: String,
    pub business_id: String,

    /// Tokens held.
    pub tokens_owned: i64,

    /// Cumulative cost basis in cents. Only ever increases.
    pub invested_cents: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl BusinessSubscription {
    /// Returns the cost basis as Money.
    #[inline]
    pub fn invested(&self) -> Money {
        Money::from_cents(self.invested_cents)
    }

    /// Percentage of `supply` this position represents (display only).
    ///
    /// Returns 0 when supply is 0.
    pub fn share_percent(&self, supply: i64) -> f64 {
        if supply <= 0 {
            return 0.0;
        }
        self.tokens_owned as f64 / supply as f64 * 100.0
    }
}

// =============================================================================
// Transaction Type
// =============================================================================

/// Kind of ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum TxType {
    /// User bought tokens from the business.
    Buy,
    /// User sold tokens back to the business.
    Sell,
    Burn,
    Transfer,
}

impl TxType {
    /// Storage and wire representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            TxType::Buy => "buy",
            TxType::Sell => "sell",
            TxType::Burn => "burn",
            TxType::Transfer => "transfer",
        }
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TxType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(TxType::Buy),
            "sell" => Ok(TxType::Sell),
            "burn" => Ok(TxType::Burn),
            "transfer" => Ok(TxType::Transfer),
            _ => Err(ValidationError::NotAllowed {
                field: "type".to_string(),
                allowed: ["buy", "sell", "burn", "transfer"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            }),
        }
    }
}

// =============================================================================
// Token Transaction
// =============================================================================

/// One entry of the append-only token ledger.
///
/// ```text
/// buy:  from = investor,  to = business owner
/// sell: from = business owner, to = investor
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TokenTransaction {
    pub id: String,
    pub business_id: String,
    pub from_user: String,
    pub to_user: String,
    pub tokens: i64,
    pub amount_cents: i64,
    pub tx_type: TxType,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl TokenTransaction {
    /// Returns the amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Read Models
// =============================================================================

/// Subscribers of one business with totals over exactly those rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BusinessSubscribers {
    pub business_id: String,
    pub subscribers: Vec<BusinessSubscription>,
    pub subscriber_count: i64,
    pub total_invested_cents: i64,
    pub total_tokens_sold: i64,
}

impl BusinessSubscribers {
    /// Builds the read model, summing the given rows.
    pub fn from_rows(business_id: impl Into<String>, subscribers: Vec<BusinessSubscription>) -> Self {
        let total_invested_cents = subscribers
            .iter()
            .map(|s| s.invested_cents)
            .fold(0i64, i64::saturating_add);
        let total_tokens_sold = subscribers
            .iter()
            .map(|s| s.tokens_owned)
            .fold(0i64, i64::saturating_add);

        BusinessSubscribers {
            business_id: business_id.into(),
            subscriber_count: subscribers.len() as i64,
            total_invested_cents,
            total_tokens_sold,
            subscribers,
        }
    }
}

/// A position valued at the current token price.
///
/// The valuation fields are `None` when the business has no token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SubscriptionStats {
    pub subscription: BusinessSubscription,
    pub current_price_cents: Option<i64>,
    pub current_value_cents: Option<i64>,
    pub profit_cents: Option<i64>,
    pub share_percent: Option<f64>,
}

impl SubscriptionStats {
    /// Marks a position to market.
    pub fn evaluate(subscription: BusinessSubscription, token: Option<&BusinessToken>) -> Self {
        match token {
            Some(token) => {
                let value = token.price_cents.saturating_mul(subscription.tokens_owned);
                SubscriptionStats {
                    current_price_cents: Some(token.price_cents),
                    current_value_cents: Some(value),
                    profit_cents: Some(value.saturating_sub(subscription.invested_cents)),
                    share_percent: Some(subscription.share_percent(token.total_supply)),
                    subscription,
                }
            }
            None => SubscriptionStats {
                subscription,
                current_price_cents: None,
                current_value_cents: None,
                profit_cents: None,
                share_percent: None,
            },
        }
    }
}

/// Buy/sell totals of one business.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct BusinessTransactionStats {
    pub total_transactions: i64,
    pub buy_count: i64,
    pub sell_count: i64,
    pub total_buy_cents: i64,
    pub total_sell_cents: i64,
    pub tokens_bought: i64,
    pub tokens_sold: i64,
    /// Buy amount minus sell amount.
    pub net_amount_cents: i64,
    /// Tokens bought minus tokens sold.
    pub net_tokens: i64,
}

/// Buy/sell totals of one user across all businesses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct UserTransactionStats {
    pub total_transactions: i64,
    pub tokens_bought: i64,
    pub tokens_sold: i64,
    pub total_invested_cents: i64,
    pub total_returned_cents: i64,
    /// Returned minus invested.
    pub net_profit_cents: i64,
    /// Bought minus sold.
    pub net_tokens: i64,
}

/// Buy/sell activity of one business on one UTC day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DailyStats {
    /// `YYYY-MM-DD`.
    pub day: String,
    pub buy_count: i64,
    pub sell_count: i64,
    pub buy_amount_cents: i64,
    pub sell_amount_cents: i64,
    pub tokens_bought: i64,
    pub tokens_sold: i64,
}

// =============================================================================
// Business Metrics
// =============================================================================

/// Distinct investors who bought or sold recently.
///
/// The investor of a buy is `from_user`, of a sell `to_user`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ActiveUsers {
    /// Last 24 hours.
    pub daily: i64,
    /// Last 7 days.
    pub weekly: i64,
}

/// Dashboard figures for one business token.
///
/// ```text
/// market_cap      = total_supply × price        (the unsold pool)
/// holdings_value  = tokens_held × price         (what investors own)
/// roi_percent     = holdings_value vs total_invested_cents
/// price_change    = price vs initial_price_cents
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BusinessMetrics {
    pub business_id: String,
    pub token_symbol: String,

    pub current_price_cents: i64,
    /// Price every token starts at.
    pub initial_price_cents: i64,
    pub price_change_percent: f64,

    /// Tokens still in the pool.
    pub total_supply: i64,
    /// Tokens in investors' positions.
    pub tokens_held: i64,
    pub market_cap_cents: i64,

    pub total_investors: i64,
    pub total_invested_cents: i64,
    pub avg_investment_cents: i64,
    pub holdings_value_cents: i64,
    pub roi_percent: f64,

    pub buy_count: i64,
    pub sell_count: i64,
    pub buy_volume_cents: i64,
    pub sell_volume_cents: i64,
    /// Buy volume minus sell volume.
    pub net_inflow_cents: i64,

    pub daily_active_users: i64,
    pub weekly_active_users: i64,
}

impl BusinessMetrics {
    pub fn evaluate(
        token: &BusinessToken,
        initial_price_cents: i64,
        holders: &BusinessSubscribers,
        ledger: &BusinessTransactionStats,
        active: ActiveUsers,
    ) -> Self {
        let holdings_value_cents = token.price_cents.saturating_mul(holders.total_tokens_sold);
        let avg_investment_cents = if holders.subscriber_count > 0 {
            holders.total_invested_cents / holders.subscriber_count
        } else {
            0
        };

        BusinessMetrics {
            business_id: token.business_id.clone(),
            token_symbol: token.symbol.clone(),
            current_price_cents: token.price_cents,
            initial_price_cents,
            price_change_percent: percent_change(initial_price_cents, token.price_cents),
            total_supply: token.total_supply,
            tokens_held: holders.total_tokens_sold,
            market_cap_cents: token.market_cap().cents(),
            total_investors: holders.subscriber_count,
            total_invested_cents: holders.total_invested_cents,
            avg_investment_cents,
            holdings_value_cents,
            roi_percent: percent_change(holders.total_invested_cents, holdings_value_cents),
            buy_count: ledger.buy_count,
            sell_count: ledger.sell_count,
            buy_volume_cents: ledger.total_buy_cents,
            sell_volume_cents: ledger.total_sell_cents,
            net_inflow_cents: ledger.net_amount_cents,
            daily_active_users: active.daily,
            weekly_active_users: active.weekly,
        }
    }
}

/// `(to - from) / from` in percent; 0 when `from` is not positive.
fn percent_change(from: i64, to: i64) -> f64 {
    if from <= 0 {
        return 0.0;
    }
    (to - from) as f64 / from as f64 * 100.0
}

// =============================================================================
// Market Events
// =============================================================================

/// State changes published after a market operation commits.
///
/// Serializes as `{"type": "...", "data": {...}}`, the frame format of the
/// admin notification socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum MarketEvent {
    TokenCreated {
        token: BusinessToken,
    },
    TokensMinted {
        token: BusinessToken,
        amount: i64,
        reason: String,
    },
    TokensBurned {
        token: BusinessToken,
        amount: i64,
        reason: String,
    },
    PriceRecalculated {
        token: BusinessToken,
        previous_price_cents: i64,
    },
    Subscribed {
        subscription: BusinessSubscription,
        transaction: TokenTransaction,
        token: BusinessToken,
    },
    Unsubscribed {
        subscription: BusinessSubscription,
        transaction: TokenTransaction,
        token: BusinessToken,
    },
}

impl MarketEvent {
    /// Wire name of the event (`type` field).
    pub const fn kind(&self) -> &'static str {
        match self {
            MarketEvent::TokenCreated { .. } => "token_created",
            MarketEvent::TokensMinted { .. } => "tokens_minted",
            MarketEvent::TokensBurned { .. } => "tokens_burned",
            MarketEvent::PriceRecalculated { .. } => "price_recalculated",
            MarketEvent::Subscribed { .. } => "subscribed",
            MarketEvent::Unsubscribed { .. } => "unsubscribed",
        }
    }

    /// Business the event belongs to.
    pub fn business_id(&self) -> &str {
        match self {
            MarketEvent::TokenCreated { token }
            | MarketEvent::TokensMinted { token, .. }
            | MarketEvent::TokensBurned { token, .. }
            | MarketEvent::PriceRecalculated { token, .. }
            | MarketEvent::Subscribed { token, .. }
            | MarketEvent::Unsubscribed { token, .. } => &token.business_id,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn token(supply: i64, price_cents: i64) -> BusinessToken {
        let now = Utc::now();
        BusinessToken {
            id: "tok-1".to_string(),
            business_id: "biz-1".to_string(),
            symbol: "PIZT".to_string(),
            total_supply: supply,
            price_cents,
            created_at: now,
            updated_at: now,
        }
    }

    fn position(user: &str, tokens: i64, invested_cents: i64) -> BusinessSubscription {
        let now = Utc::now();
        BusinessSubscription {
            id: format!("sub-{user}"),
            user_id: user.to_string(),
            business_id: "biz-1".to_string(),
            tokens_owned: tokens,
            invested_cents,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_market_cap() {
        assert_eq!(token(90, 2833).market_cap().cents(), 254_970);
        assert_eq!(token(0, 2833).market_cap(), Money::from_cents(0));
    }

    #[test]
    fn test_share_percent() {
        let p = position("a", 10, 19_000);
        assert!((p.share_percent(40) - 25.0).abs() < 1e-9);
        assert_eq!(p.share_percent(0), 0.0);
    }

    #[test]
    fn test_business_metrics() {
        // One buy of 10 at 19.00 moved the price to 28.33
        let holders = BusinessSubscribers::from_rows("biz-1", vec![position("alice", 10, 19_000)]);
        let ledger = BusinessTransactionStats {
            total_transactions: 1,
            buy_count: 1,
            total_buy_cents: 19_000,
            tokens_bought: 10,
            net_amount_cents: 19_000,
            net_tokens: 10,
            ..Default::default()
        };
        let active = ActiveUsers { daily: 1, weekly: 1 };

        let m = BusinessMetrics::evaluate(&token(90, 2833), 1900, &holders, &ledger, active);
        assert_eq!(m.token_symbol, "PIZT");
        assert_eq!(m.tokens_held, 10);
        assert_eq!(m.market_cap_cents, 254_970);
        assert_eq!(m.holdings_value_cents, 28_330);
        assert_eq!(m.avg_investment_cents, 19_000);
        assert_eq!(m.net_inflow_cents, 19_000);
        assert!((m.price_change_percent - 49.105).abs() < 0.01);
        assert!((m.roi_percent - 49.105).abs() < 0.01);
        assert_eq!(m.weekly_active_users, 1);

        // Nothing invested yet
        let empty = BusinessSubscribers::from_rows("biz-1", vec![]);
        let m = BusinessMetrics::evaluate(
            &token(1, 1900),
            1900,
            &empty,
            &BusinessTransactionStats::default(),
            ActiveUsers::default(),
        );
        assert_eq!(m.price_change_percent, 0.0);
        assert_eq!(m.roi_percent, 0.0);
        assert_eq!(m.avg_investment_cents, 0);
    }

    #[test]
    fn test_tx_type_parse() {
        assert_eq!("buy".parse::<TxType>().unwrap(), TxType::Buy);
        assert_eq!("SELL".parse::<TxType>().unwrap(), TxType::Sell);
        assert!("gift".parse::<TxType>().is_err());
        assert_eq!(TxType::Transfer.to_string(), "transfer");
    }

    #[test]
    fn test_tx_type_serde() {
        let json = serde_json::to_string(&TxType::Buy).unwrap();
        assert_eq!(json, "\"buy\"");
    }

    #[test]
    fn test_business_subscribers_totals() {
        let rows = vec![position("a", 10, 19_000), position("b", 5, 14_165)];
        let subs = BusinessSubscribers::from_rows("biz-1", rows);
        assert_eq!(subs.subscriber_count, 2);
        assert_eq!(subs.total_invested_cents, 33_165);
        assert_eq!(subs.total_tokens_sold, 15);

        let empty = BusinessSubscribers::from_rows("biz-1", Vec::new());
        assert_eq!(empty.subscriber_count, 0);
        assert_eq!(empty.total_invested_cents, 0);
    }

    #[test]
    fn test_subscription_stats_with_token() {
        let stats = SubscriptionStats::evaluate(position("a", 10, 19_000), Some(&token(90, 2833)));
        assert_eq!(stats.current_price_cents, Some(2833));
        assert_eq!(stats.current_value_cents, Some(28_330));
        assert_eq!(stats.profit_cents, Some(9_330));
    }

    #[test]
    fn test_subscription_stats_without_token() {
        let stats = SubscriptionStats::evaluate(position("a", 10, 19_000), None);
        assert_eq!(stats.current_price_cents, None);
        assert_eq!(stats.profit_cents, None);
    }

    #[test]
    fn test_market_event_wire_format() {
        let event = MarketEvent::TokensBurned {
            token: token(10, 1900),
            amount: 5,
            reason: "Manual burn".to_string(),
        };
        assert_eq!(event.kind(), "tokens_burned");
        assert_eq!(event.business_id(), "biz-1");

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "tokens_burned");
        assert_eq!(value["data"]["amount"], 5);
        assert_eq!(value["data"]["token"]["symbol"], "PIZT");
    }
}
