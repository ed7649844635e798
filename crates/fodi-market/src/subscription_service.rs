//! # Subscription Manager
//!
//! Buying into and exiting from a business token.
//!
//! ## Subscribe (one unit)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. business, token exist            else NotFound                      │
//! │  2. amount ≤ supply                  else InsufficientSupply            │
//! │  3. investment = price × amount      price as read in step 1            │
//! │  4. position += (amount, investment) insert or add                      │
//! │  5. append buy   user ──► owner                                         │
//! │  6. supply -= amount, reprice        compare-and-set on supply          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Unsubscribe (one unit)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. position, token, business exist  else NotFound                      │
//! │  2. refund = price × tokens_owned    whole position, mark-to-market     │
//! │  3. append sell  owner ──► user                                         │
//! │  4. supply += tokens, reprice                                           │
//! │  5. delete position                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any failure rolls the whole unit back. Events go out after commit.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ts_rs::TS;

use crate::error::{MarketError, MarketResult};
use crate::events::EventPublisher;
use crate::pricing::PricingEngine;
use fodi_core::token::{deposit_supply, position_value, withdraw_supply};
use fodi_core::validation::{validate_id, validate_token_amount};
use fodi_core::{
    BusinessSubscribers, BusinessSubscription, BusinessToken, CoreError, MarketEvent,
    SubscriptionStats, TokenTransaction, TxType,
};
use fodi_db::{new_id, now, Database};

/// Result of a subscribe or unsubscribe.
///
/// For unsubscribe `subscription` is the row as it was before removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SubscriptionReceipt {
    pub subscription: BusinessSubscription,
    pub transaction: TokenTransaction,
    pub token: BusinessToken,
}

/// Manages investor positions.
#[derive(Clone)]
pub struct SubscriptionService {
    db: Database,
    pricing: PricingEngine,
    events: Arc<dyn EventPublisher>,
}

impl SubscriptionService {
    pub fn new(db: Database, pricing: PricingEngine, events: Arc<dyn EventPublisher>) -> Self {
        SubscriptionService { db, pricing, events }
    }

    /// Buys `tokens_amount` tokens of a business for a user.
    pub async fn subscribe(
        &self,
        user_id: &str,
        business_id: &str,
        tokens_amount: i64,
    ) -> MarketResult<SubscriptionReceipt> {
        validate_id("userId", user_id)?;
        validate_token_amount("tokensAmount", tokens_amount)?;

        let user = user_id.to_string();
        let id = business_id.to_string();
        let pricing = self.pricing;

        let receipt = self
            .db
            .with_transaction(move |tx| {
                Box::pin(async move {
                    let business = tx
                        .business(&id)
                        .await?
                        .ok_or_else(|| MarketError::not_found("Business", &id))?;
                    let token = tx
                        .token_for_business(&id)
                        .await?
                        .ok_or_else(|| MarketError::not_found("Token", &id))?;

                    let new_supply = withdraw_supply(token.total_supply, tokens_amount)?;
                    let investment = position_value(token.price(), tokens_amount)?;

                    let subscription = match tx.subscription(&user, &id).await? {
                        Some(existing) => {
                            let tokens_owned = existing
                                .tokens_owned
                                .checked_add(tokens_amount)
                                .ok_or_else(|| overflow("tokens owned"))?;
                            let invested_cents = existing
                                .invested_cents
                                .checked_add(investment.cents())
                                .ok_or_else(|| overflow("invested amount"))?;
                            tx.update_position(&existing, tokens_owned, invested_cents)
                                .await?
                        }
                        None => {
                            let ts = now();
                            let sub = BusinessSubscription {
                                id: new_id(),
                                user_id: user.clone(),
                                business_id: id.clone(),
                                tokens_owned: tokens_amount,
                                invested_cents: investment.cents(),
                                created_at: ts,
                                updated_at: ts,
                            };
                            tx.insert_subscription(&sub).await?;
                            sub
                        }
                    };

                    let transaction = TokenTransaction {
                        id: new_id(),
                        business_id: id.clone(),
                        from_user: user,
                        to_user: business.owner_id,
                        tokens: tokens_amount,
                        amount_cents: investment.cents(),
                        tx_type: TxType::Buy,
                        created_at: now(),
                    };
                    tx.insert_transaction(&transaction).await?;

                    let quote = pricing.compute_price(tx, &id, new_supply).await?;
                    let token = tx
                        .update_token_state(&token, token.total_supply, new_supply, quote.price.cents())
                        .await?;

                    Ok::<_, MarketError>(SubscriptionReceipt {
                        subscription,
                        transaction,
                        token,
                    })
                })
            })
            .await?;

        info!(
            user_id = %user_id,
            business_id = %business_id,
            tokens = tokens_amount,
            investment = %receipt.transaction.amount(),
            supply_after = receipt.token.total_supply,
            price_after = %receipt.token.price(),
            "User subscribed"
        );
        self.events.publish(MarketEvent::Subscribed {
            subscription: receipt.subscription.clone(),
            transaction: receipt.transaction.clone(),
            token: receipt.token.clone(),
        });

        Ok(receipt)
    }

    /// Sells a user's whole position back at the current price.
    pub async fn unsubscribe(&self, user_id: &str, business_id: &str) -> MarketResult<SubscriptionReceipt> {
        validate_id("userId", user_id)?;

        let user = user_id.to_string();
        let id = business_id.to_string();
        let pricing = self.pricing;

        let receipt = self
            .db
            .with_transaction(move |tx| {
                Box::pin(async move {
                    let subscription = tx
                        .subscription(&user, &id)
                        .await?
                        .ok_or_else(|| MarketError::not_found("Subscription", format!("{user}/{id}")))?;
                    let token = tx
                        .token_for_business(&id)
                        .await?
                        .ok_or_else(|| MarketError::not_found("Token", &id))?;
                    let business = tx
                        .business(&id)
                        .await?
                        .ok_or_else(|| MarketError::not_found("Business", &id))?;

                    let tokens = subscription.tokens_owned;
                    let refund = position_value(token.price(), tokens)?;
                    let new_supply = deposit_supply(token.total_supply, tokens)?;

                    let transaction = TokenTransaction {
                        id: new_id(),
                        business_id: id.clone(),
                        from_user: business.owner_id,
                        to_user: user,
                        tokens,
                        amount_cents: refund.cents(),
                        tx_type: TxType::Sell,
                        created_at: now(),
                    };
                    tx.insert_transaction(&transaction).await?;

                    // Priced while the position still counts as an investor
                    let quote = pricing.compute_price(tx, &id, new_supply).await?;
                    let token = tx
                        .update_token_state(&token, token.total_supply, new_supply, quote.price.cents())
                        .await?;

                    tx.delete_subscription(&subscription.id).await?;

                    Ok::<_, MarketError>(SubscriptionReceipt {
                        subscription,
                        transaction,
                        token,
                    })
                })
            })
            .await?;

        info!(
            user_id = %user_id,
            business_id = %business_id,
            tokens = receipt.transaction.tokens,
            invested = %receipt.subscription.invested(),
            refund = %receipt.transaction.amount(),
            supply_after = receipt.token.total_supply,
            price_after = %receipt.token.price(),
            "User unsubscribed"
        );
        self.events.publish(MarketEvent::Unsubscribed {
            subscription: receipt.subscription.clone(),
            transaction: receipt.transaction.clone(),
            token: receipt.token.clone(),
        });

        Ok(receipt)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// All positions of a user, newest first.
    pub async fn get_user_subscriptions(&self, user_id: &str) -> MarketResult<Vec<BusinessSubscription>> {
        let subs = self.db.subscriptions().list_for_user(user_id).await?;
        debug!(user_id = %user_id, count = subs.len(), "Fetched user subscriptions");
        Ok(subs)
    }

    /// Subscribers of a business with totals over the returned rows.
    pub async fn get_business_subscribers(&self, business_id: &str) -> MarketResult<BusinessSubscribers> {
        let rows = self.db.subscriptions().list_for_business(business_id).await?;
        Ok(BusinessSubscribers::from_rows(business_id, rows))
    }

    /// One position marked to the current token price.
    pub async fn get_subscription_stats(
        &self,
        user_id: &str,
        business_id: &str,
    ) -> MarketResult<SubscriptionStats> {
        let subscription = self
            .db
            .subscriptions()
            .get(user_id, business_id)
            .await?
            .ok_or_else(|| MarketError::not_found("Subscription", format!("{user_id}/{business_id}")))?;
        let token = self.db.tokens().get_by_business(business_id).await?;

        Ok(SubscriptionStats::evaluate(subscription, token.as_ref()))
    }
}

fn overflow(what: &str) -> MarketError {
    CoreError::AmountOverflow { what: what.into() }.into()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{create_business, setup, setup_file_backed};
    use fodi_core::TxType;

    #[tokio::test]
    async fn test_subscribe_scenario() {
        let (market, events) = setup().await;
        let business = create_business(&market, "Pizza Palace").await;
        market.tokens().create_token(&business.id, "PIZT", 0, 100).await.unwrap();

        let receipt = market.subscriptions().subscribe("alice", &business.id, 10).await.unwrap();

        assert_eq!(receipt.subscription.tokens_owned, 10);
        assert_eq!(receipt.subscription.invested_cents, 19_000);
        assert_eq!(receipt.transaction.tx_type, TxType::Buy);
        assert_eq!(receipt.transaction.tokens, 10);
        assert_eq!(receipt.transaction.amount_cents, 19_000);
        assert_eq!(receipt.transaction.from_user, "alice");
        assert_eq!(receipt.transaction.to_user, business.owner_id);
        assert_eq!(receipt.token.total_supply, 90);
        assert_eq!(receipt.token.price_cents, 2833);

        let stored = market.tokens().get_business_token(&business.id).await.unwrap();
        assert_eq!(stored, receipt.token);
        assert_eq!(events.kinds(), vec!["token_created", "subscribed"]);
    }

    #[tokio::test]
    async fn test_subscribe_adds_to_existing_position() {
        let (market, _) = setup().await;
        let business = create_business(&market, "Sushi Bar").await;
        market.tokens().create_token(&business.id, "SUST", 0, 100).await.unwrap();

        let first = market.subscriptions().subscribe("alice", &business.id, 10).await.unwrap();
        let second = market.subscriptions().subscribe("alice", &business.id, 5).await.unwrap();

        assert_eq!(second.subscription.id, first.subscription.id);
        assert_eq!(second.subscription.tokens_owned, 15);
        // Second buy at 28.33 a token
        assert_eq!(second.subscription.invested_cents, 19_000 + 5 * 2833);
        assert_eq!(second.token.total_supply, 85);

        let subs = market.subscriptions().get_user_subscriptions("alice").await.unwrap();
        assert_eq!(subs.len(), 1);
    }

    #[tokio::test]
    async fn test_subscribe_insufficient_supply_changes_nothing() {
        let (market, events) = setup().await;
        let business = create_business(&market, "Wok Express").await;
        market.tokens().create_token(&business.id, "WOKT", 0, 5).await.unwrap();

        let err = market
            .subscriptions()
            .subscribe("alice", &business.id, 6)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MarketError::InsufficientSupply {
                available: 5,
                requested: 6
            }
        ));

        let token = market.tokens().get_business_token(&business.id).await.unwrap();
        assert_eq!(token.total_supply, 5);
        assert_eq!(token.price_cents, 1900);
        assert!(market
            .subscriptions()
            .get_user_subscriptions("alice")
            .await
            .unwrap()
            .is_empty());
        let log = market.analytics().business_transactions(&business.id, Default::default()).await.unwrap();
        assert!(log.is_empty());
        assert_eq!(events.kinds(), vec!["token_created"]);
    }

    #[tokio::test]
    async fn test_subscribe_rejects_bad_input() {
        let (market, _) = setup().await;
        let business = create_business(&market, "Deli Delight").await;

        let err = market.subscriptions().subscribe("alice", &business.id, 0).await.unwrap_err();
        assert!(matches!(err, MarketError::InvalidArgument(_)));

        let err = market.subscriptions().subscribe("", &business.id, 1).await.unwrap_err();
        assert!(matches!(err, MarketError::InvalidArgument(_)));

        // No token yet
        let err = market.subscriptions().subscribe("alice", &business.id, 1).await.unwrap_err();
        assert!(matches!(err, MarketError::NotFound { .. }));

        let err = market.subscriptions().subscribe("alice", "missing", 1).await.unwrap_err();
        assert!(matches!(err, MarketError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_unsubscribe_restores_supply() {
        let (market, events) = setup().await;
        let business = create_business(&market, "Grill House").await;
        market.tokens().create_token(&business.id, "GRIT", 0, 100).await.unwrap();

        let bought = market.subscriptions().subscribe("alice", &business.id, 10).await.unwrap();
        let sold = market.subscriptions().unsubscribe("alice", &business.id).await.unwrap();

        assert_eq!(sold.token.total_supply, 100);
        assert_eq!(sold.subscription.id, bought.subscription.id);
        assert_eq!(sold.transaction.tx_type, TxType::Sell);
        assert_eq!(sold.transaction.tokens, 10);
        // Refund at the post-buy price
        assert_eq!(sold.transaction.amount_cents, 10 * 2833);
        assert_eq!(sold.transaction.from_user, business.owner_id);
        assert_eq!(sold.transaction.to_user, "alice");

        let err = market
            .subscriptions()
            .get_subscription_stats("alice", &business.id)
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::NotFound { .. }));
        assert_eq!(events.kinds(), vec!["token_created", "subscribed", "unsubscribed"]);
    }

    #[tokio::test]
    async fn test_unsubscribe_without_position() {
        let (market, _) = setup().await;
        let business = create_business(&market, "Ramen Room").await;
        market.tokens().mint_initial(&business.id).await.unwrap();

        let err = market.subscriptions().unsubscribe("bob", &business.id).await.unwrap_err();
        assert!(matches!(err, MarketError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_business_subscribers_totals() {
        let (market, _) = setup().await;
        let business = create_business(&market, "Kebab King").await;
        market.tokens().create_token(&business.id, "KEBT", 0, 1000).await.unwrap();

        market.subscriptions().subscribe("alice", &business.id, 10).await.unwrap();
        market.subscriptions().subscribe("bob", &business.id, 20).await.unwrap();
        market.subscriptions().subscribe("carol", &business.id, 5).await.unwrap();

        let subs = market.subscriptions().get_business_subscribers(&business.id).await.unwrap();
        assert_eq!(subs.subscriber_count, 3);
        assert_eq!(subs.subscribers.len(), 3);
        assert_eq!(subs.total_tokens_sold, 35);
        let sum: i64 = subs.subscribers.iter().map(|s| s.invested_cents).sum();
        assert_eq!(subs.total_invested_cents, sum);
        assert_eq!(subs.subscribers[0].user_id, "carol");
    }

    #[tokio::test]
    async fn test_subscription_stats_marks_to_market() {
        let (market, _) = setup().await;
        let business = create_business(&market, "Crepe Cafe").await;
        market.tokens().create_token(&business.id, "CRET", 0, 100).await.unwrap();
        market.subscriptions().subscribe("alice", &business.id, 10).await.unwrap();

        let stats = market
            .subscriptions()
            .get_subscription_stats("alice", &business.id)
            .await
            .unwrap();
        assert_eq!(stats.current_price_cents, Some(2833));
        assert_eq!(stats.current_value_cents, Some(28_330));
        assert_eq!(stats.profit_cents, Some(28_330 - 19_000));
        assert_eq!(stats.share_percent, Some(10.0 / 90.0 * 100.0));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_subscribes_never_oversell() {
        let dir = tempfile::tempdir().unwrap();
        let market = setup_file_backed(dir.path()).await;
        let business = create_business(&market, "Busy Bistro").await;
        market.tokens().create_token(&business.id, "BUST", 0, 100).await.unwrap();

        // Twenty buyers of 10 against a pool of 100
        let mut handles = Vec::new();
        for i in 0..20 {
            let market = market.clone();
            let business_id = business.id.clone();
            handles.push(tokio::spawn(async move {
                market
                    .subscriptions()
                    .subscribe(&format!("user-{i}"), &business_id, 10)
                    .await
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(MarketError::InsufficientSupply { .. }) => {}
                Err(other) => panic!("unexpected failure: {other:?}"),
            }
        }

        let token = market.tokens().get_business_token(&business.id).await.unwrap();
        let holders = market
            .subscriptions()
            .get_business_subscribers(&business.id)
            .await
            .unwrap();
        let stats = market.analytics().business_stats(&business.id).await.unwrap();

        assert!(token.total_supply >= 0);
        assert_eq!(token.total_supply + holders.total_tokens_sold, 100);
        assert_eq!(holders.subscriber_count, succeeded);
        assert_eq!(stats.buy_count, succeeded);
        // Writers queue, so the whole pool sells
        assert_eq!(succeeded, 10);
        assert_eq!(token.total_supply, 0);

        market.db().close().await;
    }
}
