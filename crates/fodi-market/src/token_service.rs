//! # Token Lifecycle
//!
//! Issuing, minting, burning and repricing a business token.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   {no token} ──MintInitial──► {token, supply=1, price=base}            │
//! │       │                              │                                  │
//! │       └──CreateToken(sym, p, n)──►   │ Mint(n)    supply += n, reprice │
//! │                                      │ Burn(n)    supply -= n, reprice │
//! │                                      │ Recalculate     reprice only     │
//! │                                      ▼                                  │
//! │                               {token, supply, price}                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every operation is one unit on the ledger. Mint and burn change supply
//! and price with a single compare-and-set UPDATE and never append to the
//! transaction log. The `reason` of a mint or burn is logged, not stored.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{MarketError, MarketResult};
use crate::events::EventPublisher;
use crate::pricing::PricingEngine;
use fodi_core::token::{deposit_supply, generate_token_symbol, withdraw_supply};
use fodi_core::validation::{validate_symbol, validate_token_amount};
use fodi_core::{BusinessToken, MarketEvent, INITIAL_SUPPLY};
use fodi_db::{new_id, now, Database};

/// Manages the token of each business.
#[derive(Clone)]
pub struct TokenService {
    db: Database,
    pricing: PricingEngine,
    events: Arc<dyn EventPublisher>,
}

impl TokenService {
    pub fn new(db: Database, pricing: PricingEngine, events: Arc<dyn EventPublisher>) -> Self {
        TokenService { db, pricing, events }
    }

    /// Issues the first token of a business. Idempotent.
    ///
    /// ## Behavior
    /// - business missing → `NotFound`
    /// - token already there → returned unchanged
    /// - otherwise: symbol derived from the name, supply 1, base price
    ///
    /// Two concurrent callers both succeed with the same token: the loser of
    /// the UNIQUE race re-reads the winner's row.
    pub async fn mint_initial(&self, business_id: &str) -> MarketResult<BusinessToken> {
        let id = business_id.to_string();
        let base_price_cents = self.pricing.config().base_price_cents;

        let result = self
            .db
            .with_transaction(move |tx| {
                Box::pin(async move {
                    let business = tx
                        .business(&id)
                        .await?
                        .ok_or_else(|| MarketError::not_found("Business", &id))?;

                    if let Some(existing) = tx.token_for_business(&id).await? {
                        return Ok((existing, false));
                    }

                    let ts = now();
                    let token = BusinessToken {
                        id: new_id(),
                        business_id: id,
                        symbol: generate_token_symbol(&business.name),
                        total_supply: INITIAL_SUPPLY,
                        price_cents: base_price_cents,
                        created_at: ts,
                        updated_at: ts,
                    };
                    tx.insert_token(&token).await?;

                    Ok::<_, MarketError>((token, true))
                })
            })
            .await;

        match result {
            Ok((token, true)) => {
                info!(
                    business_id = %token.business_id,
                    symbol = %token.symbol,
                    supply = token.total_supply,
                    price = %token.price(),
                    "Initial token minted"
                );
                self.events.publish(MarketEvent::TokenCreated {
                    token: token.clone(),
                });
                Ok(token)
            }
            Ok((token, false)) => Ok(token),
            Err(MarketError::AlreadyExists { .. }) => {
                warn!(business_id = %business_id, "Lost initial mint race, returning existing token");
                self.get_business_token(business_id).await
            }
            Err(err) => Err(err),
        }
    }

    /// Issues a token with explicit parameters.
    ///
    /// ## Rules
    /// - symbol: non-empty, ≤ 16 chars, letters and digits
    /// - `total_supply > 0`
    /// - `initial_price_cents ≤ 0` → base price
    /// - business missing → `NotFound`; token present → `AlreadyExists`
    pub async fn create_token(
        &self,
        business_id: &str,
        symbol: &str,
        initial_price_cents: i64,
        total_supply: i64,
    ) -> MarketResult<BusinessToken> {
        validate_symbol(symbol)?;
        validate_token_amount("totalSupply", total_supply)?;

        let price_cents = if initial_price_cents <= 0 {
            self.pricing.config().base_price_cents
        } else {
            initial_price_cents
        };

        let id = business_id.to_string();
        let symbol = symbol.to_string();

        let token = self
            .db
            .with_transaction(move |tx| {
                Box::pin(async move {
                    if tx.business(&id).await?.is_none() {
                        return Err(MarketError::not_found("Business", &id));
                    }
                    if tx.token_for_business(&id).await?.is_some() {
                        return Err(MarketError::already_exists("Token", &id));
                    }

                    let ts = now();
                    let token = BusinessToken {
                        id: new_id(),
                        business_id: id,
                        symbol,
                        total_supply,
                        price_cents,
                        created_at: ts,
                        updated_at: ts,
                    };
                    tx.insert_token(&token).await?;

                    Ok::<_, MarketError>(token)
                })
            })
            .await?;

        info!(
            business_id = %token.business_id,
            symbol = %token.symbol,
            supply = token.total_supply,
            price = %token.price(),
            "Token created"
        );
        self.events.publish(MarketEvent::TokenCreated {
            token: token.clone(),
        });

        Ok(token)
    }

    /// Adds `amount` tokens to circulation and reprices.
    pub async fn mint_tokens(&self, business_id: &str, amount: i64, reason: &str) -> MarketResult<BusinessToken> {
        validate_token_amount("amount", amount)?;

        let id = business_id.to_string();
        let pricing = self.pricing;

        let (previous, token) = self
            .db
            .with_transaction(move |tx| {
                Box::pin(async move {
                    let token = tx
                        .token_for_business(&id)
                        .await?
                        .ok_or_else(|| MarketError::not_found("Token", &id))?;

                    let new_supply = deposit_supply(token.total_supply, amount)?;
                    let quote = pricing.compute_price(tx, &id, new_supply).await?;
                    let updated = tx
                        .update_token_state(&token, token.total_supply, new_supply, quote.price.cents())
                        .await?;

                    Ok::<_, MarketError>((token, updated))
                })
            })
            .await?;

        info!(
            business_id = %business_id,
            amount,
            reason = %reason,
            supply_before = previous.total_supply,
            supply_after = token.total_supply,
            price_before = %previous.price(),
            price_after = %token.price(),
            "Tokens minted"
        );
        self.events.publish(MarketEvent::TokensMinted {
            token: token.clone(),
            amount,
            reason: reason.to_string(),
        });

        Ok(token)
    }

    /// Removes `amount` tokens from circulation and reprices.
    ///
    /// `amount > supply` → `InsufficientSupply`, nothing written.
    pub async fn burn_tokens(&self, business_id: &str, amount: i64, reason: &str) -> MarketResult<BusinessToken> {
        validate_token_amount("amount", amount)?;

        let id = business_id.to_string();
        let pricing = self.pricing;

        let (previous, token) = self
            .db
            .with_transaction(move |tx| {
                Box::pin(async move {
                    let token = tx
                        .token_for_business(&id)
                        .await?
                        .ok_or_else(|| MarketError::not_found("Token", &id))?;

                    let new_supply = withdraw_supply(token.total_supply, amount)?;
                    let quote = pricing.compute_price(tx, &id, new_supply).await?;
                    let updated = tx
                        .update_token_state(&token, token.total_supply, new_supply, quote.price.cents())
                        .await?;

                    Ok::<_, MarketError>((token, updated))
                })
            })
            .await?;

        info!(
            business_id = %business_id,
            amount,
            reason = %reason,
            supply_before = previous.total_supply,
            supply_after = token.total_supply,
            price_before = %previous.price(),
            price_after = %token.price(),
            "Tokens burned"
        );
        self.events.publish(MarketEvent::TokensBurned {
            token: token.clone(),
            amount,
            reason: reason.to_string(),
        });

        Ok(token)
    }

    /// Re-derives the price from current supply and aggregates.
    pub async fn recalculate_price(&self, business_id: &str) -> MarketResult<BusinessToken> {
        let id = business_id.to_string();
        let pricing = self.pricing;

        let (previous, token) = self
            .db
            .with_transaction(move |tx| {
                Box::pin(async move {
                    let token = tx
                        .token_for_business(&id)
                        .await?
                        .ok_or_else(|| MarketError::not_found("Token", &id))?;

                    let supply = token.total_supply;
                    let quote = pricing.compute_price(tx, &id, supply).await?;
                    let updated = tx
                        .update_token_state(&token, supply, supply, quote.price.cents())
                        .await?;

                    Ok::<_, MarketError>((token, updated))
                })
            })
            .await?;

        info!(
            business_id = %business_id,
            price_before = %previous.price(),
            price_after = %token.price(),
            "Token price recalculated"
        );
        self.events.publish(MarketEvent::PriceRecalculated {
            token: token.clone(),
            previous_price_cents: previous.price_cents,
        });

        Ok(token)
    }

    /// Reads the token of a business.
    pub async fn get_business_token(&self, business_id: &str) -> MarketResult<BusinessToken> {
        self.db
            .tokens()
            .get_by_business(business_id)
            .await?
            .ok_or_else(|| MarketError::not_found("Token", business_id))
    }

    /// Lists all tokens, highest market cap first.
    pub async fn list_tokens(&self) -> MarketResult<Vec<BusinessToken>> {
        Ok(self.db.tokens().list().await?)
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
    async fn test_mint_initial_is_idempotent() {
        let (market, events) = setup().await;
        let business = create_business(&market, "Pizza Palace").await;

        let first = market.tokens().mint_initial(&business.id).await.unwrap();
        assert_eq!(first.symbol, "PIZT");
        assert_eq!(first.total_supply, 1);
        assert_eq!(first.price_cents, 1900);

        let second = market.tokens().mint_initial(&business.id).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(events.kinds(), vec!["token_created"]);
    }

    #[tokio::test]
    async fn test_mint_initial_unknown_business() {
        let (market, _) = setup().await;
        let err = market.tokens().mint_initial("missing").await.unwrap_err();
        assert!(matches!(err, MarketError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_create_token_rules() {
        let (market, _) = setup().await;
        let business = create_business(&market, "Burger Barn").await;
        let tokens = market.tokens();

        let err = tokens.create_token(&business.id, "BAD SYM", 0, 10).await.unwrap_err();
        assert!(matches!(err, MarketError::InvalidArgument(_)));

        let err = tokens.create_token(&business.id, "BURG", 0, 0).await.unwrap_err();
        assert!(matches!(err, MarketError::InvalidArgument(_)));

        let err = tokens.create_token("missing", "BURG", 0, 10).await.unwrap_err();
        assert!(matches!(err, MarketError::NotFound { .. }));

        let token = tokens.create_token(&business.id, "BURG", -5, 100).await.unwrap();
        assert_eq!(token.price_cents, 1900);
        assert_eq!(token.total_supply, 100);

        let err = tokens.create_token(&business.id, "BURG2", 2500, 10).await.unwrap_err();
        assert!(matches!(err, MarketError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_mint_reprices_from_new_supply() {
        let (market, events) = setup().await;
        let business = create_business(&market, "Taco Stand").await;
        market.tokens().mint_initial(&business.id).await.unwrap();

        // supply 1 → 100: 19.00 × (1 + 10 × 0.05) = 28.50
        let token = market
            .tokens()
            .mint_tokens(&business.id, 99, "Manual mint")
            .await
            .unwrap();
        assert_eq!(token.total_supply, 100);
        assert_eq!(token.price_cents, 2850);

        let stored = market.tokens().get_business_token(&business.id).await.unwrap();
        assert_eq!(stored, token);
        assert_eq!(events.kinds(), vec!["token_created", "tokens_minted"]);
    }

    #[tokio::test]
    async fn test_mint_and_burn_validation() {
        let (market, _) = setup().await;
        let business = create_business(&market, "Noodle House").await;

        let err = market.tokens().mint_tokens(&business.id, 5, "x").await.unwrap_err();
        assert!(matches!(err, MarketError::NotFound { .. }));

        market.tokens().mint_initial(&business.id).await.unwrap();

        let err = market.tokens().mint_tokens(&business.id, 0, "x").await.unwrap_err();
        assert!(matches!(err, MarketError::InvalidArgument(_)));

        let err = market.tokens().burn_tokens(&business.id, -1, "x").await.unwrap_err();
        assert!(matches!(err, MarketError::InvalidArgument(_)));

        let err = market
            .tokens()
            .mint_tokens(&business.id, i64::MAX, "x")
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_burn_more_than_supply_changes_nothing() {
        let (market, _) = setup().await;
        let business = create_business(&market, "Curry Corner").await;
        market.tokens().create_token(&business.id, "CURT", 0, 10).await.unwrap();
        let before = market.tokens().get_business_token(&business.id).await.unwrap();

        let err = market
            .tokens()
            .burn_tokens(&business.id, 11, "Manual burn")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MarketError::InsufficientSupply {
                available: 10,
                requested: 11
            }
        ));

        let after = market.tokens().get_business_token(&business.id).await.unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_burn_to_zero() {
        let (market, _) = setup().await;
        let business = create_business(&market, "Bagel Bros").await;
        market.tokens().create_token(&business.id, "BAGT", 0, 10).await.unwrap();

        let token = market
            .tokens()
            .burn_tokens(&business.id, 10, "Manual burn")
            .await
            .unwrap();
        assert_eq!(token.total_supply, 0);
        assert_eq!(token.price_cents, 1900);
    }

    #[tokio::test]
    async fn test_recalculate_price_keeps_supply() {
        let (market, events) = setup().await;
        let business = create_business(&market, "Falafel Spot").await;
        // Manual price far from the formula
        market.tokens().create_token(&business.id, "FALT", 5000, 20).await.unwrap();

        let token = market.tokens().recalculate_price(&business.id).await.unwrap();
        assert_eq!(token.total_supply, 20);
        // 19.00 × (1 + 2 × 0.05) = 20.90
        assert_eq!(token.price_cents, 2090);
        assert_eq!(events.kinds(), vec!["token_created", "price_recalculated"]);

        let err = market.tokens().recalculate_price("missing").await.unwrap_err();
        assert!(matches!(err, MarketError::NotFound { .. }));
    }
}
