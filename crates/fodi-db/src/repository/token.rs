//! # Token Repository
//!
//! Storage for business tokens (one per business).
//!
//! ## Compare-and-Set Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Unit A reads supply=100           Unit B reads supply=100             │
//! │       │                                 │                               │
//! │       ▼                                 ▼                               │
//! │  UPDATE .. SET supply=90           UPDATE .. SET supply=95             │
//! │   WHERE id=? AND supply=100         WHERE id=? AND supply=100          │
//! │       │                                 │                               │
//! │       ▼                                 ▼                               │
//! │  1 row → commit                    0 rows → ConcurrentModification     │
//! │                                          → whole unit rolled back      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! The expected supply is the value read at the start of the unit, so a
//! concurrent writer can never be silently overwritten.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::now;
use crate::unit_of_work::LedgerTx;
use fodi_core::BusinessToken;

const SELECT_TOKEN: &str = r#"
    SELECT id, business_id, symbol, total_supply, price_cents, created_at, updated_at
    FROM business_tokens
"#;

/// Repository for token reads.
#[derive(Debug, Clone)]
pub struct TokenRepository {
    pool: SqlitePool,
}

impl TokenRepository {
    /// Creates a new TokenRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TokenRepository { pool }
    }

    /// Gets the token of a business.
    pub async fn get_by_business(&self, business_id: &str) -> DbResult<Option<BusinessToken>> {
        let mut conn = self.pool.acquire().await?;
        fetch_token_for_business(&mut conn, business_id).await
    }

    /// Lists all tokens, highest market cap first.
    pub async fn list(&self) -> DbResult<Vec<BusinessToken>> {
        let sql = format!("{SELECT_TOKEN} ORDER BY total_supply * price_cents DESC, created_at DESC");
        let tokens = sqlx::query_as::<_, BusinessToken>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = tokens.len(), "Listed tokens");
        Ok(tokens)
    }
}

// =============================================================================
// Ledger operations
// =============================================================================

impl LedgerTx {
    /// Reads the token of a business inside the unit.
    pub async fn token_for_business(&mut self, business_id: &str) -> DbResult<Option<BusinessToken>> {
        fetch_token_for_business(self.conn(), business_id).await
    }

    /// Inserts a new token.
    ///
    /// A second token for the same business fails with
    /// `DbError::UniqueViolation` (UNIQUE on `business_id`).
    pub async fn insert_token(&mut self, token: &BusinessToken) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO business_tokens (
                id, business_id, symbol, total_supply, price_cents, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&token.id)
        .bind(&token.business_id)
        .bind(&token.symbol)
        .bind(token.total_supply)
        .bind(token.price_cents)
        .bind(token.created_at)
        .bind(token.updated_at)
        .execute(self.conn())
        .await?;

        debug!(token_id = %token.id, business_id = %token.business_id, "Token inserted");
        Ok(())
    }

    /// Writes a token's new supply and price in one statement.
    ///
    /// `expected_supply` is the supply this unit read; if the row no longer
    /// holds it the write is refused.
    ///
    /// ## Returns
    /// The token as stored (with a fresh `updated_at`).
    pub async fn update_token_state(
        &mut self,
        token: &BusinessToken,
        expected_supply: i64,
        new_supply: i64,
        new_price_cents: i64,
    ) -> DbResult<BusinessToken> {
        let updated_at = now();

        let result = sqlx::query(
            r#"
            UPDATE business_tokens
            SET total_supply = ?1, price_cents = ?2, updated_at = ?3
            WHERE id = ?4 AND total_supply = ?5
            "#,
        )
        .bind(new_supply)
        .bind(new_price_cents)
        .bind(updated_at)
        .bind(&token.id)
        .bind(expected_supply)
        .execute(self.conn())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::concurrent_modification("Token", &token.id));
        }

        debug!(
            token_id = %token.id,
            supply = new_supply,
            price_cents = new_price_cents,
            "Token state updated"
        );

        Ok(BusinessToken {
            total_supply: new_supply,
            price_cents: new_price_cents,
            updated_at,
            ..token.clone()
        })
    }
}

pub(crate) async fn fetch_token_for_business(
    conn: &mut SqliteConnection,
    business_id: &str,
) -> DbResult<Option<BusinessToken>> {
    let sql = format!("{SELECT_TOKEN} WHERE business_id = ?1");
    let token = sqlx::query_as::<_, BusinessToken>(&sql)
        .bind(business_id)
        .fetch_optional(conn)
        .await?;
    Ok(token)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::business::NewBusiness;
    use crate::repository::new_id;
    use crate::{Database, DbConfig};

    async fn setup() -> (Database, BusinessToken) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let business = db
            .businesses()
            .create(NewBusiness {
                owner_id: "owner-1".to_string(),
                name: "Pizza Palace".to_string(),
                ..NewBusiness::default()
            })
            .await
            .unwrap();

        let ts = now();
        let token = BusinessToken {
            id: new_id(),
            business_id: business.id,
            symbol: "PIZT".to_string(),
            total_supply: 100,
            price_cents: 1900,
            created_at: ts,
            updated_at: ts,
        };

        let inserted = token.clone();
        db.with_transaction(move |tx| {
            Box::pin(async move {
                tx.insert_token(&inserted).await?;
                Ok::<_, DbError>(())
            })
        })
        .await
        .unwrap();

        (db, token)
    }

    #[tokio::test]
    async fn test_insert_and_read() {
        let (db, token) = setup().await;
        let loaded = db.tokens().get_by_business(&token.business_id).await.unwrap();
        assert_eq!(loaded, Some(token));
        assert!(db.tokens().get_by_business("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_second_token_is_unique_violation() {
        let (db, token) = setup().await;
        let duplicate = BusinessToken {
            id: new_id(),
            ..token
        };

        let err = db
            .with_transaction(move |tx| {
                Box::pin(async move {
                    tx.insert_token(&duplicate).await?;
                    Ok::<_, DbError>(())
                })
            })
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_update_token_state_compare_and_set() {
        let (db, token) = setup().await;

        let stale = token.clone();
        let updated = db
            .with_transaction(move |tx| {
                Box::pin(async move { tx.update_token_state(&stale, 100, 90, 2833).await })
            })
            .await
            .unwrap();
        assert_eq!(updated.total_supply, 90);
        assert_eq!(updated.price_cents, 2833);

        // Supply is now 90; a writer still expecting 100 must fail.
        let stale = token.clone();
        let err = db
            .with_transaction(move |tx| {
                Box::pin(async move { tx.update_token_state(&stale, 100, 95, 2000).await })
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ConcurrentModification { .. }));

        let loaded = db.tokens().get_by_business(&token.business_id).await.unwrap().unwrap();
        assert_eq!(loaded.total_supply, 90);
        assert_eq!(loaded.price_cents, 2833);
    }

    #[tokio::test]
    async fn test_negative_supply_rejected_by_schema() {
        let (db, token) = setup().await;
        let err = db
            .with_transaction(move |tx| {
                Box::pin(async move { tx.update_token_state(&token, 100, -1, 1900).await })
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ConstraintViolation(_)));
    }
}
