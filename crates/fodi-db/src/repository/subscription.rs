//! # Subscription Repository
//!
//! Investor positions: one row per (user, business).
//!
//! ```text
//! first subscribe ──► insert_subscription   (tokens, invested)
//! next subscribe  ──► update_position       (tokens += n, invested += cost)
//! unsubscribe     ──► delete_subscription   (row removed)
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::now;
use crate::unit_of_work::LedgerTx;
use fodi_core::BusinessSubscription;

const SELECT_SUBSCRIPTION: &str = r#"
    SELECT id, user_id, business_id, tokens_owned, invested_cents, created_at, updated_at
    FROM business_subscriptions
"#;

/// Repository for subscription reads.
#[derive(Debug, Clone)]
pub struct SubscriptionRepository {
    pool: SqlitePool,
}

impl SubscriptionRepository {
    /// Creates a new SubscriptionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SubscriptionRepository { pool }
    }

    /// Gets one user's position in one business.
    pub async fn get(&self, user_id: &str, business_id: &str) -> DbResult<Option<BusinessSubscription>> {
        let mut conn = self.pool.acquire().await?;
        fetch_subscription(&mut conn, user_id, business_id).await
    }

    /// All positions of a user, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> DbResult<Vec<BusinessSubscription>> {
        let sql = format!("{SELECT_SUBSCRIPTION} WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC");
        let subs = sqlx::query_as::<_, BusinessSubscription>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        debug!(user_id = %user_id, count = subs.len(), "Listed user subscriptions");
        Ok(subs)
    }

    /// All positions in a business, newest first.
    pub async fn list_for_business(&self, business_id: &str) -> DbResult<Vec<BusinessSubscription>> {
        let sql = format!("{SELECT_SUBSCRIPTION} WHERE business_id = ?1 ORDER BY created_at DESC, rowid DESC");
        let subs = sqlx::query_as::<_, BusinessSubscription>(&sql)
            .bind(business_id)
            .fetch_all(&self.pool)
            .await?;

        debug!(business_id = %business_id, count = subs.len(), "Listed business subscribers");
        Ok(subs)
    }
}

// =============================================================================
// Ledger operations
// =============================================================================

impl LedgerTx {
    /// Reads one position inside the unit.
    pub async fn subscription(
        &mut self,
        user_id: &str,
        business_id: &str,
    ) -> DbResult<Option<BusinessSubscription>> {
        fetch_subscription(self.conn(), user_id, business_id).await
    }

    /// Inserts a new position.
    pub async fn insert_subscription(&mut self, sub: &BusinessSubscription) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO business_subscriptions (
                id, user_id, business_id, tokens_owned, invested_cents, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&sub.id)
        .bind(&sub.user_id)
        .bind(&sub.business_id)
        .bind(sub.tokens_owned)
        .bind(sub.invested_cents)
        .bind(sub.created_at)
        .bind(sub.updated_at)
        .execute(self.conn())
        .await?;

        debug!(subscription_id = %sub.id, user_id = %sub.user_id, "Subscription inserted");
        Ok(())
    }

    /// Overwrites the token count and cost basis of a position.
    pub async fn update_position(
        &mut self,
        sub: &BusinessSubscription,
        tokens_owned: i64,
        invested_cents: i64,
    ) -> DbResult<BusinessSubscription> {
        let updated_at = now();

        let result = sqlx::query(
            r#"
            UPDATE business_subscriptions
            SET tokens_owned = ?1, invested_cents = ?2, updated_at = ?3
            WHERE id = ?4
            "#,
        )
        .bind(tokens_owned)
        .bind(invested_cents)
        .bind(updated_at)
        .bind(&sub.id)
        .execute(self.conn())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Subscription", &sub.id));
        }

        Ok(BusinessSubscription {
            tokens_owned,
            invested_cents,
            updated_at,
            ..sub.clone()
        })
    }

    /// Removes a position.
    pub async fn delete_subscription(&mut self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM business_subscriptions WHERE id = ?1")
            .bind(id)
            .execute(self.conn())
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Subscription", id));
        }

        debug!(subscription_id = %id, "Subscription deleted");
        Ok(())
    }
}

pub(crate) async fn fetch_subscription(
    conn: &mut SqliteConnection,
    user_id: &str,
    business_id: &str,
) -> DbResult<Option<BusinessSubscription>> {
    let sql = format!("{SELECT_SUBSCRIPTION} WHERE user_id = ?1 AND business_id = ?2");
    let sub = sqlx::query_as::<_, BusinessSubscription>(&sql)
        .bind(user_id)
        .bind(business_id)
        .fetch_optional(conn)
        .await?;
    Ok(sub)
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

    async fn setup() -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let business = db
            .businesses()
            .create(NewBusiness {
                owner_id: "owner-1".to_string(),
                name: "Sushi Bar".to_string(),
                ..NewBusiness::default()
            })
            .await
            .unwrap();
        (db, business.id)
    }

    fn position(user_id: &str, business_id: &str) -> BusinessSubscription {
        let ts = now();
        BusinessSubscription {
            id: new_id(),
            user_id: user_id.to_string(),
            business_id: business_id.to_string(),
            tokens_owned: 10,
            invested_cents: 19_000,
            created_at: ts,
            updated_at: ts,
        }
    }

    #[tokio::test]
    async fn test_position_lifecycle() {
        let (db, business_id) = setup().await;
        let sub = position("user-1", &business_id);

        let inserted = sub.clone();
        let updated = db
            .with_transaction(move |tx| {
                Box::pin(async move {
                    tx.insert_subscription(&inserted).await?;
                    tx.update_position(&inserted, 15, 33_165).await
                })
            })
            .await
            .unwrap();
        assert_eq!(updated.tokens_owned, 15);

        let loaded = db.subscriptions().get("user-1", &business_id).await.unwrap().unwrap();
        assert_eq!(loaded.tokens_owned, 15);
        assert_eq!(loaded.invested_cents, 33_165);

        let id = sub.id.clone();
        db.with_transaction(move |tx| Box::pin(async move { tx.delete_subscription(&id).await }))
            .await
            .unwrap();
        assert!(db.subscriptions().get("user-1", &business_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_one_position_per_user_and_business() {
        let (db, business_id) = setup().await;
        let first = position("user-1", &business_id);
        let second = position("user-1", &business_id);

        let err = db
            .with_transaction(move |tx| {
                Box::pin(async move {
                    tx.insert_subscription(&first).await?;
                    tx.insert_subscription(&second).await
                })
            })
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());

        // Rolled back as a whole
        assert!(db.subscriptions().list_for_business(&business_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_listings() {
        let (db, business_id) = setup().await;
        let a = position("user-a", &business_id);
        let b = position("user-b", &business_id);

        db.with_transaction(move |tx| {
            Box::pin(async move {
                tx.insert_subscription(&a).await?;
                tx.insert_subscription(&b).await
            })
        })
        .await
        .unwrap();

        let subs = db.subscriptions().list_for_business(&business_id).await.unwrap();
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].user_id, "user-b");

        let mine = db.subscriptions().list_for_user("user-a").await.unwrap();
        assert_eq!(mine.len(), 1);
    }
}
