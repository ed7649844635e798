//! # Business Repository
//!
//! Registry of businesses that can issue tokens.
//!
//! Businesses are never hard-deleted: tokens, positions and the transaction
//! log reference them. `deactivate` is a soft delete.

use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::{new_id, now};
use crate::unit_of_work::LedgerTx;
use fodi_core::Business;

const SELECT_BUSINESS: &str = r#"
    SELECT id, owner_id, name, description, category, city, is_active, created_at, updated_at
    FROM businesses
"#;

/// Input for creating a business.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBusiness {
    pub owner_id: String,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub city: Option<String>,
}

/// Partial update of a business. `None` leaves a field as it is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub city: Option<String>,
    pub is_active: Option<bool>,
}

impl BusinessUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.city.is_none()
            && self.is_active.is_none()
    }
}

/// Repository for business database operations.
///
/// ## Usage
/// ```rust,ignore
/// let business = db.businesses().create(new_business).await?;
/// let all = db.businesses().list().await?;
/// ```
#[derive(Debug, Clone)]
pub struct BusinessRepository {
    pool: SqlitePool,
}

impl BusinessRepository {
    /// Creates a new BusinessRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BusinessRepository { pool }
    }

    /// Inserts a new active business.
    ///
    /// The name is stored trimmed; callers validate it first.
    pub async fn create(&self, input: NewBusiness) -> DbResult<Business> {
        let ts = now();
        let business = Business {
            id: new_id(),
            owner_id: input.owner_id,
            name: input.name.trim().to_string(),
            description: input.description,
            category: input.category,
            city: input.city,
            is_active: true,
            created_at: ts,
            updated_at: ts,
        };

        sqlx::query(
            r#"
            INSERT INTO businesses (
                id, owner_id, name, description, category, city,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&business.id)
        .bind(&business.owner_id)
        .bind(&business.name)
        .bind(&business.description)
        .bind(&business.category)
        .bind(&business.city)
        .bind(business.is_active)
        .bind(business.created_at)
        .bind(business.updated_at)
        .execute(&self.pool)
        .await?;

        info!(business_id = %business.id, name = %business.name, "Business created");
        Ok(business)
    }

    /// Gets a business by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Business))` - found (active or not)
    /// * `Ok(None)` - not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Business>> {
        let mut conn = self.pool.acquire().await?;
        fetch_business(&mut conn, id).await
    }

    /// Lists active businesses, newest first.
    pub async fn list(&self) -> DbResult<Vec<Business>> {
        let sql = format!("{SELECT_BUSINESS} WHERE is_active = 1 ORDER BY created_at DESC, rowid DESC");
        let businesses = sqlx::query_as::<_, Business>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = businesses.len(), "Listed businesses");
        Ok(businesses)
    }

    /// Applies the fields present in `changes` in one UPDATE.
    ///
    /// ## Returns
    /// The updated business, or `DbError::NotFound`.
    pub async fn update(&self, id: &str, changes: BusinessUpdate) -> DbResult<Business> {
        let name = changes.name.as_deref().map(str::trim);

        let result = sqlx::query(
            r#"
            UPDATE businesses SET
                name        = COALESCE(?1, name),
                description = COALESCE(?2, description),
                category    = COALESCE(?3, category),
                city        = COALESCE(?4, city),
                is_active   = COALESCE(?5, is_active),
                updated_at  = ?6
            WHERE id = ?7
            "#,
        )
        .bind(name)
        .bind(&changes.description)
        .bind(&changes.category)
        .bind(&changes.city)
        .bind(changes.is_active)
        .bind(now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Business", id));
        }

        info!(business_id = %id, "Business updated");
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Business", id))
    }

    /// Soft-deletes a business.
    ///
    /// ## Returns
    /// The updated business, or `DbError::NotFound`.
    pub async fn deactivate(&self, id: &str) -> DbResult<Business> {
        let result = sqlx::query("UPDATE businesses SET is_active = 0, updated_at = ?1 WHERE id = ?2")
            .bind(now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Business", id));
        }

        info!(business_id = %id, "Business deactivated");
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Business", id))
    }
}

// =============================================================================
// Ledger operations
// =============================================================================

impl LedgerTx {
    /// Reads a business inside the unit.
    pub async fn business(&mut self, id: &str) -> DbResult<Option<Business>> {
        fetch_business(self.conn(), id).await
    }
}

pub(crate) async fn fetch_business(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Business>> {
    let sql = format!("{SELECT_BUSINESS} WHERE id = ?1");
    let business = sqlx::query_as::<_, Business>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(business)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    fn pizza() -> NewBusiness {
        NewBusiness {
            owner_id: "owner-1".to_string(),
            name: "  Pizza Palace ".to_string(),
            city: Some("Kyiv".to_string()),
            ..NewBusiness::default()
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let created = db.businesses().create(pizza()).await.unwrap();

        assert_eq!(created.name, "Pizza Palace");
        assert!(created.is_active);

        let loaded = db.businesses().get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(loaded, created);

        assert!(db.businesses().get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_newest_first_and_deactivate() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let first = db.businesses().create(pizza()).await.unwrap();
        let second = db
            .businesses()
            .create(NewBusiness {
                owner_id: "owner-2".to_string(),
                name: "Burger Barn".to_string(),
                ..NewBusiness::default()
            })
            .await
            .unwrap();

        let listed = db.businesses().list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);

        let deactivated = db.businesses().deactivate(&first.id).await.unwrap();
        assert!(!deactivated.is_active);

        let listed = db.businesses().list().await.unwrap();
        assert_eq!(listed.len(), 1);

        let err = db.businesses().deactivate("missing").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_partial_update() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let created = db.businesses().create(pizza()).await.unwrap();

        let updated = db
            .businesses()
            .update(
                &created.id,
                BusinessUpdate {
                    name: Some(" Pizza Piazza ".to_string()),
                    category: Some("italian".to_string()),
                    ..BusinessUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Pizza Piazza");
        assert_eq!(updated.category.as_deref(), Some("italian"));
        // Untouched fields survive
        assert_eq!(updated.city.as_deref(), Some("Kyiv"));
        assert!(updated.is_active);

        let hidden = db
            .businesses()
            .update(
                &created.id,
                BusinessUpdate {
                    is_active: Some(false),
                    ..BusinessUpdate::default()
                },
            )
            .await
            .unwrap();
        assert!(!hidden.is_active);
        assert_eq!(hidden.name, "Pizza Piazza");

        let err = db
            .businesses()
            .update("missing", BusinessUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
