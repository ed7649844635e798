//! # Business Registry
//!
//! Businesses that can issue tokens. Creating one also issues its initial
//! token; deleting one is a soft delete.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use ts_rs::TS;

use crate::error::{MarketError, MarketResult};
use crate::token_service::TokenService;
use fodi_core::validation::{validate_business_name, validate_id};
use fodi_core::{Business, BusinessToken};
use fodi_db::{BusinessUpdate, Database, NewBusiness};

/// A freshly registered business and its initial token, if minting worked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BusinessCreated {
    pub business: Business,
    pub token: Option<BusinessToken>,
}

#[derive(Clone)]
pub struct BusinessService {
    db: Database,
    tokens: TokenService,
}

impl BusinessService {
    pub fn new(db: Database, tokens: TokenService) -> Self {
        BusinessService { db, tokens }
    }

    /// Registers a business and mints its initial token.
    ///
    /// A failed initial mint does not undo the business; the token can be
    /// issued later through `mint_initial` or `create_token`.
    pub async fn create(&self, input: NewBusiness) -> MarketResult<BusinessCreated> {
        validate_business_name(&input.name)?;
        validate_id("ownerId", &input.owner_id)?;

        let business = self.db.businesses().create(input).await?;

        let token = match self.tokens.mint_initial(&business.id).await {
            Ok(token) => Some(token),
            Err(err) => {
                warn!(business_id = %business.id, error = %err, "Initial token mint failed");
                None
            }
        };

        Ok(BusinessCreated { business, token })
    }

    pub async fn get(&self, id: &str) -> MarketResult<Business> {
        self.db
            .businesses()
            .get_by_id(id)
            .await?
            .ok_or_else(|| MarketError::not_found("Business", id))
    }

    /// Active businesses, newest first.
    pub async fn list(&self) -> MarketResult<Vec<Business>> {
        Ok(self.db.businesses().list().await?)
    }

    /// Changes only the fields present in `changes`.
    ///
    /// A present name must pass the same rules as on create. An empty update
    /// returns the business unchanged.
    pub async fn update(&self, id: &str, changes: BusinessUpdate) -> MarketResult<Business> {
        if let Some(name) = &changes.name {
            validate_business_name(name)?;
        }
        if changes.is_empty() {
            return self.get(id).await;
        }

        let business = self.db.businesses().update(id, changes).await?;
        info!(business_id = %id, name = %business.name, active = business.is_active, "Business details changed");
        Ok(business)
    }

    pub async fn deactivate(&self, id: &str) -> MarketResult<Business> {
        let business = self.db.businesses().deactivate(id).await?;
        info!(business_id = %id, "Business removed from listings");
        Ok(business)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
