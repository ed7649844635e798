//! Token lifecycle routes. Everything but the read requires an admin.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::auth::AdminUser;
use crate::error::ApiResult;
use crate::AppState;

const DEFAULT_MINT_REASON: &str = "Manual mint";
const DEFAULT_BURN_REASON: &str = "Manual burn";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTokenRequest {
    pub symbol: String,
    /// Omitted or ≤ 0 → base price
    #[serde(default)]
    pub initial_price_cents: i64,
    pub total_supply: i64,
}

#[derive(Debug, Deserialize)]
pub struct SupplyChangeRequest {
    pub amount: i64,
    pub reason: Option<String>,
}

impl SupplyChangeRequest {
    fn reason_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(default)
    }
}

/// `GET /api/businesses/{id}/tokens`
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let token = state.market.tokens().get_business_token(&id).await?;
    Ok(Json(json!({ "message": "Token fetched", "token": token })))
}

/// `POST /api/businesses/{id}/tokens`
pub async fn create(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    body: Result<Json<CreateTokenRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(body) = body?;

    let token = state
        .market
        .tokens()
        .create_token(&id, &body.symbol, body.initial_price_cents, body.total_supply)
        .await?;
    info!(business_id = %id, admin = %admin.sub, symbol = %token.symbol, "Token created via API");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Token created", "token": token })),
    ))
}

/// `POST /api/businesses/{id}/tokens/mint`
pub async fn mint(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    body: Result<Json<SupplyChangeRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(body) = body?;
    let reason = body.reason_or(DEFAULT_MINT_REASON);

    let token = state.market.tokens().mint_tokens(&id, body.amount, reason).await?;
    info!(business_id = %id, admin = %admin.sub, amount = body.amount, "Mint via API");

    Ok(Json(json!({
        "message": "Tokens minted",
        "amount": body.amount,
        "reason": reason,
        "token": token,
    })))
}

/// `POST /api/businesses/{id}/tokens/burn`
pub async fn burn(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    body: Result<Json<SupplyChangeRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(body) = body?;
    let reason = body.reason_or(DEFAULT_BURN_REASON);

    let token = state.market.tokens().burn_tokens(&id, body.amount, reason).await?;
    info!(business_id = %id, admin = %admin.sub, amount = body.amount, "Burn via API");

    Ok(Json(json!({
        "message": "Tokens burned",
        "amount": body.amount,
        "reason": reason,
        "token": token,
    })))
}

/// `POST /api/businesses/{id}/tokens/recalculate-price`
pub async fn recalculate_price(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let token = state.market.tokens().recalculate_price(&id).await?;
    Ok(Json(json!({ "message": "Token price recalculated", "token": token })))
}
