//! Subscription routes: buying in, selling out, position reads.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    pub tokens_amount: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    pub business_id: Option<String>,
    pub user_id: Option<String>,
}

/// `POST /api/businesses/{id}/subscribe` - buys tokens for the caller.
pub async fn subscribe(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
    body: Result<Json<SubscribeRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(body) = body?;

    let receipt = state
        .market
        .subscriptions()
        .subscribe(&claims.sub, &id, body.tokens_amount)
        .await?;

    Ok(Json(json!({
        "message": "Successfully subscribed to business",
        "subscription": receipt.subscription,
        "transaction": receipt.transaction,
        "token": receipt.token,
    })))
}

/// `DELETE /api/businesses/{id}/unsubscribe` - sells the caller's whole position.
pub async fn unsubscribe(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let receipt = state.market.subscriptions().unsubscribe(&claims.sub, &id).await?;

    Ok(Json(json!({
        "message": "Successfully unsubscribed from business",
        "subscription": receipt.subscription,
        "transaction": receipt.transaction,
        "token": receipt.token,
    })))
}

/// `GET /api/businesses/{id}/subscribers`
pub async fn business_subscribers(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let subs = state.market.subscriptions().get_business_subscribers(&id).await?;

    Ok(Json(json!({
        "message": "Business subscribers fetched",
        "businessId": subs.business_id,
        "subscriberCount": subs.subscriber_count,
        "totalInvestedCents": subs.total_invested_cents,
        "totalTokensSold": subs.total_tokens_sold,
        "subscribers": subs.subscribers,
    })))
}

/// `GET /api/users/{id}/subscriptions`
pub async fn user_subscriptions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let subscriptions = state.market.subscriptions().get_user_subscriptions(&id).await?;

    Ok(Json(json!({
        "message": "User subscriptions fetched",
        "count": subscriptions.len(),
        "subscriptions": subscriptions,
    })))
}

/// `GET /api/subscriptions/stats?businessId=..&userId=..`
pub async fn stats(
    State(state): State<AppState>,
    query: Result<Query<StatsQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(query) = query?;
    let (Some(business_id), Some(user_id)) = (query.business_id, query.user_id) else {
        return Err(ApiError::validation(
            "Both businessId and userId query parameters required",
        ));
    };

    let stats = state
        .market
        .subscriptions()
        .get_subscription_stats(&user_id, &business_id)
        .await?;

    Ok(Json(json!({ "message": "Subscription stats fetched", "stats": stats })))
}
