//! Ledger listings and analytics.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::AppState;
use fodi_market::analytics::DEFAULT_ANALYTICS_DAYS;
use fodi_market::LedgerQuery;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    pub business_id: Option<String>,
    pub days: Option<i64>,
}

/// `GET /api/businesses/{id}/transactions?type=&limit=`
pub async fn business_transactions(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<LedgerQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(query) = query?;
    let analytics = state.market.analytics();

    let transactions = analytics.business_transactions(&id, query).await?;
    let stats = analytics.business_stats(&id).await?;

    Ok(Json(json!({
        "message": "Business transactions fetched",
        "count": transactions.len(),
        "transactions": transactions,
        "stats": stats,
    })))
}

/// `GET /api/users/{id}/transactions?type=&businessId=&limit=`
pub async fn user_transactions(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<LedgerQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(query) = query?;
    let analytics = state.market.analytics();

    let transactions = analytics.user_transactions(&id, query).await?;
    let stats = analytics.user_stats(&id).await?;

    Ok(Json(json!({
        "message": "User transactions fetched",
        "count": transactions.len(),
        "transactions": transactions,
        "stats": stats,
    })))
}

/// `GET /api/transactions/analytics?businessId=&days=`
pub async fn analytics(
    State(state): State<AppState>,
    query: Result<Query<AnalyticsQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(query) = query?;
    let business_id = query
        .business_id
        .ok_or_else(|| ApiError::validation("businessId query parameter required"))?;

    let daily = state
        .market
        .analytics()
        .daily_stats(&business_id, query.days)
        .await?;

    Ok(Json(json!({
        "message": "Transaction analytics fetched",
        "businessId": business_id,
        "days": query.days.unwrap_or(DEFAULT_ANALYTICS_DAYS),
        "daily": daily,
    })))
}

/// `GET /api/businesses/{id}/metrics`
pub async fn business_metrics(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let metrics = state.market.analytics().business_metrics(&id).await?;

    Ok(Json(json!({
        "message": "Business metrics calculated",
        "metrics": metrics,
    })))
}
