//! Business registry routes.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::auth::{AdminUser, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use fodi_db::{BusinessUpdate, NewBusiness};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBusinessRequest {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub city: Option<String>,
}

/// `GET /api/businesses`
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let businesses = state.market.businesses().list().await?;

    Ok(Json(json!({
        "message": "Businesses fetched",
        "count": businesses.len(),
        "businesses": businesses,
    })))
}

/// `POST /api/businesses` - the caller becomes the owner.
///
/// Also issues the initial token; `token` is null if that failed.
pub async fn create(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    body: Result<Json<CreateBusinessRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(body) = body?;

    let created = state
        .market
        .businesses()
        .create(NewBusiness {
            owner_id: claims.sub,
            name: body.name,
            description: body.description,
            category: body.category,
            city: body.city,
        })
        .await?;

    info!(business_id = %created.business.id, owner = %created.business.owner_id, "Business registered via API");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Business created",
            "business": created.business,
            "token": created.token,
        })),
    ))
}

/// `GET /api/businesses/{id}`
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let business = state.market.businesses().get(&id).await?;
    Ok(Json(json!({ "message": "Business fetched", "business": business })))
}

/// `PUT /api/businesses/{id}` - partial update by the owner or an admin.
///
/// Body fields (`name`, `description`, `category`, `city`, `isActive`) are
/// all optional; absent ones keep their value.
pub async fn update(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
    body: Result<Json<BusinessUpdate>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(changes) = body?;
    let registry = state.market.businesses();

    let current = registry.get(&id).await?;
    if current.owner_id != claims.sub && !claims.is_admin() {
        return Err(ApiError::forbidden("Only the owner or an admin can update a business"));
    }

    let business = registry.update(&id, changes).await?;
    info!(business_id = %id, by = %claims.sub, "Business updated via API");

    Ok(Json(json!({ "message": "Business updated", "business": business })))
}

/// `DELETE /api/businesses/{id}` - soft delete.
pub async fn deactivate(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let business = state.market.businesses().deactivate(&id).await?;
    info!(business_id = %id, admin = %admin.sub, "Business deactivated via API");

    Ok(Json(json!({ "message": "Business deactivated", "business": business })))
}
