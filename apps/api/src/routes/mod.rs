//! HTTP routes, grouped by resource.
//!
//! Every handler returns `ApiResult<_>`; success bodies are JSON envelopes
//! with a `message` plus the resource(s).

pub mod businesses;
pub mod health;
pub mod subscriptions;
pub mod tokens;
pub mod transactions;

use axum::routing::{delete, get, post};
use axum::Router;

use crate::hub::ws_handler;
use crate::AppState;

/// All routes below `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        // Businesses
        .route("/businesses", get(businesses::list).post(businesses::create))
        .route(
            "/businesses/{id}",
            get(businesses::get)
                .put(businesses::update)
                .delete(businesses::deactivate),
        )
        // Tokens
        .route("/businesses/{id}/tokens", get(tokens::get).post(tokens::create))
        .route("/businesses/{id}/tokens/mint", post(tokens::mint))
        .route("/businesses/{id}/tokens/burn", post(tokens::burn))
        .route("/businesses/{id}/tokens/recalculate-price", post(tokens::recalculate_price))
        // Subscriptions
        .route("/businesses/{id}/subscribe", post(subscriptions::subscribe))
        .route("/businesses/{id}/unsubscribe", delete(subscriptions::unsubscribe))
        .route("/businesses/{id}/subscribers", get(subscriptions::business_subscribers))
        .route("/users/{id}/subscriptions", get(subscriptions::user_subscriptions))
        .route("/subscriptions/stats", get(subscriptions::stats))
        // Transactions
        .route("/businesses/{id}/transactions", get(transactions::business_transactions))
        .route("/users/{id}/transactions", get(transactions::user_transactions))
        .route("/transactions/analytics", get(transactions::analytics))
        .route("/businesses/{id}/metrics", get(transactions::business_metrics))
        // Admin notifications
        .route("/admin/ws", get(ws_handler))
}
