//! # Fodi API
//!
//! REST + WebSocket server for the Fodi token market.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           API Routes                                    │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  businesses    │  │  tokens        │  │  subscriptions             ││
//! │  │                │  │  (admin)       │  │                            ││
//! │  │ • list / get   │  │ • create       │  │ • subscribe (user)         ││
//! │  │ • create / put │  │ • mint / burn  │  │ • unsubscribe (user)       ││
//! │  │ • deactivate   │  │ • recalculate  │  │ • subscribers / stats      ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐                                │
//! │  │  transactions  │  │  admin ws      │                                │
//! │  │                │  │                │                                │
//! │  │ • logs + stats │  │ • live market  │                                │
//! │  │ • daily/metrics│  │   events       │                                │
//! │  └────────────────┘  └────────────────┘                                │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      Infrastructure                               │  │
//! │  │                                                                   │  │
//! │  │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────────────┐│  │
//! │  │  │  fodi-market │  │ Notification │  │    JWT Auth              ││  │
//! │  │  │  (SQLite)    │  │ Hub          │  │    Bearer / ?token=      ││  │
//! │  │  └──────────────┘  └──────────────┘  └──────────────────────────┘│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! See [`config`] for the environment variables.

pub mod auth;
pub mod config;
pub mod error;
pub mod hub;
pub mod routes;

use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use fodi_db::Database;
use fodi_market::Market;

// Re-exports
pub use auth::JwtManager;
pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use hub::NotificationHub;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub market: Market,
    pub db: Database,
    pub hub: Arc<NotificationHub>,
    pub jwt: JwtManager,
}

impl AppState {
    /// Wires the engine to the hub so committed events reach admin sockets.
    pub fn new(db: Database, config: &ServerConfig) -> Self {
        let hub = Arc::new(NotificationHub::new(config.ws_client_buffer));
        let market = Market::new(db.clone(), config.pricing, hub.clone());

        AppState {
            market,
            db,
            hub,
            jwt: JwtManager::new(&config.jwt_secret),
        }
    }
}

/// Builds the full router with CORS and request tracing.
pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .nest("/api", routes::api_routes())
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    if allowed_origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    cors.allow_origin(AllowOrigin::list(origins))
}
