//! # Fodi API Server
//!
//! REST + WebSocket server for the Fodi token market.
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ServerConfig::load ──► Database::new (migrations) ──► AppState         │
//! │                                                          │              │
//! │  axum::serve(router) ◄───────────────────────────────────┘              │
//! │        │                                                                │
//! │  Ctrl+C / SIGTERM ──► close admin sockets ──► drain ──► close pool     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use fodi_api::{build_router, AppState, ServerConfig};
use fodi_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    info!("Starting Fodi API server...");

    // Load configuration
    let config = ServerConfig::load().context("failed to load configuration")?;
    info!(
        addr = %config.bind_address(),
        database = %config.database_path,
        base_price_cents = config.pricing.base_price_cents,
        "Configuration loaded"
    );
    if config.uses_dev_secret() {
        warn!("JWT_SECRET not set, using the development secret");
    }

    // Connect to database (runs migrations)
    let db = Database::new(
        DbConfig::new(&config.database_path)
            .max_connections(config.db_max_connections)
            .busy_timeout(Duration::from_secs(5)),
    )
    .await
    .context("failed to open database")?;
    info!("Database ready");

    let state = AppState::new(db.clone(), &config);
    let hub = state.hub.clone();
    let app = build_router(state, &config.allowed_origins);

    let listener = TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address()))?;
    info!(addr = %config.bind_address(), "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            // Sockets end once their channels close
            hub.close_all();
        })
        .await
        .context("server error")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(?e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(?e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
