//! # Admin Notification Hub
//!
//! Pushes committed market events to connected admin dashboards.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  fodi-market ──publish(MarketEvent)──► NotificationHub                 │
//! │                                            │                            │
//! │                           serialize once ──┤                            │
//! │                                            │ try_send (never blocks)    │
//! │                    ┌───────────────────────┼───────────────────────┐    │
//! │                    ▼                       ▼                       ▼    │
//! │             ┌────────────┐          ┌────────────┐          ┌──────────┐│
//! │             │ mpsc (64)  │          │ mpsc (64)  │          │ full ──► ││
//! │             │ socket #1  │          │ socket #2  │          │ dropped  ││
//! │             └────────────┘          └────────────┘          └──────────┘│
//! │                                                                         │
//! │  GET /api/admin/ws?token=<jwt>  (admin role)                           │
//! │   1. "connected" welcome frame                                          │
//! │   2. forwards hub frames                                                │
//! │   3. pings every 30s                                                    │
//! │   4. unregisters on close or error                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Frames are JSON: `{"type": "tokens_minted", "data": {...}}`.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use axum::extract::ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::extract_bearer_token;
use crate::error::ApiError;
use crate::AppState;
use fodi_core::MarketEvent;
use fodi_market::EventPublisher;

/// Ping interval to keep connections alive.
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// Maximum inbound message size; admins only ever send control frames.
const MAX_MESSAGE_SIZE: usize = 64 * 1024;

// =============================================================================
// Hub
// =============================================================================

/// Registry of admin sockets, one bounded channel each.
#[derive(Debug)]
pub struct NotificationHub {
    clients: RwLock<HashMap<Uuid, mpsc::Sender<String>>>,
    buffer: usize,
}

impl NotificationHub {
    /// `buffer` frames may queue per client before it is dropped.
    pub fn new(buffer: usize) -> Self {
        NotificationHub {
            clients: RwLock::new(HashMap::new()),
            buffer: buffer.max(1),
        }
    }

    /// Adds a client. Frames for it arrive on the returned receiver.
    pub fn register(&self) -> (Uuid, mpsc::Receiver<String>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(self.buffer);

        let mut clients = self.clients.write().unwrap_or_else(PoisonError::into_inner);
        clients.insert(id, tx);
        info!(client_id = %id, clients = clients.len(), "Admin client registered");

        (id, rx)
    }

    /// Removes a client. Returns whether it was registered.
    pub fn unregister(&self, id: Uuid) -> bool {
        let mut clients = self.clients.write().unwrap_or_else(PoisonError::into_inner);
        let removed = clients.remove(&id).is_some();
        if removed {
            info!(client_id = %id, clients = clients.len(), "Admin client unregistered");
        }
        removed
    }

    pub fn client_count(&self) -> usize {
        self.clients.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Drops every client channel; their sockets then close.
    pub fn close_all(&self) {
        let mut clients = self.clients.write().unwrap_or_else(PoisonError::into_inner);
        let count = clients.len();
        clients.clear();
        info!(clients = count, "Closed all admin connections");
    }

    /// Queues `frame` for every client, dropping the ones that are full or
    /// gone. Returns how many took it.
    fn send_frame(&self, frame: String) -> usize {
        let mut delivered = 0;
        let mut stale = Vec::new();

        {
            let clients = self.clients.read().unwrap_or_else(PoisonError::into_inner);
            for (id, tx) in clients.iter() {
                match tx.try_send(frame.clone()) {
                    Ok(()) => delivered += 1,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        warn!(client_id = %id, "Admin client too slow, dropping");
                        stale.push(*id);
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => stale.push(*id),
                }
            }
        }

        if !stale.is_empty() {
            let mut clients = self.clients.write().unwrap_or_else(PoisonError::into_inner);
            for id in &stale {
                clients.remove(id);
            }
            debug!(removed = stale.len(), "Pruned admin clients");
        }

        delivered
    }
}

impl EventPublisher for NotificationHub {
    fn publish(&self, event: MarketEvent) {
        // MarketEvent already serializes as {"type", "data"}
        match serde_json::to_string(&event) {
            Ok(frame) => {
                let delivered = self.send_frame(frame);
                debug!(kind = event.kind(), business_id = %event.business_id(), delivered, "Event broadcast");
            }
            Err(e) => warn!(kind = event.kind(), ?e, "Failed to serialize event"),
        }
    }
}

// =============================================================================
// WebSocket Handler
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct WsParams {
    token: Option<String>,
}

/// `GET /api/admin/ws` - admin notification socket.
///
/// The JWT comes from `?token=` (browsers cannot set headers on a socket)
/// or from a Bearer header.
pub async fn ws_handler(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    headers: HeaderMap,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, ApiError> {
    let token = params
        .token
        .or_else(|| {
            headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(extract_bearer_token)
                .map(str::to_string)
        })
        .ok_or_else(|| ApiError::unauthorized("Missing token"))?;

    let claims = state.jwt.validate(&token)?;
    if !claims.is_admin() {
        return Err(ApiError::forbidden("Admin role required"));
    }

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return Ok(rejection.into_response()),
    };

    info!(admin = %claims.sub, "Admin WebSocket connection");
    let hub = state.hub.clone();
    Ok(ws
        .max_message_size(MAX_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_socket(socket, hub, claims.sub)))
}

async fn handle_socket(socket: WebSocket, hub: std::sync::Arc<NotificationHub>, admin: String) {
    let (id, mut frames) = hub.register();
    let (mut sender, mut receiver) = socket.split();

    let welcome = serde_json::json!({
        "type": "connected",
        "data": { "clientId": id, "message": "Connected to Fodi market notifications" },
    });
    if sender.send(Message::Text(welcome.to_string().into())).await.is_err() {
        hub.unregister(id);
        return;
    }

    let mut ping = interval(PING_INTERVAL);
    // First tick completes immediately
    ping.tick().await;

    loop {
        tokio::select! {
            frame = frames.recv() => match frame {
                Some(text) => {
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                // Dropped by the hub (slow client or shutdown)
                None => break,
            },
            _ = ping.tick() => {
                if sender.send(Message::Ping(axum::body::Bytes::new())).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => {
                    info!(admin = %admin, client_id = %id, "Admin disconnected");
                    break;
                }
                Some(Err(e)) => {
                    warn!(admin = %admin, client_id = %id, ?e, "WebSocket error");
                    break;
                }
                Some(Ok(_)) => {}
            },
        }
    }

    hub.unregister(id);
    let _ = sender.send(Message::Close(None)).await;
}
