//! # Event Publishing
//!
//! The engine's only view of notifications. Services call
//! [`EventPublisher::publish`] after a unit commits; what happens next (the
//! WebSocket hub in fodi-api, nothing at all in the seed tool) is the
//! publisher's business.
//!
//! `publish` is synchronous and must not block: implementations hand the
//! event off and return.

use fodi_core::MarketEvent;

/// Receives committed market events.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: MarketEvent);
}

/// Publisher that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPublisher;

impl EventPublisher for NoopPublisher {
    fn publish(&self, _event: MarketEvent) {}
}

/// Collects events in memory (tests).
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingPublisher {
    events: std::sync::Mutex<Vec<MarketEvent>>,
}

#[cfg(test)]
impl RecordingPublisher {
    pub(crate) fn kinds(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .map(|events| events.iter().map(MarketEvent::kind).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
impl EventPublisher for RecordingPublisher {
    fn publish(&self, event: MarketEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
