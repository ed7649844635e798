//! Fixtures shared by the unit tests of this crate.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::events::RecordingPublisher;
use crate::Market;
use fodi_core::{Business, PricingConfig};
use fodi_db::{Database, DbConfig, NewBusiness};

/// A market over a fresh in-memory database, recording its events.
pub(crate) async fn setup() -> (Market, Arc<RecordingPublisher>) {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let events = Arc::new(RecordingPublisher::default());
    let market = Market::new(db, PricingConfig::default(), events.clone());
    (market, events)
}

/// A market over a WAL database file with a real connection pool, for
/// tests that need units running side by side.
pub(crate) async fn setup_file_backed(dir: &Path) -> Market {
    let config = DbConfig::new(dir.join("market.db"))
        .max_connections(8)
        .busy_timeout(Duration::from_secs(30));
    let db = Database::new(config).await.unwrap();
    Market::new(db, PricingConfig::default(), Arc::new(RecordingPublisher::default()))
}

/// Inserts a business without issuing its token.
pub(crate) async fn create_business(market: &Market, name: &str) -> Business {
    market
        .db()
        .businesses()
        .create(NewBusiness {
            owner_id: "owner-1".into(),
            name: name.into(),
            ..Default::default()
        })
        .await
        .unwrap()
}
