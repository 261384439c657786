use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::time::interval;
use tracing::{error, info, warn};

use crate::api::health::HealthState;
use crate::fetcher::ApiClient;
use crate::mock;
use crate::state::SnapshotStore;

/// Keeps the snapshot store current. With a backend it polls on a fixed
/// interval; in mock mode it loads the bundled datasets once.
pub struct DataRefresher {
    client: Option<ApiClient>,
    store: Arc<SnapshotStore>,
    health: Arc<HealthState>,
    interval_secs: u64,
}

impl DataRefresher {
    pub fn new(
        client: ApiClient,
        store: Arc<SnapshotStore>,
        health: Arc<HealthState>,
        interval_secs: u64,
    ) -> Self {
        Self { client: Some(client), store, health, interval_secs }
    }

    pub fn mock(store: Arc<SnapshotStore>, health: Arc<HealthState>) -> Self {
        Self { client: None, store, health, interval_secs: 0 }
    }

    pub async fn run(self) {
        if self.client.is_none() {
            self.refresh_once().await;
            return;
        }

        let mut ticker = interval(Duration::from_secs(self.interval_secs.max(1)));
        loop {
            ticker.tick().await;
            self.refresh_once().await;
        }
    }

    /// Fetch all three datasets concurrently and swap in each one that
    /// arrived. A failed dataset keeps its previous snapshot.
    pub async fn refresh_once(&self) {
        let Some(client) = &self.client else {
            self.load_mock();
            return;
        };

        let (events, movements, smart_money) = tokio::join!(
            client.fetch_events(),
            client.fetch_odds_movements(),
            client.fetch_smart_money(),
        );

        let mut failures = 0u32;

        match events {
            Ok((events, stats)) => {
                if stats.rejected > 0 {
                    warn!(rejected = stats.rejected, "events without an id were skipped");
                }
                info!(
                    events = events.len(),
                    pages = stats.pages,
                    api_total = stats.api_total,
                    "events refreshed"
                );
                self.store.replace_events(events);
            }
            Err(e) => {
                failures += 1;
                error!("Events refresh failed: {e}");
            }
        }

        match movements {
            Ok((movements, stats)) => {
                if stats.direction_mismatches > 0 {
                    warn!(
                        mismatches = stats.direction_mismatches,
                        total = stats.api_total,
                        "movement directions disagree with change sign"
                    );
                    self.health.add_direction_mismatches(stats.direction_mismatches as u64);
                }
                info!(movements = movements.len(), "odds movements refreshed");
                self.store.replace_movements(movements);
            }
            Err(e) => {
                failures += 1;
                error!("Odds movements refresh failed: {e}");
            }
        }

        match smart_money {
            Ok(movements) => {
                info!(movements = movements.len(), "smart money refreshed");
                self.store.replace_smart_money(movements);
            }
            Err(e) => {
                failures += 1;
                error!("Smart money refresh failed: {e}");
            }
        }

        // Reachable as long as one dataset came back.
        self.health.set_backend_reachable(failures < 3);
        if failures > 0 {
            self.health.inc_refresh_failures();
        } else {
            self.health.set_last_refresh_at_ms(now_ms());
        }
    }

    fn load_mock(&self) {
        self.store.replace_events(mock::events());
        self.store.replace_movements(mock::odds_movements());
        self.store.replace_smart_money(mock::smart_money_movements());
        self.health.set_mock_mode(true);
        self.health.set_last_refresh_at_ms(now_ms());
        info!(
            events = self.store.event_count(),
            movements = self.store.movement_count(),
            smart_money = self.store.smart_money_count(),
            "Loaded mock datasets"
        );
    }
}

pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
