//! Shared health state for the /health endpoint.
//! Updated by the refresher and the fetcher, read by the API.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Default)]
pub struct HealthState {
    /// True when the last refresh reached the backend.
    pub backend_reachable: AtomicBool,
    /// True when serving the bundled datasets.
    pub mock_mode: AtomicBool,
    /// Unix millis of the last successful refresh (0 = none).
    pub last_refresh_at_ms: AtomicU64,
    /// Refresh cycles where at least one dataset failed.
    pub refresh_failures: AtomicU64,
    /// Movements whose direction label disagrees with the sign of the change.
    pub direction_mismatches: AtomicU64,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_backend_reachable(&self, v: bool) {
        self.backend_reachable.store(v, Ordering::Relaxed);
    }

    pub fn set_mock_mode(&self, v: bool) {
        self.mock_mode.store(v, Ordering::Relaxed);
    }

    pub fn set_last_refresh_at_ms(&self, ms: u64) {
        self.last_refresh_at_ms.store(ms, Ordering::Relaxed);
    }

    pub fn inc_refresh_failures(&self) {
        self.refresh_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_direction_mismatches(&self, n: u64) {
        self.direction_mismatches.fetch_add(n, Ordering::Relaxed);
    }

    pub fn backend_reachable(&self) -> bool {
        self.backend_reachable.load(Ordering::Relaxed)
    }

    pub fn mock_mode(&self) -> bool {
        self.mock_mode.load(Ordering::Relaxed)
    }

    pub fn last_refresh_at_ms(&self) -> u64 {
        self.last_refresh_at_ms.load(Ordering::Relaxed)
    }

    pub fn refresh_failures(&self) -> u64 {
        self.refresh_failures.load(Ordering::Relaxed)
    }

    pub fn direction_mismatches(&self) -> u64 {
        self.direction_mismatches.load(Ordering::Relaxed)
    }
}
