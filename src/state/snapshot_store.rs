use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use dashmap::DashMap;

use crate::types::{Event, EventPatch, OddsMovement, SmartMoneyMovement};

// ---------------------------------------------------------------------------
// SnapshotStore
// ---------------------------------------------------------------------------

/// Latest datasets pulled from the backend. Written by the refresher, read by
/// the view API.
///
/// Events are keyed by id for O(1) lookup and patching. Each entry carries the
/// sequence number it was stored under so `events()` can return them in
/// upstream order. Movement lists are only ever swapped whole, so they sit
/// behind a lock as `Arc<Vec<_>>` and readers take a cheap clone.
pub struct SnapshotStore {
    /// event_id → (insertion seq, event)
    events: DashMap<String, (u64, Event)>,
    next_seq: AtomicU64,
    movements: RwLock<Arc<Vec<OddsMovement>>>,
    smart_money: RwLock<Arc<Vec<SmartMoneyMovement>>>,
}

impl SnapshotStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Replace the event snapshot. Ids missing from `events` are dropped;
    /// the rest are upserted so readers never observe an empty store mid-swap.
    pub fn replace_events(&self, events: Vec<Event>) {
        let fresh: HashSet<String> = events.iter().map(|e| e.id.clone()).collect();
        self.events.retain(|id, _| fresh.contains(id));
        for event in events {
            let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
            self.events.insert(event.id.clone(), (seq, event));
        }
    }

    /// All events in the order they were last stored.
    pub fn events(&self) -> Vec<Event> {
        let mut entries: Vec<(u64, Event)> = self
            .events
            .iter()
            .map(|e| (e.value().0, e.value().1.clone()))
            .collect();
        entries.sort_by_key(|(seq, _)| *seq);
        entries.into_iter().map(|(_, event)| event).collect()
    }

    pub fn event(&self, id: &str) -> Option<Event> {
        self.events.get(id).map(|e| e.value().1.clone())
    }

    /// Apply a partial update to one event, keeping its position. Returns the
    /// updated event, or None when the id is unknown.
    pub fn patch_event(&self, id: &str, patch: &EventPatch) -> Option<Event> {
        let mut entry = self.events.get_mut(id)?;
        let updated = entry.1.apply_patch(patch);
        entry.1 = updated.clone();
        Some(updated)
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn replace_movements(&self, movements: Vec<OddsMovement>) {
        let mut slot = self.movements.write().unwrap_or_else(|e| e.into_inner());
        *slot = Arc::new(movements);
    }

    pub fn movements(&self) -> Arc<Vec<OddsMovement>> {
        Arc::clone(&self.movements.read().unwrap_or_else(|e| e.into_inner()))
    }

    pub fn movement_count(&self) -> usize {
        self.movements().len()
    }

    pub fn replace_smart_money(&self, movements: Vec<SmartMoneyMovement>) {
        let mut slot = self.smart_money.write().unwrap_or_else(|e| e.into_inner());
        *slot = Arc::new(movements);
    }

    pub fn smart_money(&self) -> Arc<Vec<SmartMoneyMovement>> {
        Arc::clone(&self.smart_money.read().unwrap_or_else(|e| e.into_inner()))
    }

    pub fn smart_money_count(&self) -> usize {
        self.smart_money().len()
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self {
            events: DashMap::new(),
            next_seq: AtomicU64::new(0),
            movements: RwLock::new(Arc::new(Vec::new())),
            smart_money: RwLock::new(Arc::new(Vec::new())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock;
    use crate::types::{EventStatus, Score};

    fn ids(events: &[Event]) -> Vec<&str> {
        events.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn events_come_back_in_upstream_order() {
        let store = SnapshotStore::new();
        let mut events = mock::events();
        events.reverse();
        store.replace_events(events);

        assert_eq!(ids(&store.events()), vec!["7", "6", "5", "4", "3", "2", "1"]);
        assert_eq!(store.event_count(), 7);
    }

    #[test]
    fn replace_drops_stale_ids() {
        let store = SnapshotStore::new();
        store.replace_events(mock::events());

        let keep: Vec<Event> = mock::events().into_iter().filter(|e| e.id == "3" || e.id == "1").collect();
        store.replace_events(keep);

        assert_eq!(ids(&store.events()), vec!["1", "3"]);
        assert!(store.event("7").is_none());
    }

    #[test]
    fn patch_updates_in_place_and_keeps_invariants() {
        let store = SnapshotStore::new();
        store.replace_events(mock::events());

        let updated = store
            .patch_event(
                "3",
                &EventPatch {
                    status: Some(EventStatus::Finished),
                    score: Some(Score { home: 2, away: 1 }),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(!updated.is_live);
        assert_eq!(updated.minute, None);

        assert_eq!(store.event("3"), Some(updated));
        assert_eq!(ids(&store.events()), vec!["1", "2", "3", "4", "5", "6", "7"]);
        assert!(store.patch_event("nope", &EventPatch::default()).is_none());
    }

    #[test]
    fn movement_snapshots_are_swapped_whole() {
        let store = SnapshotStore::new();
        assert_eq!(store.movement_count(), 0);

        store.replace_movements(mock::odds_movements());
        let before = store.movements();
        store.replace_movements(Vec::new());

        assert!(!before.is_empty());
        assert_eq!(store.movement_count(), 0);

        store.replace_smart_money(mock::smart_money_movements());
        assert_eq!(store.smart_money_count(), 6);
    }
}
