use std::collections::HashSet;

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ALL_SPORTS;
use crate::filter::{compare_names, contains_folded};
use crate::types::{Event, League, TimeRange};

// ---------------------------------------------------------------------------
// Criteria
// ---------------------------------------------------------------------------

/// Active criteria for the events listing. `Default` is the reset state:
/// no league restriction, all times, live and scheduled, no search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFilters {
    /// League ids to include; empty means every league passes.
    pub selected_leagues: Vec<String>,
    pub time_range: TimeRange,
    pub live_only: bool,
    /// Free text; empty disables the search dimension.
    pub search: String,
}

impl EventFilters {
    /// True if any dimension restricts the output.
    pub fn has_active_filters(&self) -> bool {
        !self.selected_leagues.is_empty()
            || self.time_range != TimeRange::All
            || self.live_only
            || !self.search.is_empty()
    }

    pub fn reset(&self) -> Self {
        Self::default()
    }

    pub fn with_leagues(&self, leagues: Vec<String>) -> Self {
        Self { selected_leagues: leagues, ..self.clone() }
    }

    pub fn with_time_range(&self, time_range: TimeRange) -> Self {
        Self { time_range, ..self.clone() }
    }

    pub fn with_live_only(&self, live_only: bool) -> Self {
        Self { live_only, ..self.clone() }
    }

    pub fn with_search(&self, search: impl Into<String>) -> Self {
        Self { search: search.into(), ..self.clone() }
    }

    /// Add the league if absent, remove it if present.
    pub fn toggle_league(&self, league_id: &str) -> Self {
        let mut leagues = self.selected_leagues.clone();
        if let Some(pos) = leagues.iter().position(|l| l == league_id) {
            leagues.remove(pos);
        } else {
            leagues.push(league_id.to_string());
        }
        self.with_leagues(leagues)
    }
}

// ---------------------------------------------------------------------------
// Time windows
// ---------------------------------------------------------------------------

/// Half-open instant range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Window for `range`, anchored at local midnight of `now` in `now`'s zone.
    /// `All` has no window.
    pub fn for_range<Tz: TimeZone>(range: TimeRange, now: &DateTime<Tz>) -> Option<Self> {
        let tz = now.timezone();
        let today = now.date_naive();
        let day = |offset: i64| day_start(&tz, today + Duration::days(offset));

        let (start, end) = match range {
            TimeRange::All => return None,
            TimeRange::Today => (day(0), day(1)),
            TimeRange::Tomorrow => {
                let tomorrow = day(1);
                (tomorrow, tomorrow + Duration::days(1))
            }
            TimeRange::ThisWeek => (day(0), day(7)),
            TimeRange::NextWeek => (day(7), day(14)),
        };
        Some(TimeWindow { start, end })
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t < self.end
    }
}

/// First instant of `date` in `tz`. Midnight can fall in a DST gap in a few
/// zones; the day then starts an hour later.
fn day_start<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(midnight + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| midnight.and_utc())
}

// ---------------------------------------------------------------------------
// Derivations
// ---------------------------------------------------------------------------

/// One league per distinct id (first occurrence wins), sorted by name.
pub fn available_leagues(events: &[Event]) -> Vec<League> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut leagues: Vec<League> = events
        .iter()
        .filter(|e| seen.insert(e.league.id.as_str()))
        .map(|e| e.league.clone())
        .collect();
    leagues.sort_by(|a, b| compare_names(&a.name, &b.name));
    leagues
}

/// Outer sport scope applied before the filter chain. An empty list or the
/// `all` pseudo-id disables it.
pub fn scope_by_sports(events: &[Event], sports: &[String]) -> Vec<Event> {
    if sports.is_empty() || sports.iter().any(|s| s == ALL_SPORTS) {
        return events.to_vec();
    }
    events
        .iter()
        .filter(|e| sports.iter().any(|s| *s == e.sport.id))
        .cloned()
        .collect()
}

/// Filter against the current local time.
pub fn filter_events(events: &[Event], filters: &EventFilters) -> Vec<Event> {
    filter_events_at(events, filters, &Local::now())
}

/// league → live-only → time range → search, combined with AND.
pub fn filter_events_at<Tz: TimeZone>(
    events: &[Event],
    filters: &EventFilters,
    now: &DateTime<Tz>,
) -> Vec<Event> {
    let leagues: HashSet<&str> = filters.selected_leagues.iter().map(String::as_str).collect();
    let window = TimeWindow::for_range(filters.time_range, now);
    let query = filters.search.to_lowercase();

    events
        .iter()
        .filter(|e| leagues.is_empty() || leagues.contains(e.league.id.as_str()))
        .filter(|e| !filters.live_only || e.is_live)
        .filter(|e| window.map_or(true, |w| w.contains(e.start_time)))
        .filter(|e| query.is_empty() || matches_search(e, &query))
        .cloned()
        .collect()
}

fn matches_search(event: &Event, query: &str) -> bool {
    contains_folded(&event.home_team.name, query)
        || contains_folded(&event.away_team.name, query)
        || contains_folded(&event.league.name, query)
        || contains_folded(&event.sport.name, query)
}

/// Everything an events screen needs from one pass over the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventView {
    pub available_leagues: Vec<League>,
    pub events: Vec<Event>,
    pub has_active_filters: bool,
    /// Size of the sport-scoped input before the filter chain.
    pub total_unfiltered: usize,
}

impl EventView {
    pub fn build<Tz: TimeZone>(
        events: &[Event],
        sports: &[String],
        filters: &EventFilters,
        now: &DateTime<Tz>,
    ) -> Self {
        let scoped = scope_by_sports(events, sports);
        Self {
            available_leagues: available_leagues(&scoped),
            events: filter_events_at(&scoped, filters, now),
            has_active_filters: filters.has_active_filters(),
            total_unfiltered: scoped.len(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
