use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::aggregator::{group_movements, movement_facets, sport_catalogue, MovementFacets, SportCategory};
use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::config::DEFAULT_PER_PAGE;
use crate::error::{AppError, Result};
use crate::filter::{
    available_leagues, filter_grouped, filter_smart_money, filter_sports, scope_by_sports,
    EventFilters, EventView, MovementFilters, SmartMoneyFilters, SportFilters, StatusFilter,
};
use crate::pagination::{paginate, PaginationMeta};
use crate::state::SnapshotStore;
use crate::types::{
    Direction, Event, EventPatch, GroupedEvent, League, Severity, SmartMoneyMovement, TimeRange,
};

#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<SnapshotStore>,
    pub health: Arc<HealthState>,
    pub latency: Arc<LatencyStats>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/events", get(get_events))
        .route("/events/leagues", get(get_event_leagues))
        .route("/events/:id", get(get_event).patch(patch_event))
        .route("/odds/movements", get(get_odds_movements))
        .route("/smart-money", get(get_smart_money))
        .route("/sports", get(get_sports))
        .route("/health", get(get_health))
        .route("/stats/latency", get(get_stats_latency))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Query param structs
// ---------------------------------------------------------------------------

/// Lists are comma separated. Also used by the terminal client to build
/// requests, hence `Serialize`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sports: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leagues: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Cap applied after filtering, before pagination.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
}

impl EventsQuery {
    pub fn from_filters(filters: &EventFilters, sports: &[String], page: u32, per_page: u32) -> Self {
        Self {
            sports: join_list(sports),
            leagues: join_list(&filters.selected_leagues),
            time_range: (filters.time_range != TimeRange::All).then(|| filters.time_range.to_string()),
            live_only: filters.live_only.then_some(true),
            search: non_empty(&filters.search),
            max_items: None,
            page: Some(page),
            per_page: Some(per_page),
        }
    }

    pub fn filters(&self) -> Result<EventFilters> {
        Ok(EventFilters {
            selected_leagues: split_list(&self.leagues),
            time_range: parse_opt::<TimeRange>(&self.time_range)?.unwrap_or_default(),
            live_only: self.live_only.unwrap_or(false),
            search: self.search.clone().unwrap_or_default(),
        })
    }

    pub fn sports(&self) -> Vec<String> {
        split_list(&self.sports)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MovementsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sport: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub league: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
}

impl MovementsQuery {
    pub fn from_filters(filters: &MovementFilters, page: u32, per_page: u32) -> Self {
        Self {
            search: non_empty(&filters.search),
            sport: filters.sport.clone(),
            league: filters.league.clone(),
            direction: filters.direction.map(|d| d.to_string()),
            min_percentage: (filters.min_percentage > 0.0).then_some(filters.min_percentage),
            status: (filters.status != StatusFilter::All).then(|| filters.status.to_string()),
            page: Some(page),
            per_page: Some(per_page),
        }
    }

    pub fn filters(&self) -> Result<MovementFilters> {
        Ok(MovementFilters {
            search: self.search.clone().unwrap_or_default(),
            sport: label(&self.sport),
            league: label(&self.league),
            direction: parse_opt::<Direction>(&self.direction)?,
            min_percentage: min_percentage(self.min_percentage),
            status: parse_opt::<StatusFilter>(&self.status)?.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmartMoneyQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_percentage: Option<f64>,
}

impl SmartMoneyQuery {
    pub fn from_filters(filters: &SmartMoneyFilters) -> Self {
        Self {
            search: non_empty(&filters.search),
            severity: filters.severity.map(|s| s.to_string()),
            status: (filters.status != StatusFilter::All).then(|| filters.status.to_string()),
            min_percentage: (filters.min_percentage > 0.0).then_some(filters.min_percentage),
        }
    }

    pub fn filters(&self) -> Result<SmartMoneyFilters> {
        Ok(SmartMoneyFilters {
            search: self.search.clone().unwrap_or_default(),
            severity: parse_opt::<Severity>(&self.severity)?,
            status: parse_opt::<StatusFilter>(&self.status)?.unwrap_or_default(),
            min_percentage: min_percentage(self.min_percentage),
        })
    }
}

/// Query strings can carry `NaN` or `inf`; only finite positive values
/// restrict anything.
fn min_percentage(raw: Option<f64>) -> f64 {
    raw.filter(|p| p.is_finite() && *p > 0.0).unwrap_or(0.0)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SportsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_all: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popular: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_count: Option<usize>,
}

impl SportsQuery {
    pub fn filters(&self) -> SportFilters {
        SportFilters {
            include_all: self.include_all.unwrap_or(false),
            popular_only: self.popular.unwrap_or(false),
            min_count: self.min_count,
        }
    }
}

fn split_list(raw: &Option<String>) -> Vec<String> {
    raw.as_deref()
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn join_list(items: &[String]) -> Option<String> {
    (!items.is_empty()).then(|| items.join(","))
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

/// A dropdown label where empty and `all` mean no restriction.
fn label(raw: &Option<String>) -> Option<String> {
    raw.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("all"))
        .map(str::to_string)
}

fn parse_opt<T: FromStr<Err = AppError>>(raw: &Option<String>) -> Result<Option<T>> {
    label(raw).map(|s| s.parse::<T>()).transpose()
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct EventsResponse {
    pub data: Vec<Event>,
    pub pagination: PaginationMeta,
    pub has_active_filters: bool,
    pub available_leagues: Vec<League>,
    pub total_unfiltered: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MovementsResponse {
    pub data: Vec<GroupedEvent>,
    pub pagination: PaginationMeta,
    pub facets: MovementFacets,
    pub has_active_filters: bool,
    /// Raw movements in the snapshot before grouping.
    pub total_movements: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SmartMoneyResponse {
    pub movements: Vec<SmartMoneyMovement>,
    pub total: usize,
    pub has_active_filters: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SportsResponse {
    pub sports: Vec<SportCategory>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub mock_mode: bool,
    pub backend_reachable: bool,
    pub last_refresh_at_ms: u64,
    pub refresh_failures: u64,
    pub direction_mismatches: u64,
    pub events: usize,
    pub movements: usize,
    pub smart_money: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LatencyResponse {
    pub samples: u64,
    pub p50_ms: Option<f64>,
    pub p95_ms: Option<f64>,
    pub p99_ms: Option<f64>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_events(
    State(state): State<ApiState>,
    Query(params): Query<EventsQuery>,
) -> Result<Json<EventsResponse>> {
    let filters = params.filters()?;
    let snapshot = state.store.events();
    let mut view = EventView::build(&snapshot, &params.sports(), &filters, &Local::now());

    if let Some(max) = params.max_items {
        view.events.truncate(max);
    }
    let page = paginate(
        &view.events,
        params.page.unwrap_or(1),
        params.per_page.unwrap_or(DEFAULT_PER_PAGE),
    );

    Ok(Json(EventsResponse {
        data: page.data,
        pagination: page.pagination,
        has_active_filters: view.has_active_filters,
        available_leagues: view.available_leagues,
        total_unfiltered: view.total_unfiltered,
    }))
}

async fn get_event_leagues(
    State(state): State<ApiState>,
    Query(params): Query<EventsQuery>,
) -> Json<Vec<League>> {
    let scoped = scope_by_sports(&state.store.events(), &params.sports());
    Json(available_leagues(&scoped))
}

async fn get_event(
    State(state): State<ApiState>,
    Path(event_id): Path<String>,
) -> Result<Json<Event>> {
    state
        .store
        .event(&event_id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("event {event_id}")))
}

async fn patch_event(
    State(state): State<ApiState>,
    Path(event_id): Path<String>,
    Json(patch): Json<EventPatch>,
) -> Result<Json<Event>> {
    state
        .store
        .patch_event(&event_id, &patch)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("event {event_id}")))
}

async fn get_odds_movements(
    State(state): State<ApiState>,
    Query(params): Query<MovementsQuery>,
) -> Result<Json<MovementsResponse>> {
    let filters = params.filters()?;
    let movements = state.store.movements();

    let grouped = filter_grouped(&group_movements(&movements), &filters);
    let page = paginate(
        &grouped,
        params.page.unwrap_or(1),
        params.per_page.unwrap_or(DEFAULT_PER_PAGE),
    );

    Ok(Json(MovementsResponse {
        data: page.data,
        pagination: page.pagination,
        facets: movement_facets(&movements),
        has_active_filters: filters.has_active_filters(),
        total_movements: movements.len(),
    }))
}

async fn get_smart_money(
    State(state): State<ApiState>,
    Query(params): Query<SmartMoneyQuery>,
) -> Result<Json<SmartMoneyResponse>> {
    let filters = params.filters()?;
    let movements = filter_smart_money(&state.store.smart_money(), &filters);

    Ok(Json(SmartMoneyResponse {
        total: movements.len(),
        movements,
        has_active_filters: filters.has_active_filters(),
    }))
}

async fn get_sports(
    State(state): State<ApiState>,
    Query(params): Query<SportsQuery>,
) -> Json<SportsResponse> {
    let catalogue = sport_catalogue(&state.store.events());
    Json(SportsResponse { sports: filter_sports(&catalogue, &params.filters()) })
}

async fn get_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    let health = &state.health;
    let ok = health.mock_mode() || health.backend_reachable();
    Json(HealthResponse {
        status: if ok { "ok" } else { "degraded" }.to_string(),
        mock_mode: health.mock_mode(),
        backend_reachable: health.backend_reachable(),
        last_refresh_at_ms: health.last_refresh_at_ms(),
        refresh_failures: health.refresh_failures(),
        direction_mismatches: health.direction_mismatches(),
        events: state.store.event_count(),
        movements: state.store.movement_count(),
        smart_money: state.store.smart_money_count(),
    })
}

async fn get_stats_latency(State(state): State<ApiState>) -> Json<LatencyResponse> {
    let (p50, p95, p99) = state.latency.percentiles();
    let to_ms = |us: Option<u64>| us.map(|v| v as f64 / 1000.0);
    Json(LatencyResponse {
        samples: state.latency.len(),
        p50_ms: to_ms(p50),
        p95_ms: to_ms(p95),
        p99_ms: to_ms(p99),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock;
    use crate::types::{EventStatus, Score};
    use axum::response::IntoResponse;
    use axum::http::StatusCode;

    fn state() -> ApiState {
        let store = SnapshotStore::new();
        store.replace_events(mock::events());
        store.replace_movements(mock::odds_movements());
        store.replace_smart_money(mock::smart_money_movements());
        let health = Arc::new(HealthState::new());
        health.set_mock_mode(true);
        ApiState {
            store,
            health,
            latency: Arc::new(LatencyStats::new().unwrap()),
        }
    }

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[tokio::test]
    async fn events_are_filtered_and_paginated() {
        let q = EventsQuery {
            sports: Some("football".to_string()),
            per_page: Some(2),
            ..Default::default()
        };
        let Json(resp) = get_events(State(state()), Query(q)).await.unwrap();

        assert_eq!(resp.total_unfiltered, 5);
        assert_eq!(resp.pagination.total, 5);
        assert_eq!(resp.pagination.total_pages, 3);
        assert_eq!(resp.data.len(), 2);
        assert!(!resp.has_active_filters);
        let names: Vec<&str> = resp.available_leagues.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["La Liga", "Premier League", "Süper Lig"]);
    }

    #[tokio::test]
    async fn events_live_only_with_league_and_cap() {
        let q = EventsQuery {
            leagues: Some("tr-super, eng-premier".to_string()),
            live_only: Some(true),
            ..Default::default()
        };
        let Json(resp) = get_events(State(state()), Query(q)).await.unwrap();
        let ids: Vec<&str> = resp.data.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["7"]);
        assert!(resp.has_active_filters);

        let q = EventsQuery { max_items: Some(3), ..Default::default() };
        let Json(resp) = get_events(State(state()), Query(q)).await.unwrap();
        assert_eq!(resp.pagination.total, 3);
    }

    #[tokio::test]
    async fn bad_time_range_is_a_bad_request() {
        let q = EventsQuery { time_range: Some("fortnight".to_string()), ..Default::default() };
        let err = get_events(State(state()), Query(q)).await.unwrap_err();
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn single_event_lookup_and_patch() {
        let st = state();
        let Json(event) = get_event(State(st.clone()), Path("3".to_string())).await.unwrap();
        assert!(event.is_live);

        let patch = EventPatch {
            status: Some(EventStatus::Finished),
            score: Some(Score { home: 1, away: 2 }),
            ..Default::default()
        };
        let Json(updated) = patch_event(State(st.clone()), Path("3".to_string()), Json(patch))
            .await
            .unwrap();
        assert!(!updated.is_live);
        assert_eq!(updated.minute, None);
        assert_eq!(st.store.event("3"), Some(updated));

        let err = get_event(State(st), Path("404".to_string())).await.unwrap_err();
        assert_eq!(status_of(err), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn leagues_follow_sport_scope() {
        let q = EventsQuery { sports: Some("tennis".to_string()), ..Default::default() };
        let Json(leagues) = get_event_leagues(State(state()), Query(q)).await;
        assert_eq!(leagues.len(), 1);
        assert_eq!(leagues[0].id, "wimbledon");
    }

    #[tokio::test]
    async fn movements_are_grouped_then_filtered() {
        let Json(resp) = get_odds_movements(State(state()), Query(MovementsQuery::default()))
            .await
            .unwrap();
        assert_eq!(resp.pagination.total, 5);
        assert!(resp
            .data
            .windows(2)
            .all(|w| w[0].max_change_percentage >= w[1].max_change_percentage));
        assert_eq!(resp.facets.sports, vec!["Futbol"]);

        let q = MovementsQuery {
            direction: Some("steaming".to_string()),
            status: Some("scheduled".to_string()),
            ..Default::default()
        };
        let Json(resp) = get_odds_movements(State(state()), Query(q)).await.unwrap();
        let slugs: Vec<&str> = resp.data.iter().map(|g| g.event_slug.as_str()).collect();
        assert_eq!(slugs.len(), 2);
        assert!(slugs.contains(&"gal-fb") && slugs.contains(&"ank-kon"));
        assert!(resp.has_active_filters);

        let q = MovementsQuery { direction: Some("sideways".to_string()), ..Default::default() };
        let err = get_odds_movements(State(state()), Query(q)).await.unwrap_err();
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn smart_money_filters() {
        let q = SmartMoneyQuery {
            severity: Some("high".to_string()),
            ..Default::default()
        };
        let Json(resp) = get_smart_money(State(state()), Query(q)).await.unwrap();
        assert_eq!(resp.total, 2);

        let q = SmartMoneyQuery { severity: Some("all".to_string()), ..Default::default() };
        let Json(resp) = get_smart_money(State(state()), Query(q)).await.unwrap();
        assert_eq!(resp.total, 6);
        assert!(!resp.has_active_filters);
    }

    #[tokio::test]
    async fn non_finite_min_percentage_is_ignored() {
        let q = MovementsQuery { min_percentage: Some(f64::NAN), ..Default::default() };
        assert_eq!(q.filters().unwrap().min_percentage, 0.0);
        let Json(resp) = get_odds_movements(State(state()), Query(q)).await.unwrap();
        assert_eq!(resp.pagination.total, 5);
        assert!(!resp.has_active_filters);

        let q = SmartMoneyQuery { min_percentage: Some(f64::INFINITY), ..Default::default() };
        assert_eq!(q.filters().unwrap().min_percentage, 0.0);
        let Json(resp) = get_smart_money(State(state()), Query(q)).await.unwrap();
        assert_eq!(resp.total, 6);
    }

    #[tokio::test]
    async fn sports_catalogue_from_snapshot() {
        let Json(resp) = get_sports(State(state()), Query(SportsQuery::default())).await;
        let ids: Vec<&str> = resp.sports.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["football", "basketball", "tennis"]);
        assert_eq!(resp.sports[0].count, 5);
        assert_eq!(resp.sports[0].live_count, 2);

        let q = SportsQuery { include_all: Some(true), min_count: Some(2), ..Default::default() };
        let Json(resp) = get_sports(State(state()), Query(q)).await;
        let ids: Vec<&str> = resp.sports.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["all", "football"]);
        assert_eq!(resp.sports[0].count, 7);
    }

    #[tokio::test]
    async fn health_and_latency() {
        let st = state();
        let Json(health) = get_health(State(st.clone())).await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.events, 7);

        st.latency.record_us(2_000);
        let Json(latency) = get_stats_latency(State(st)).await;
        assert_eq!(latency.samples, 1);
        assert!(latency.p50_ms.is_some());
    }

    #[test]
    fn query_round_trips_through_filters() {
        let filters = EventFilters::default()
            .with_leagues(vec!["tr-super".to_string(), "es-laliga".to_string()])
            .with_time_range(TimeRange::ThisWeek)
            .with_search("gal");
        let q = EventsQuery::from_filters(&filters, &[], 2, 20);
        assert_eq!(q.leagues.as_deref(), Some("tr-super,es-laliga"));
        assert_eq!(q.time_range.as_deref(), Some("thisWeek"));
        assert_eq!(q.live_only, None);
        assert_eq!(q.filters().unwrap(), filters);

        let mf = MovementFilters {
            direction: Some(Direction::Drifting),
            min_percentage: 10.0,
            status: StatusFilter::Live,
            ..Default::default()
        };
        assert_eq!(MovementsQuery::from_filters(&mf, 1, 20).filters().unwrap(), mf);
    }
}
