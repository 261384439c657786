use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use crate::api::latency::LatencyStats;
use crate::config::{Config, MAX_EVENT_PAGES, ODDS_MOVERS_PATH, SMART_MONEY_PATH};
use crate::error::{AppError, Result};
use crate::types::{
    parse_timestamp, slug, Direction, Event, EventStats, EventStatus, League, OddsData,
    OddsMovement, Prediction, PredictionKind, Score, Severity, SmartMoneyMovement, Sport, Team,
};

#[derive(Debug, Default)]
pub struct EventFetchStats {
    pub pages: u32,
    pub api_total: usize,
    /// Records without a usable id.
    pub rejected: usize,
}

#[derive(Debug, Default)]
pub struct MovementFetchStats {
    pub api_total: usize,
    /// Movements whose direction label disagrees with the sign of the change.
    /// They are kept as received.
    pub direction_mismatches: usize,
}

/// HTTP client for the betting backend. Every round trip is timed into the
/// shared latency histogram.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    events_path: String,
    movers_hours: u32,
    movers_threshold: f64,
    latency: Arc<LatencyStats>,
}

impl ApiClient {
    pub fn new(cfg: &Config, latency: Arc<LatencyStats>) -> Result<Self> {
        if cfg.api_url.is_empty() {
            return Err(AppError::Config("API_URL is required outside mock mode".to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: cfg.api_url.clone(),
            events_path: cfg.events_path.clone(),
            movers_hours: cfg.movers_hours,
            movers_threshold: cfg.movers_threshold,
            latency,
        })
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        let started = Instant::now();
        let resp = self.http.get(url).send().await;
        self.latency.record(started.elapsed());

        let resp = resp?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::Upstream(format!("GET {url} returned {status}")));
        }
        Ok(resp.json().await?)
    }

    /// Fetch the events listing, following paginated envelopes until
    /// `has_next` is false or `MAX_EVENT_PAGES` is reached.
    pub async fn fetch_events(&self) -> Result<(Vec<Event>, EventFetchStats)> {
        let mut events = Vec::new();
        let mut stats = EventFetchStats::default();
        let mut page = 1u32;

        loop {
            let sep = if self.events_path.contains('?') { '&' } else { '?' };
            let url = if page == 1 {
                format!("{}{}", self.base_url, self.events_path)
            } else {
                format!("{}{}{sep}page={page}", self.base_url, self.events_path)
            };

            let body = self.get_json(&url).await?;
            let (items, has_next) = extract_event_page(&body)?;
            stats.pages += 1;
            stats.api_total += items.len();

            for item in &items {
                match parse_event(item) {
                    Some(event) => events.push(event),
                    None => stats.rejected += 1,
                }
            }

            if !has_next || items.is_empty() {
                break;
            }
            if page >= MAX_EVENT_PAGES {
                warn!(pages = page, "events listing still has pages, stopping at cap");
                break;
            }
            page += 1;
        }

        Ok((events, stats))
    }

    pub async fn fetch_odds_movements(&self) -> Result<(Vec<OddsMovement>, MovementFetchStats)> {
        let url = format!(
            "{}{}?hours={}&threshold={}",
            self.base_url, ODDS_MOVERS_PATH, self.movers_hours, self.movers_threshold
        );
        let body = self.get_json(&url).await?;
        let items = movement_items(&body)?;
        let movements: Vec<OddsMovement> = items.iter().map(parse_odds_movement).collect();

        let stats = MovementFetchStats {
            api_total: items.len(),
            direction_mismatches: count_direction_mismatches(&movements),
        };
        Ok((movements, stats))
    }

    pub async fn fetch_smart_money(&self) -> Result<Vec<SmartMoneyMovement>> {
        let url = format!("{}{}", self.base_url, SMART_MONEY_PATH);
        let body = self.get_json(&url).await?;
        Ok(smart_money_items(&body).iter().map(parse_smart_money).collect())
    }
}

// ---------------------------------------------------------------------------
// Response shapes
// ---------------------------------------------------------------------------

/// Items of one events page plus whether another page follows. Accepts a bare
/// array or `{ data: [...], pagination: { has_next } }`.
pub fn extract_event_page(body: &Value) -> Result<(Vec<Value>, bool)> {
    if let Some(items) = body.as_array() {
        return Ok((items.clone(), false));
    }
    let items = body
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| AppError::Upstream("events response was neither an array nor a page".to_string()))?;
    let has_next = body
        .get("pagination")
        .and_then(|p| p.get("has_next").or_else(|| p.get("hasNext")))
        .and_then(|h| h.as_bool())
        .unwrap_or(false);
    Ok((items.clone(), has_next))
}

/// Big-movers elements: a bare array, or `{ data: [...] }`. Anything else is
/// an upstream error so the previous snapshot survives.
pub fn movement_items(body: &Value) -> Result<Vec<Value>> {
    body.as_array()
        .or_else(|| body.get("data").and_then(|d| d.as_array()))
        .cloned()
        .ok_or_else(|| AppError::Upstream("odds movements response was not an array".to_string()))
}

/// Smart-money movements live under `data.movements`; a bare `movements` key
/// or a bare array is accepted too.
pub fn smart_money_items(body: &Value) -> Vec<Value> {
    body.get("data")
        .and_then(|d| d.get("movements"))
        .or_else(|| body.get("movements"))
        .and_then(|m| m.as_array())
        .or_else(|| body.as_array())
        .cloned()
        .unwrap_or_default()
}

pub fn count_direction_mismatches(movements: &[OddsMovement]) -> usize {
    movements
        .iter()
        .filter(|m| {
            let mismatch = !m.direction.agrees_with(m.change_percentage);
            if mismatch {
                debug!(
                    event_slug = %m.event_slug,
                    outcome = %m.outcome,
                    direction = %m.direction,
                    change = m.change_percentage,
                    "direction label disagrees with change sign"
                );
            }
            mismatch
        })
        .count()
}

// ---------------------------------------------------------------------------
// Record parsing
// ---------------------------------------------------------------------------

/// Parse one events-listing element. The camelCase dashboard shape is
/// deserialized directly; anything that does not deserialize cleanly, and the
/// flat backend shape, is mapped field by field with defaults.
/// Returns None only when the record has no id.
pub fn parse_event(v: &Value) -> Option<Event> {
    if v.get("homeTeam").is_some_and(|t| t.is_object()) {
        match serde_json::from_value::<Event>(v.clone()) {
            Ok(event) => return Some(event.normalized()),
            Err(e) => debug!("dashboard-shape event mapped leniently: {e}"),
        }
    }
    map_event(v)
}

/// Field-by-field mapping that accepts both the dashboard (camelCase) and the
/// flat backend keys.
fn map_event(v: &Value) -> Option<Event> {
    let id = text(v, &["id", "external_id"])?;

    let status = text(v, &["status"])
        .and_then(|s| s.parse::<EventStatus>().ok())
        .unwrap_or_else(|| {
            if flag(v, &["is_live", "isLive"]) {
                EventStatus::Live
            } else {
                EventStatus::Scheduled
            }
        });

    let score = match v.get("score").filter(|s| s.is_object()) {
        Some(s) => pair(whole(s, "home"), whole(s, "away")),
        None => pair(whole(v, "home_score"), whole(v, "away_score")),
    };

    let predictions: Vec<Prediction> = v
        .get("predictions")
        .and_then(|p| p.as_array())
        .map(|items| items.iter().enumerate().map(|(i, p)| prediction(p, i)).collect())
        .unwrap_or_default();

    let event = Event {
        id,
        sport: sport(v),
        league: league(v),
        home_team: team(v, &["homeTeam", "home_team"]),
        away_team: team(v, &["awayTeam", "away_team"]),
        start_time: text(v, &["startTime", "event_date", "start_time"])
            .and_then(|s| parse_timestamp(&s))
            .unwrap_or(DateTime::<Utc>::MIN_UTC),
        status,
        is_live: false,
        minute: whole(v, "minute").or_else(|| whole(v, "minute_of_match")),
        score,
        odds: object(v, "odds").and_then(|o| serde_json::from_value::<OddsData>(o.clone()).ok()),
        stats: object(v, "stats").and_then(|o| serde_json::from_value::<EventStats>(o.clone()).ok()),
        predictions,
        has_ai_predictions: flag(v, &["hasAIPredictions", "has_ai_predictions"]),
        betting_volume_percentage: number(v, "bettingVolumePercentage")
            .or_else(|| number(v, "betting_volume_percentage")),
    };
    Some(event.normalized())
}

fn sport(v: &Value) -> Sport {
    match object(v, "sport") {
        Some(s) => serde_json::from_value::<Sport>(s.clone())
            .unwrap_or_else(|_| Sport::from_label(&text(s, &["name", "id"]).unwrap_or_default())),
        None => Sport::from_label(&text(v, &["sport"]).unwrap_or_default()),
    }
}

/// A league given as `{ id, name, country }` or as a flat name.
fn league(v: &Value) -> League {
    let (name, id, country) = match object(v, "league") {
        Some(l) => (text(l, &["name"]), text(l, &["id"]), text(l, &["country"])),
        None => (text(v, &["league"]), text(v, &["league_id"]), text(v, &["league_country"])),
    };
    let name = name.unwrap_or_default();
    League { id: id.unwrap_or_else(|| slug(&name)), name, country }
}

/// Confidence may arrive fractional or as text; it is rounded into 0–100.
fn prediction(p: &Value, index: usize) -> Prediction {
    Prediction {
        id: text(p, &["id"]).unwrap_or_else(|| format!("p{}", index + 1)),
        kind: p
            .get("type")
            .and_then(|k| serde_json::from_value::<PredictionKind>(k.clone()).ok())
            .unwrap_or(PredictionKind::Custom),
        value: text(p, &["value"]).unwrap_or_default(),
        confidence: number(p, "confidence").map_or(0, |c| c.round().clamp(0.0, 100.0) as u8),
        odds: number(p, "odds"),
    }
}

/// Parse one big-movers element. Never fails: numbers may arrive as strings,
/// missing numbers become 0 and missing strings empty.
pub fn parse_odds_movement(v: &Value) -> OddsMovement {
    let s = |key: &str| text(v, &[key]).unwrap_or_default();
    let n = |key: &str| number(v, key).unwrap_or(0.0);

    OddsMovement {
        event_slug: s("event_slug"),
        match_label: s("match"),
        sport: s("sport"),
        sport_code: s("sport_code"),
        league: s("league"),
        league_country: s("league_country"),
        market: s("market"),
        market_description: s("market_description"),
        outcome: s("outcome"),
        opening_odds: n("opening_odds"),
        current_odds: n("current_odds"),
        change_percentage: n("change_percentage"),
        multiplier: n("multiplier"),
        direction: Direction::from_wire(&s("direction")),
        last_updated: s("last_updated"),
        event_time: s("event_time"),
        event_status: s("event_status"),
        is_live: v.get("is_live").and_then(|b| b.as_bool()).unwrap_or(false),
        home_score: whole(v, "home_score"),
        away_score: whole(v, "away_score"),
        minute_of_match: whole(v, "minute_of_match"),
        betting_volume_percent: number(v, "betting_volume_percent"),
        home_team_country: s("home_team_country"),
        away_team_country: s("away_team_country"),
    }
}

/// Parse one smart-money alert with the same coercion rules as movements.
pub fn parse_smart_money(v: &Value) -> SmartMoneyMovement {
    let s = |key: &str| text(v, &[key]).unwrap_or_default();
    let n = |key: &str| number(v, key).unwrap_or(0.0);

    SmartMoneyMovement {
        id: number(v, "id").map(|id| id as i64).unwrap_or(0),
        event_external_id: s("event_external_id"),
        home_team: s("home_team"),
        away_team: s("away_team"),
        match_label: text(v, &["match"]),
        market_name: s("market_name"),
        outcome: s("outcome"),
        previous_odds: n("previous_odds"),
        current_odds: n("current_odds"),
        change_percent: n("change_percent"),
        multiplier: n("multiplier"),
        minutes_to_kickoff: number(v, "minutes_to_kickoff").map(|m| m as i64).unwrap_or(0),
        recorded_at: s("recorded_at"),
        is_live: v.get("is_live").and_then(|b| b.as_bool()).unwrap_or(false),
        alert_message: s("alert_message"),
        severity: text(v, &["severity"]).and_then(|sev| sev.parse::<Severity>().ok()),
        league: text(v, &["league"]),
        sport: text(v, &["sport"]),
    }
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

/// First non-empty string (or number rendered as text) among `keys`.
fn text(v: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match v.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn number(v: &Value, key: &str) -> Option<f64> {
    v.get(key)
        .and_then(|x| x.as_f64().or_else(|| x.as_str().and_then(|s| s.trim().parse().ok())))
        .filter(|x| x.is_finite())
}

fn whole(v: &Value, key: &str) -> Option<u32> {
    number(v, key).filter(|x| *x >= 0.0).map(|x| x as u32)
}

/// A team given either as a plain name or as `{ id, name, logo }`, under the
/// first of `keys` that is present.
fn team(v: &Value, keys: &[&str]) -> Team {
    match keys.iter().find_map(|key| v.get(*key)) {
        Some(t @ Value::Object(_)) => {
            let name = text(t, &["name"]).unwrap_or_default();
            Team {
                id: text(t, &["id"]).unwrap_or_else(|| slug(&name)),
                name,
                logo: text(t, &["logo"]),
            }
        }
        _ => {
            let name = text(v, keys).unwrap_or_default();
            Team { id: slug(&name), name, logo: None }
        }
    }
}

fn object<'a>(v: &'a Value, key: &str) -> Option<&'a Value> {
    v.get(key).filter(|o| o.is_object())
}

fn flag(v: &Value, keys: &[&str]) -> bool {
    keys.iter().find_map(|key| v.get(*key)?.as_bool()).unwrap_or(false)
}

fn pair(home: Option<u32>, away: Option<u32>) -> Option<Score> {
    Some(Score { home: home?, away: away? })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dashboard_shape_is_deserialized_and_normalized() {
        let v = json!({
            "id": "7",
            "sport": { "id": "football", "name": "Futbol", "icon": "⚽" },
            "league": { "id": "eng-premier", "name": "Premier League", "country": "İngiltere" },
            "homeTeam": { "id": "mci", "name": "Manchester City" },
            "awayTeam": { "id": "ars", "name": "Arsenal" },
            "startTime": "2025-01-07T18:00:00Z",
            "status": "live",
            "isLive": false,
            "minute": 67,
            "hasAIPredictions": true,
            "odds": { "match": { "home": 1.95, "draw": 3.8, "away": 4.2 } }
        });
        let event = parse_event(&v).unwrap();
        assert!(event.is_live);
        assert_eq!(event.minute, Some(67));
        assert_eq!(event.draw_price(), Some(3.8));
        assert_eq!(event.home_team.name, "Manchester City");
    }

    #[test]
    fn flat_backend_shape_is_mapped() {
        let v = json!({
            "external_id": 12345,
            "home_team": "Galatasaray",
            "away_team": "Fenerbahçe",
            "league": "Süper Lig",
            "league_country": "Türkiye",
            "sport": "Futbol",
            "event_date": "2025-01-07T18:00:00+03:00",
            "status": "scheduled",
            "minute_of_match": 12,
            "home_score": "0",
            "betting_volume_percentage": "62.5"
        });
        let event = parse_event(&v).unwrap();
        assert_eq!(event.id, "12345");
        assert_eq!(event.sport.id, "football");
        assert_eq!(event.league.id, "super-lig");
        assert_eq!(event.league.country.as_deref(), Some("Türkiye"));
        assert_eq!(event.home_team.id, "galatasaray");
        assert_eq!(event.start_time.to_rfc3339(), "2025-01-07T15:00:00+00:00");
        assert!(!event.is_live);
        // minute is only kept while live
        assert_eq!(event.minute, None);
        // one side of the score is not a score
        assert_eq!(event.score, None);
        assert_eq!(event.betting_volume_percentage, Some(62.5));
    }

    #[test]
    fn flat_shape_falls_back_on_is_live_and_bad_dates() {
        let v = json!({
            "id": "9",
            "home_team": "A",
            "away_team": "B",
            "is_live": true,
            "minute_of_match": 80,
            "home_score": 1,
            "away_score": 0,
            "event_date": "soon"
        });
        let event = parse_event(&v).unwrap();
        assert_eq!(event.status, EventStatus::Live);
        assert_eq!(event.minute, Some(80));
        assert_eq!(event.score, Some(Score { home: 1, away: 0 }));
        assert_eq!(event.start_time, DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn records_without_id_are_rejected() {
        assert!(parse_event(&json!({ "home_team": "A", "away_team": "B" })).is_none());
        assert!(parse_event(&json!({
            "homeTeam": { "id": "a", "name": "A" },
            "awayTeam": { "id": "b", "name": "B" },
            "startTime": "later"
        }))
        .is_none());
    }

    fn dashboard_event() -> Value {
        json!({
            "id": "11",
            "sport": { "id": "football", "name": "Futbol", "icon": "⚽" },
            "league": { "id": "tr-super", "name": "Süper Lig", "country": "Türkiye" },
            "homeTeam": { "id": "gal", "name": "Galatasaray" },
            "awayTeam": { "id": "fb", "name": "Fenerbahçe" },
            "startTime": "2025-01-07T18:00:00Z",
            "status": "scheduled",
            "odds": { "match": { "home": 2.1, "draw": 3.4, "away": 3.2 } }
        })
    }

    #[test]
    fn dashboard_event_with_bad_start_time_is_kept() {
        let mut v = dashboard_event();
        v["startTime"] = json!("tonight");
        v["status"] = json!("live");
        v["minute"] = json!("34");
        v["score"] = json!({ "home": 1, "away": "0" });

        let event = parse_event(&v).unwrap();
        assert_eq!(event.id, "11");
        assert_eq!(event.start_time, DateTime::<Utc>::MIN_UTC);
        assert!(event.is_live);
        assert_eq!(event.minute, Some(34));
        assert_eq!(event.score, Some(Score { home: 1, away: 0 }));
        assert_eq!(event.sport.id, "football");
        assert_eq!(event.league.id, "tr-super");
        assert_eq!(event.league.country.as_deref(), Some("Türkiye"));
        assert_eq!(event.home_team.id, "gal");
        assert_eq!(event.away_team.name, "Fenerbahçe");
        assert_eq!(event.draw_price(), Some(3.4));
    }

    #[test]
    fn dashboard_event_with_fractional_confidence_is_kept() {
        let mut v = dashboard_event();
        v["predictions"] = json!([
            { "id": "p1", "type": "win", "value": "Ev Sahibi", "confidence": 72.5, "odds": 2.1 },
            { "type": "exotic", "value": "x", "confidence": "140" }
        ]);

        let event = parse_event(&v).unwrap();
        assert_eq!(event.predictions.len(), 2);
        assert_eq!(event.predictions[0].confidence, 73);
        assert_eq!(event.predictions[0].kind, PredictionKind::Win);
        assert_eq!(event.predictions[0].odds, Some(2.1));
        assert_eq!(event.predictions[1].id, "p2");
        assert_eq!(event.predictions[1].kind, PredictionKind::Custom);
        assert_eq!(event.predictions[1].confidence, 100);
        assert!(event.has_ai_predictions);
        assert_eq!(event.start_time.to_rfc3339(), "2025-01-07T18:00:00+00:00");
    }

    #[test]
    fn movement_body_must_be_a_list() {
        assert_eq!(movement_items(&json!([{ "event_slug": "a" }])).unwrap().len(), 1);
        assert_eq!(movement_items(&json!({ "data": [] })).unwrap().len(), 0);
        assert!(movement_items(&json!({ "error": "rate limited" })).is_err());
        assert!(movement_items(&json!(null)).is_err());
    }

    #[test]
    fn movement_parsing_coerces_and_never_drops() {
        let m = parse_odds_movement(&json!({
            "event_slug": "gal-fb",
            "match": "Galatasaray vs Fenerbahçe",
            "opening_odds": "2.85",
            "current_odds": 2.35,
            "change_percentage": "-17.5",
            "direction": "steaming",
            "last_updated": "2025-01-07T10:30:00Z"
        }));
        assert_eq!(m.opening_odds, 2.85);
        assert_eq!(m.change_percentage, -17.5);
        assert_eq!(m.direction, Direction::Steaming);
        assert_eq!(m.multiplier, 0.0);
        assert_eq!(m.league, "");
        assert!(!m.is_live);

        let empty = parse_odds_movement(&json!({}));
        assert_eq!(empty.direction, Direction::Unknown);
        assert_eq!(empty.event_slug, "");
    }

    #[test]
    fn mismatched_directions_are_counted_not_corrected() {
        let agree = parse_odds_movement(&json!({ "change_percentage": -5, "direction": "STEAMING" }));
        let disagree = parse_odds_movement(&json!({ "change_percentage": 12, "direction": "SHORTENING" }));
        let movements = vec![agree, disagree];
        assert_eq!(count_direction_mismatches(&movements), 1);
        assert_eq!(movements[1].direction, Direction::Shortening);
    }

    #[test]
    fn event_page_shapes() {
        let (items, next) = extract_event_page(&json!([{ "id": "1" }])).unwrap();
        assert_eq!(items.len(), 1);
        assert!(!next);

        let (items, next) = extract_event_page(&json!({
            "data": [{ "id": "1" }, { "id": "2" }],
            "pagination": { "page": 1, "has_next": true }
        }))
        .unwrap();
        assert_eq!(items.len(), 2);
        assert!(next);

        assert!(extract_event_page(&json!({ "error": "nope" })).is_err());
    }

    #[test]
    fn smart_money_body_shapes() {
        let nested = json!({ "data": { "movements": [{ "id": 1 }, { "id": 2 }] } });
        assert_eq!(smart_money_items(&nested).len(), 2);
        assert_eq!(smart_money_items(&json!({ "movements": [{ "id": 1 }] })).len(), 1);
        assert_eq!(smart_money_items(&json!([{ "id": 1 }])).len(), 1);
        assert!(smart_money_items(&json!({ "data": {} })).is_empty());

        let m = parse_smart_money(&json!({
            "id": "4",
            "home_team": "Beşiktaş",
            "away_team": "Trabzonspor",
            "change_percent": -17.2,
            "severity": "HIGH",
            "minutes_to_kickoff": 75
        }));
        assert_eq!(m.id, 4);
        assert_eq!(m.severity, Some(Severity::High));
        assert_eq!(m.display_match(), "Beşiktaş vs Trabzonspor");
    }

    #[test]
    fn client_requires_a_base_url() {
        let latency = Arc::new(LatencyStats::new().unwrap());
        assert!(ApiClient::new(&Config::mock(), latency).is_err());
    }
}
