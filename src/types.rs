use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AppError;

// ---------------------------------------------------------------------------
// Event building blocks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sport {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: String,
}

/// Known sports: (id, aliases, icon). Aliases are matched case-insensitively.
const KNOWN_SPORTS: &[(&str, &[&str], &str)] = &[
    ("football", &["football", "futbol", "soccer"], "⚽"),
    ("basketball", &["basketball", "basketbol"], "🏀"),
    ("tennis", &["tennis", "tenis"], "🎾"),
    ("volleyball", &["volleyball", "voleybol"], "🏐"),
    ("hockey", &["hockey", "hokey", "ice hockey", "buz hokeyi"], "🏒"),
    ("esports", &["esports", "e-spor", "e-sports"], "🎮"),
];

impl Sport {
    /// Build a sport from a backend label such as `"Futbol"` or `"football"`.
    pub fn from_label(label: &str) -> Self {
        let lower = label.trim().to_lowercase();
        for (id, aliases, icon) in KNOWN_SPORTS {
            if aliases.iter().any(|a| *a == lower) {
                return Sport {
                    id: (*id).to_string(),
                    name: label.trim().to_string(),
                    icon: (*icon).to_string(),
                };
            }
        }
        Sport {
            id: slug(label),
            name: label.trim().to_string(),
            icon: "🏆".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct League {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub home: u32,
    pub away: u32,
}

// ---------------------------------------------------------------------------
// Odds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchOdds {
    pub home: f64,
    /// `None` when the market has no draw (a draw price of 0 upstream).
    #[serde(
        default,
        deserialize_with = "zero_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub draw: Option<f64>,
    pub away: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverUnderOdds {
    pub over: f64,
    pub under: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BothTeamsScoreOdds {
    pub yes: f64,
    pub no: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoubleChanceOdds {
    pub home_or_draw: f64,
    pub home_or_away: f64,
    pub draw_or_away: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OddsData {
    #[serde(default, rename = "match", skip_serializing_if = "Option::is_none")]
    pub match_odds: Option<MatchOdds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub over_under: Option<OverUnderOdds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub both_teams_score: Option<BothTeamsScoreOdds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub double_chance: Option<DoubleChanceOdds>,
}

fn zero_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let price = Option::<f64>::deserialize(deserializer)?;
    Ok(price.filter(|p| *p > 0.0))
}

// ---------------------------------------------------------------------------
// Statistics and predictions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatPair {
    pub home: f64,
    pub away: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub possession: Option<StatPair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shots: Option<StatPair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shots_on_target: Option<StatPair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corners: Option<StatPair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fouls: Option<StatPair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yellow_cards: Option<StatPair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub red_cards: Option<StatPair>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionKind {
    Win,
    Draw,
    Loss,
    Over,
    Under,
    BothTeamsScore,
    #[serde(other)]
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: PredictionKind,
    pub value: String,
    /// 0–100.
    pub confidence: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub odds: Option<f64>,
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Scheduled,
    Live,
    Finished,
    Postponed,
    Cancelled,
}

impl std::str::FromStr for EventStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "scheduled" | "upcoming" | "not_started" => Ok(EventStatus::Scheduled),
            "live" | "in_play" | "in_progress" => Ok(EventStatus::Live),
            "finished" | "ended" | "completed" => Ok(EventStatus::Finished),
            "postponed" => Ok(EventStatus::Postponed),
            "cancelled" | "canceled" => Ok(EventStatus::Cancelled),
            other => Err(AppError::BadRequest(format!("unknown event status: {other}"))),
        }
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventStatus::Scheduled => "scheduled",
            EventStatus::Live => "live",
            EventStatus::Finished => "finished",
            EventStatus::Postponed => "postponed",
            EventStatus::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// One sporting fixture. Treated as immutable; updates go through
/// [`Event::apply_patch`], which returns a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub sport: Sport,
    pub league: League,
    pub home_team: Team,
    pub away_team: Team,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default)]
    pub is_live: bool,
    /// Elapsed match minute, only while live.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minute: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<Score>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub odds: Option<OddsData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<EventStats>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub predictions: Vec<Prediction>,
    #[serde(default, rename = "hasAIPredictions")]
    pub has_ai_predictions: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub betting_volume_percentage: Option<f64>,
}

impl Event {
    /// Re-establish the live invariants: `is_live` follows `status`, and
    /// `minute` is dropped for events that are not in play.
    pub fn normalized(mut self) -> Self {
        self.is_live = self.status == EventStatus::Live;
        if !self.is_live {
            self.minute = None;
        }
        if !self.predictions.is_empty() {
            self.has_ai_predictions = true;
        }
        self
    }

    /// Return a copy of this event with `patch` applied.
    pub fn apply_patch(&self, patch: &EventPatch) -> Event {
        let mut next = self.clone();
        if let Some(status) = patch.status {
            next.status = status;
        }
        if let Some(minute) = patch.minute {
            next.minute = Some(minute);
        }
        if let Some(score) = patch.score {
            next.score = Some(score);
        }
        if let Some(odds) = &patch.odds {
            next.odds = Some(odds.clone());
        }
        if let Some(predictions) = &patch.predictions {
            next.predictions = predictions.clone();
            next.has_ai_predictions = !predictions.is_empty();
        }
        if let Some(volume) = patch.betting_volume_percentage {
            next.betting_volume_percentage = Some(volume);
        }
        next.normalized()
    }

    /// Draw price if the match market has one.
    pub fn draw_price(&self) -> Option<f64> {
        self.odds
            .as_ref()
            .and_then(|o| o.match_odds.as_ref())
            .and_then(|m| m.draw)
    }
}

/// Partial update for one event, used for optimistic updates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    #[serde(default)]
    pub status: Option<EventStatus>,
    #[serde(default)]
    pub minute: Option<u32>,
    #[serde(default)]
    pub score: Option<Score>,
    #[serde(default)]
    pub odds: Option<OddsData>,
    #[serde(default)]
    pub predictions: Option<Vec<Prediction>>,
    #[serde(default)]
    pub betting_volume_percentage: Option<f64>,
}

// ---------------------------------------------------------------------------
// Time range
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimeRange {
    Today,
    Tomorrow,
    ThisWeek,
    NextWeek,
    #[default]
    All,
}

impl TimeRange {
    /// Next value in display order, wrapping around. Used by the TUI.
    pub fn cycle(self) -> Self {
        match self {
            TimeRange::All => TimeRange::Today,
            TimeRange::Today => TimeRange::Tomorrow,
            TimeRange::Tomorrow => TimeRange::ThisWeek,
            TimeRange::ThisWeek => TimeRange::NextWeek,
            TimeRange::NextWeek => TimeRange::All,
        }
    }
}

impl std::str::FromStr for TimeRange {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', '-'], "").as_str() {
            "today" => Ok(TimeRange::Today),
            "tomorrow" => Ok(TimeRange::Tomorrow),
            "thisweek" => Ok(TimeRange::ThisWeek),
            "nextweek" => Ok(TimeRange::NextWeek),
            "all" | "" => Ok(TimeRange::All),
            _ => Err(AppError::BadRequest(format!("unknown time range: {s}"))),
        }
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TimeRange::Today => "today",
            TimeRange::Tomorrow => "tomorrow",
            TimeRange::ThisWeek => "thisWeek",
            TimeRange::NextWeek => "nextWeek",
            TimeRange::All => "all",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Odds movements
// ---------------------------------------------------------------------------

/// Upstream classification of a price movement. Never derived locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Steaming,
    Shortening,
    Drifting,
    #[serde(other)]
    Unknown,
}

impl Direction {
    /// Lenient parse for backend payloads; unrecognized labels map to `Unknown`.
    pub fn from_wire(s: &str) -> Self {
        s.parse().unwrap_or(Direction::Unknown)
    }

    /// Whether a signed change percentage agrees with this label. Steaming and
    /// shortening prices fall, drifting prices rise. Zero agrees with anything.
    pub fn agrees_with(self, change_percentage: f64) -> bool {
        match self {
            Direction::Steaming | Direction::Shortening => change_percentage <= 0.0,
            Direction::Drifting => change_percentage >= 0.0,
            Direction::Unknown => true,
        }
    }

    pub fn cycle(current: Option<Direction>) -> Option<Direction> {
        match current {
            None => Some(Direction::Steaming),
            Some(Direction::Steaming) => Some(Direction::Shortening),
            Some(Direction::Shortening) => Some(Direction::Drifting),
            Some(Direction::Drifting) | Some(Direction::Unknown) => None,
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "STEAMING" => Ok(Direction::Steaming),
            "SHORTENING" => Ok(Direction::Shortening),
            "DRIFTING" => Ok(Direction::Drifting),
            _ => Err(AppError::BadRequest(format!("unknown direction: {s}"))),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Direction::Steaming => "STEAMING",
            Direction::Shortening => "SHORTENING",
            Direction::Drifting => "DRIFTING",
            Direction::Unknown => "UNKNOWN",
        };
        write!(f, "{s}")
    }
}

/// One observed price change for one outcome of one market of one event.
/// Timestamps are kept as received; see [`parse_timestamp`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddsMovement {
    pub event_slug: String,
    #[serde(rename = "match")]
    pub match_label: String,
    pub sport: String,
    #[serde(default)]
    pub sport_code: String,
    pub league: String,
    #[serde(default)]
    pub league_country: String,
    pub market: String,
    #[serde(default)]
    pub market_description: String,
    pub outcome: String,
    pub opening_odds: f64,
    pub current_odds: f64,
    pub change_percentage: f64,
    pub multiplier: f64,
    pub direction: Direction,
    pub last_updated: String,
    pub event_time: String,
    #[serde(default)]
    pub event_status: String,
    #[serde(default)]
    pub is_live: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub away_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minute_of_match: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub betting_volume_percent: Option<f64>,
    #[serde(default)]
    pub home_team_country: String,
    #[serde(default)]
    pub away_team_country: String,
}

/// All movements of one event collapsed into a summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedEvent {
    pub event_slug: String,
    #[serde(rename = "match")]
    pub match_label: String,
    pub sport: String,
    pub sport_code: String,
    pub league: String,
    pub league_country: String,
    pub event_time: String,
    pub event_status: String,
    pub is_live: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub away_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minute_of_match: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub betting_volume_percent: Option<f64>,
    pub home_team_country: String,
    pub away_team_country: String,
    pub movements: Vec<OddsMovement>,
    pub movement_count: usize,
    pub max_change_percentage: f64,
    pub last_updated: String,
}

// ---------------------------------------------------------------------------
// Smart money
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn cycle(current: Option<Severity>) -> Option<Severity> {
        match current {
            None => Some(Severity::Low),
            Some(Severity::Low) => Some(Severity::Medium),
            Some(Severity::Medium) => Some(Severity::High),
            Some(Severity::High) => Some(Severity::Critical),
            Some(Severity::Critical) => None,
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            _ => Err(AppError::BadRequest(format!("unknown severity: {s}"))),
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        write!(f, "{s}")
    }
}

/// A sharp price move flagged by the backend's smart-money tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmartMoneyMovement {
    pub id: i64,
    pub event_external_id: String,
    pub home_team: String,
    pub away_team: String,
    #[serde(rename = "match", default, skip_serializing_if = "Option::is_none")]
    pub match_label: Option<String>,
    pub market_name: String,
    pub outcome: String,
    pub previous_odds: f64,
    pub current_odds: f64,
    pub change_percent: f64,
    pub multiplier: f64,
    pub minutes_to_kickoff: i64,
    pub recorded_at: String,
    #[serde(default)]
    pub is_live: bool,
    #[serde(default)]
    pub alert_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub league: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sport: Option<String>,
}

impl SmartMoneyMovement {
    /// The match label, falling back to "home vs away" when upstream omits it.
    pub fn display_match(&self) -> String {
        match &self.match_label {
            Some(m) if !m.is_empty() => m.clone(),
            _ => format!("{} vs {}", self.home_team, self.away_team),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse an ISO 8601 / RFC 3339 timestamp. Offset-less values are read as UTC.
/// Returns None for anything unparseable.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Lowercase, ASCII-only identifier: `"Süper Lig"` → `"super-lig"`.
pub fn slug(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut dash = false;
    for c in s.trim().chars().map(fold_char) {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            dash = false;
        } else if !dash && !out.is_empty() {
            out.push('-');
            dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// Fold common Latin diacritics to their base letter.
pub(crate) fn fold_char(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 'a',
        'Á' | 'À' | 'Â' | 'Ä' | 'Ã' | 'Å' => 'A',
        'ç' | 'ć' | 'č' => 'c',
        'Ç' | 'Ć' | 'Č' => 'C',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'ğ' => 'g',
        'Ğ' => 'G',
        'í' | 'ì' | 'î' | 'ï' | 'ı' => 'i',
        'Í' | 'Ì' | 'Î' | 'Ï' | 'İ' => 'I',
        'ñ' => 'n',
        'Ñ' => 'N',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' | 'ø' => 'o',
        'Ó' | 'Ò' | 'Ô' | 'Ö' | 'Õ' | 'Ø' => 'O',
        'ş' | 'ś' | 'š' => 's',
        'Ş' | 'Ś' | 'Š' => 'S',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'ý' | 'ÿ' => 'y',
        'ž' | 'ź' | 'ż' => 'z',
        'Ž' | 'Ź' | 'Ż' => 'Z',
        other => other,
    }
}
