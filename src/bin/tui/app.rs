use chrono::{DateTime, Local, Utc};
use crossterm::event::KeyCode;
use serde::{de::DeserializeOwned, Serialize};

use oddsboard::api::routes::{
    EventsQuery, EventsResponse, HealthResponse, MovementsQuery, MovementsResponse,
    SmartMoneyQuery, SmartMoneyResponse,
};
use oddsboard::config::DEFAULT_PER_PAGE;
use oddsboard::filter::{EventFilters, MovementFilters, SmartMoneyFilters};
use oddsboard::pagination::PaginationMeta;
use oddsboard::types::{Direction, Event, GroupedEvent, League, Severity, SmartMoneyMovement};

/// Step for the `+` / `-` keys on the minimum-change filters.
const MIN_PERCENTAGE_STEP: f64 = 5.0;

// ---------------------------------------------------------------------------
// App state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionStatus {
    Connected,
    Error(String),
    Connecting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Events,
    Movements,
    SmartMoney,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Events, Tab::Movements, Tab::SmartMoney];

    pub fn next(self) -> Self {
        match self {
            Tab::Events => Tab::Movements,
            Tab::Movements => Tab::SmartMoney,
            Tab::SmartMoney => Tab::Events,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Tab::Events => "Events",
            Tab::Movements => "Odds movements",
            Tab::SmartMoney => "Smart money",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Tab::Events => 0,
            Tab::Movements => 1,
            Tab::SmartMoney => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputMode {
    Normal,
    /// Editing the search box; holds the draft text.
    Search(String),
}

/// What the event loop should do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Refresh,
    Quit,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub status: ConnectionStatus,
    pub tab: Tab,
    pub input: InputMode,
    pub selected: usize,
    pub base_url: String,
    pub last_refresh: std::time::Instant,

    pub event_filters: EventFilters,
    pub event_page: u32,
    pub events: Vec<Event>,
    pub events_meta: PaginationMeta,
    pub available_leagues: Vec<League>,
    pub events_unfiltered: usize,

    pub movement_filters: MovementFilters,
    pub movement_page: u32,
    pub movements: Vec<GroupedEvent>,
    pub movements_meta: PaginationMeta,

    pub smart_money_filters: SmartMoneyFilters,
    pub smart_money: Vec<SmartMoneyMovement>,

    pub health: Option<HealthResponse>,
}

impl AppState {
    pub fn new(base_url: String) -> Self {
        Self {
            status: ConnectionStatus::Connecting,
            tab: Tab::Events,
            input: InputMode::Normal,
            selected: 0,
            base_url,
            last_refresh: std::time::Instant::now(),
            event_filters: EventFilters::default(),
            event_page: 1,
            events: Vec::new(),
            events_meta: PaginationMeta::default(),
            available_leagues: Vec::new(),
            events_unfiltered: 0,
            movement_filters: MovementFilters::default(),
            movement_page: 1,
            movements: Vec::new(),
            movements_meta: PaginationMeta::default(),
            smart_money_filters: SmartMoneyFilters::default(),
            smart_money: Vec::new(),
            health: None,
        }
    }

    /// Rows in the active tab's table.
    pub fn row_count(&self) -> usize {
        match self.tab {
            Tab::Events => self.events.len(),
            Tab::Movements => self.movements.len(),
            Tab::SmartMoney => self.smart_money.len(),
        }
    }

    pub fn current_search(&self) -> &str {
        match self.tab {
            Tab::Events => &self.event_filters.search,
            Tab::Movements => &self.movement_filters.search,
            Tab::SmartMoney => &self.smart_money_filters.search,
        }
    }

    pub fn has_active_filters(&self) -> bool {
        match self.tab {
            Tab::Events => self.event_filters.has_active_filters(),
            Tab::Movements => self.movement_filters.has_active_filters(),
            Tab::SmartMoney => self.smart_money_filters.has_active_filters(),
        }
    }

    /// Pagination of the active tab, if it is paginated.
    pub fn current_meta(&self) -> Option<PaginationMeta> {
        match self.tab {
            Tab::Events => Some(self.events_meta),
            Tab::Movements => Some(self.movements_meta),
            Tab::SmartMoney => None,
        }
    }

    // -----------------------------------------------------------------------
    // Keys
    // -----------------------------------------------------------------------

    pub fn handle_key(&mut self, code: KeyCode) -> Action {
        if let InputMode::Search(draft) = &mut self.input {
            match code {
                KeyCode::Enter => {
                    let text = draft.trim().to_string();
                    self.input = InputMode::Normal;
                    self.set_search(text);
                    return self.filters_changed();
                }
                KeyCode::Esc => self.input = InputMode::Normal,
                KeyCode::Backspace => {
                    draft.pop();
                }
                KeyCode::Char(c) => draft.push(c),
                _ => {}
            }
            return Action::None;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Char('Q') => Action::Quit,
            KeyCode::Char('r') | KeyCode::Char('R') => Action::Refresh,
            KeyCode::Tab => {
                self.tab = self.tab.next();
                self.selected = 0;
                Action::None
            }
            KeyCode::Char('/') => {
                self.input = InputMode::Search(self.current_search().to_string());
                Action::None
            }
            KeyCode::Char('l') => {
                match self.tab {
                    Tab::Events => {
                        self.event_filters = self.event_filters.with_live_only(!self.event_filters.live_only);
                    }
                    Tab::Movements => self.movement_filters.status = self.movement_filters.status.cycle(),
                    Tab::SmartMoney => {
                        self.smart_money_filters.status = self.smart_money_filters.status.cycle()
                    }
                }
                self.filters_changed()
            }
            KeyCode::Char('t') if self.tab == Tab::Events => {
                self.event_filters = self.event_filters.with_time_range(self.event_filters.time_range.cycle());
                self.filters_changed()
            }
            KeyCode::Char('d') if self.tab == Tab::Movements => {
                self.movement_filters.direction = Direction::cycle(self.movement_filters.direction);
                self.filters_changed()
            }
            KeyCode::Char('s') if self.tab == Tab::SmartMoney => {
                self.smart_money_filters.severity = Severity::cycle(self.smart_money_filters.severity);
                self.filters_changed()
            }
            KeyCode::Char('+') | KeyCode::Char('=') => self.step_min_percentage(MIN_PERCENTAGE_STEP),
            KeyCode::Char('-') => self.step_min_percentage(-MIN_PERCENTAGE_STEP),
            KeyCode::Char('x') => {
                match self.tab {
                    Tab::Events => self.event_filters = self.event_filters.reset(),
                    Tab::Movements => self.movement_filters = self.movement_filters.reset(),
                    Tab::SmartMoney => self.smart_money_filters = self.smart_money_filters.reset(),
                }
                self.filters_changed()
            }
            KeyCode::Char('n') => self.turn_page(1),
            KeyCode::Char('p') => self.turn_page(-1),
            KeyCode::Down | KeyCode::Char('j') => {
                let max = self.row_count().saturating_sub(1);
                self.selected = (self.selected + 1).min(max);
                Action::None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                Action::None
            }
            _ => Action::None,
        }
    }

    fn set_search(&mut self, text: String) {
        match self.tab {
            Tab::Events => self.event_filters = self.event_filters.with_search(text),
            Tab::Movements => self.movement_filters.search = text,
            Tab::SmartMoney => self.smart_money_filters.search = text,
        }
    }

    fn step_min_percentage(&mut self, delta: f64) -> Action {
        let slot = match self.tab {
            Tab::Events => return Action::None,
            Tab::Movements => &mut self.movement_filters.min_percentage,
            Tab::SmartMoney => &mut self.smart_money_filters.min_percentage,
        };
        let next = (*slot + delta).max(0.0);
        if next == *slot {
            return Action::None;
        }
        *slot = next;
        self.filters_changed()
    }

    fn turn_page(&mut self, delta: i64) -> Action {
        let (page, meta) = match self.tab {
            Tab::Events => (&mut self.event_page, self.events_meta),
            Tab::Movements => (&mut self.movement_page, self.movements_meta),
            Tab::SmartMoney => return Action::None,
        };
        let last = meta.total_pages.max(1);
        let next = (*page as i64 + delta).clamp(1, last as i64) as u32;
        if next == *page {
            return Action::None;
        }
        *page = next;
        self.selected = 0;
        Action::Refresh
    }

    /// Any criteria change starts over at page 1.
    fn filters_changed(&mut self) -> Action {
        match self.tab {
            Tab::Events => self.event_page = 1,
            Tab::Movements => self.movement_page = 1,
            Tab::SmartMoney => {}
        }
        self.selected = 0;
        Action::Refresh
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn events_query(&self) -> EventsQuery {
        EventsQuery::from_filters(&self.event_filters, &[], self.event_page, DEFAULT_PER_PAGE)
    }

    pub fn movements_query(&self) -> MovementsQuery {
        MovementsQuery::from_filters(&self.movement_filters, self.movement_page, DEFAULT_PER_PAGE)
    }

    pub fn smart_money_query(&self) -> SmartMoneyQuery {
        SmartMoneyQuery::from_filters(&self.smart_money_filters)
    }

    pub async fn refresh(&mut self, client: &reqwest::Client) {
        let events_url = format!("{}/events", self.base_url);
        let movements_url = format!("{}/odds/movements", self.base_url);
        let smart_money_url = format!("{}/smart-money", self.base_url);
        let health_url = format!("{}/health", self.base_url);

        let (events_q, movements_q, smart_money_q) =
            (self.events_query(), self.movements_query(), self.smart_money_query());
        let no_query: [(&str, &str); 0] = [];

        let (events_res, movements_res, smart_money_res, health_res) = tokio::join!(
            get_json::<EventsResponse, _>(client, &events_url, &events_q),
            get_json::<MovementsResponse, _>(client, &movements_url, &movements_q),
            get_json::<SmartMoneyResponse, _>(client, &smart_money_url, &smart_money_q),
            get_json::<HealthResponse, _>(client, &health_url, &no_query),
        );

        let mut first_error: Option<String> = None;

        match events_res {
            Ok(resp) => {
                self.events = resp.data;
                self.events_meta = resp.pagination;
                self.available_leagues = resp.available_leagues;
                self.events_unfiltered = resp.total_unfiltered;
            }
            Err(e) => first_error = first_error.or(Some(e)),
        }
        match movements_res {
            Ok(resp) => {
                self.movements = resp.data;
                self.movements_meta = resp.pagination;
            }
            Err(e) => first_error = first_error.or(Some(e)),
        }
        match smart_money_res {
            Ok(resp) => self.smart_money = resp.movements,
            Err(e) => first_error = first_error.or(Some(e)),
        }
        if let Ok(health) = health_res {
            self.health = Some(health);
        }

        self.selected = self.selected.min(self.row_count().saturating_sub(1));
        self.status = match first_error {
            Some(e) => ConnectionStatus::Error(e),
            None => {
                self.last_refresh = std::time::Instant::now();
                ConnectionStatus::Connected
            }
        };
    }
}

async fn get_json<T, Q>(client: &reqwest::Client, url: &str, query: &Q) -> Result<T, String>
where
    T: DeserializeOwned,
    Q: Serialize + ?Sized,
{
    let resp = client.get(url).query(query).send().await.map_err(|e| e.to_string())?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(format!("{status}: {}", truncate(&body, 60)));
    }
    resp.json::<T>().await.map_err(|e| format!("parse error: {e}"))
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

pub fn format_odds(v: Option<f64>) -> String {
    match v {
        Some(o) if o > 0.0 => format!("{o:.2}"),
        _ => "—".to_string(),
    }
}

pub fn format_change(pct: f64) -> String {
    format!("{pct:+.1}%")
}

/// Live events show the match minute, others the local kick-off time.
pub fn format_kickoff(event: &Event) -> String {
    if event.is_live {
        return event.minute.map_or("LIVE".to_string(), |m| format!("{m}'"));
    }
    format_local_time(event.start_time, Local::now().date_naive())
}

/// `HH:MM` for today, `DD.MM HH:MM` otherwise.
pub fn format_local_time(t: DateTime<Utc>, today: chrono::NaiveDate) -> String {
    let local = t.with_timezone(&Local);
    if local.date_naive() == today {
        local.format("%H:%M").to_string()
    } else {
        local.format("%d.%m %H:%M").to_string()
    }
}

pub fn format_score(event: &Event) -> String {
    event.score.map_or("-".to_string(), |s| format!("{} - {}", s.home, s.away))
}

pub fn format_minutes_to_kickoff(minutes: i64) -> String {
    match minutes {
        m if m <= 0 => "started".to_string(),
        m if m < 60 => format!("{m}m"),
        m => format!("{}h {:02}m", m / 60, m % 60),
    }
}

/// Char-aware truncation with an ellipsis.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oddsboard::filter::StatusFilter;
    use oddsboard::types::TimeRange;

    fn app() -> AppState {
        AppState::new("http://localhost:3000".to_string())
    }

    #[test]
    fn search_input_applies_on_enter_and_cancels_on_esc() {
        let mut app = app();
        assert_eq!(app.handle_key(KeyCode::Char('/')), Action::None);
        for c in "gal".chars() {
            app.handle_key(KeyCode::Char(c));
        }
        assert_eq!(app.handle_key(KeyCode::Enter), Action::Refresh);
        assert_eq!(app.event_filters.search, "gal");

        app.handle_key(KeyCode::Char('/'));
        app.handle_key(KeyCode::Backspace);
        app.handle_key(KeyCode::Esc);
        assert_eq!(app.event_filters.search, "gal");
        assert_eq!(app.input, InputMode::Normal);
    }

    #[test]
    fn keys_in_search_mode_are_text() {
        let mut app = app();
        app.handle_key(KeyCode::Char('/'));
        assert_eq!(app.handle_key(KeyCode::Char('q')), Action::None);
        assert_eq!(app.input, InputMode::Search("q".to_string()));
    }

    #[test]
    fn filter_keys_reset_the_page() {
        let mut app = app();
        app.event_page = 3;
        assert_eq!(app.handle_key(KeyCode::Char('t')), Action::Refresh);
        assert_eq!(app.event_filters.time_range, TimeRange::Today);
        assert_eq!(app.event_page, 1);

        app.handle_key(KeyCode::Char('l'));
        assert!(app.event_filters.live_only);
        assert_eq!(app.handle_key(KeyCode::Char('x')), Action::Refresh);
        assert!(!app.has_active_filters());
    }

    #[test]
    fn movement_tab_keys() {
        let mut app = app();
        app.handle_key(KeyCode::Tab);
        assert_eq!(app.tab, Tab::Movements);

        app.handle_key(KeyCode::Char('d'));
        assert_eq!(app.movement_filters.direction, Some(Direction::Steaming));
        app.handle_key(KeyCode::Char('l'));
        assert_eq!(app.movement_filters.status, StatusFilter::Live);
        app.handle_key(KeyCode::Char('+'));
        app.handle_key(KeyCode::Char('+'));
        assert_eq!(app.movement_filters.min_percentage, 10.0);
        app.handle_key(KeyCode::Char('-'));
        app.handle_key(KeyCode::Char('-'));
        assert_eq!(app.handle_key(KeyCode::Char('-')), Action::None);
        assert_eq!(app.movement_filters.min_percentage, 0.0);

        // time range only applies to events
        assert_eq!(app.handle_key(KeyCode::Char('t')), Action::None);

        let q = app.movements_query();
        assert_eq!(q.direction.as_deref(), Some("STEAMING"));
        assert_eq!(q.status.as_deref(), Some("live"));
        assert_eq!(q.min_percentage, None);
    }

    #[test]
    fn paging_is_bounded_by_total_pages() {
        let mut app = app();
        assert_eq!(app.handle_key(KeyCode::Char('p')), Action::None);
        assert_eq!(app.handle_key(KeyCode::Char('n')), Action::None);

        app.events_meta = PaginationMeta { page: 1, per_page: 20, total: 45, total_pages: 3, has_next: true, has_previous: false };
        assert_eq!(app.handle_key(KeyCode::Char('n')), Action::Refresh);
        assert_eq!(app.handle_key(KeyCode::Char('n')), Action::Refresh);
        assert_eq!(app.handle_key(KeyCode::Char('n')), Action::None);
        assert_eq!(app.event_page, 3);
        assert_eq!(app.events_query().page, Some(3));
    }

    #[test]
    fn smart_money_severity_cycles() {
        let mut app = app();
        app.handle_key(KeyCode::Tab);
        app.handle_key(KeyCode::Tab);
        assert_eq!(app.tab, Tab::SmartMoney);
        app.handle_key(KeyCode::Char('s'));
        assert_eq!(app.smart_money_filters.severity, Some(Severity::Low));
        assert_eq!(app.smart_money_query().severity.as_deref(), Some("low"));
        assert_eq!(app.handle_key(KeyCode::Char('n')), Action::None);
    }

    #[test]
    fn formatting() {
        assert_eq!(format_odds(Some(2.1)), "2.10");
        assert_eq!(format_odds(None), "—");
        assert_eq!(format_odds(Some(0.0)), "—");
        assert_eq!(format_change(-17.5), "-17.5%");
        assert_eq!(format_change(20.0), "+20.0%");
        assert_eq!(format_minutes_to_kickoff(45), "45m");
        assert_eq!(format_minutes_to_kickoff(125), "2h 05m");
        assert_eq!(format_minutes_to_kickoff(0), "started");
        assert_eq!(truncate("Fenerbahçe Beko", 8), "Fenerba…");
        assert_eq!(truncate("Arsenal", 8), "Arsenal");
    }
}
