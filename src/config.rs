use crate::error::{AppError, Result};

pub const EVENTS_PATH: &str = "/api/events";
pub const ODDS_MOVERS_PATH: &str = "/api/odds/big-movers";
pub const SMART_MONEY_PATH: &str = "/api/smart-money/big-movers";

/// Page size used when a request does not ask for one.
pub const DEFAULT_PER_PAGE: u32 = 20;

/// Upper bound on `per_page` accepted by the view API.
pub const MAX_PER_PAGE: u32 = 100;

/// Page buttons shown at once by the pagination widget.
pub const PAGE_WINDOW: u32 = 5;

/// Safety cap when following a paginated events listing.
pub const MAX_EVENT_PAGES: u32 = 50;

/// Pseudo sport id meaning "no sport restriction".
pub const ALL_SPORTS: &str = "all";

#[derive(Debug, Clone)]
pub struct Config {
    /// Backend base URL (API_URL). Empty means mock mode.
    pub api_url: String,
    pub events_path: String,
    pub use_mock_data: bool,
    pub log_level: String,
    pub api_port: u16,
    /// Seconds between snapshot refreshes (REFRESH_INTERVAL_SECS)
    pub refresh_interval_secs: u64,
    /// Look-back window for big movers (MOVERS_HOURS)
    pub movers_hours: u32,
    /// Minimum change percentage for big movers (MOVERS_THRESHOLD)
    pub movers_threshold: f64,
    pub http_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let api_url = std::env::var("API_URL")
            .unwrap_or_default()
            .trim()
            .trim_end_matches('/')
            .to_string();
        Ok(Self {
            use_mock_data: api_url.is_empty()
                || std::env::var("USE_MOCK_DATA")
                    .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
                    .unwrap_or(false),
            api_url,
            events_path: std::env::var("EVENTS_PATH").unwrap_or_else(|_| EVENTS_PATH.to_string()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            refresh_interval_secs: std::env::var("REFRESH_INTERVAL_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse::<u64>()
                .unwrap_or(30)
                .max(1),
            movers_hours: std::env::var("MOVERS_HOURS")
                .unwrap_or_else(|_| "48".to_string())
                .parse::<u32>()
                .unwrap_or(48),
            movers_threshold: std::env::var("MOVERS_THRESHOLD")
                .unwrap_or_else(|_| "5".to_string())
                .parse::<f64>()
                .unwrap_or(5.0),
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse::<u64>()
                .unwrap_or(10),
        })
    }

    /// Configuration for local development against the bundled mock data.
    pub fn mock() -> Self {
        Self {
            api_url: String::new(),
            events_path: EVENTS_PATH.to_string(),
            use_mock_data: true,
            log_level: "info".to_string(),
            api_port: 3000,
            refresh_interval_secs: 30,
            movers_hours: 48,
            movers_threshold: 5.0,
            http_timeout_secs: 10,
        }
    }
}
