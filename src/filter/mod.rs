//! Client-side filter chains. Every filter here is a pure AND of independent
//! predicates over an immutable input slice; output keeps input order.

pub mod events;
pub mod movements;
pub mod smart_money;
pub mod sports;

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::types::fold_char;

pub use events::{available_leagues, filter_events, filter_events_at, scope_by_sports, EventFilters, EventView, TimeWindow};
pub use movements::{filter_grouped, MovementFilters};
pub use smart_money::{filter_smart_money, SmartMoneyFilters};
pub use sports::{filter_sports, SportFilters};

/// Live/scheduled partition used by the movement views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Live,
    Scheduled,
}

impl StatusFilter {
    pub fn accepts(self, is_live: bool) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Live => is_live,
            StatusFilter::Scheduled => !is_live,
        }
    }

    pub fn cycle(self) -> Self {
        match self {
            StatusFilter::All => StatusFilter::Live,
            StatusFilter::Live => StatusFilter::Scheduled,
            StatusFilter::Scheduled => StatusFilter::All,
        }
    }
}

impl std::str::FromStr for StatusFilter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" | "" => Ok(StatusFilter::All),
            "live" => Ok(StatusFilter::Live),
            "scheduled" => Ok(StatusFilter::Scheduled),
            _ => Err(AppError::BadRequest(format!("unknown status filter: {s}"))),
        }
    }
}

impl std::fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StatusFilter::All => "all",
            StatusFilter::Live => "live",
            StatusFilter::Scheduled => "scheduled",
        };
        write!(f, "{s}")
    }
}

/// A minimum-change threshold only applies when it is a finite positive
/// number; NaN and infinities disable it.
pub(crate) fn above_zero(min_percentage: f64) -> bool {
    min_percentage.is_finite() && min_percentage > 0.0
}

/// Case-insensitive substring test. `needle` must already be lowercase.
pub(crate) fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Display-name ordering close to a locale compare: diacritics folded and
/// case ignored first, raw text as the tie-break so the order is total.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

fn collation_key(s: &str) -> String {
    s.chars().map(fold_char).flat_map(char::to_lowercase).collect()
}
