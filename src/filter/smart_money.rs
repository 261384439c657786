use serde::{Deserialize, Serialize};

use crate::filter::{above_zero, contains_folded, StatusFilter};
use crate::types::{Severity, SmartMoneyMovement};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SmartMoneyFilters {
    /// Matched against the match label and both team names.
    pub search: String,
    pub severity: Option<Severity>,
    pub status: StatusFilter,
    /// Compared with `abs(change_percent)`; applied only when above zero.
    pub min_percentage: f64,
}

impl SmartMoneyFilters {
    pub fn has_active_filters(&self) -> bool {
        !self.search.is_empty()
            || self.severity.is_some()
            || self.status != StatusFilter::All
            || above_zero(self.min_percentage)
    }

    pub fn reset(&self) -> Self {
        Self::default()
    }
}

pub fn filter_smart_money(
    movements: &[SmartMoneyMovement],
    filters: &SmartMoneyFilters,
) -> Vec<SmartMoneyMovement> {
    let query = filters.search.to_lowercase();

    movements
        .iter()
        .filter(|m| {
            query.is_empty()
                || m.match_label.as_deref().is_some_and(|l| contains_folded(l, &query))
                || contains_folded(&m.home_team, &query)
                || contains_folded(&m.away_team, &query)
        })
        .filter(|m| filters.severity.map_or(true, |s| m.severity == Some(s)))
        .filter(|m| filters.status.accepts(m.is_live))
        .filter(|m| !above_zero(filters.min_percentage) || m.change_percent.abs() >= filters.min_percentage)
        .cloned()
        .collect()
}
