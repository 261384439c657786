use serde::{Deserialize, Serialize};

use crate::filter::{above_zero, contains_folded, StatusFilter};
use crate::types::{Direction, GroupedEvent};

/// Criteria for the grouped odds-movement view, applied after aggregation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovementFilters {
    /// Substring of the match label, case-insensitive.
    pub search: String,
    /// Exact sport label; `None` is "all".
    pub sport: Option<String>,
    /// Exact league label; `None` is "all".
    pub league: Option<String>,
    /// Keep groups with at least one movement in this direction.
    pub direction: Option<Direction>,
    /// Applied only when greater than zero.
    pub min_percentage: f64,
    pub status: StatusFilter,
}

impl MovementFilters {
    pub fn has_active_filters(&self) -> bool {
        !self.search.is_empty()
            || self.sport.is_some()
            || self.league.is_some()
            || self.direction.is_some()
            || above_zero(self.min_percentage)
            || self.status != StatusFilter::All
    }

    pub fn reset(&self) -> Self {
        Self::default()
    }
}

pub fn filter_grouped(groups: &[GroupedEvent], filters: &MovementFilters) -> Vec<GroupedEvent> {
    let query = filters.search.to_lowercase();

    groups
        .iter()
        .filter(|g| query.is_empty() || contains_folded(&g.match_label, &query))
        .filter(|g| filters.sport.as_ref().map_or(true, |s| g.sport == *s))
        .filter(|g| filters.league.as_ref().map_or(true, |l| g.league == *l))
        .filter(|g| {
            filters
                .direction
                .map_or(true, |d| g.movements.iter().any(|m| m.direction == d))
        })
        .filter(|g| !above_zero(filters.min_percentage) || g.max_change_percentage >= filters.min_percentage)
        .filter(|g| filters.status.accepts(g.is_live))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::group_movements;
    use crate::types::OddsMovement;

    fn movement(slug: &str, label: &str, league: &str, change: f64, direction: Direction, live: bool) -> OddsMovement {
        OddsMovement {
            event_slug: slug.to_string(),
            match_label: label.to_string(),
            sport: "Futbol".to_string(),
            sport_code: "football".to_string(),
            league: league.to_string(),
            league_country: String::new(),
            market: "Maç Sonucu".to_string(),
            market_description: String::new(),
            outcome: "1".to_string(),
            opening_odds: 2.0,
            current_odds: 2.0,
            change_percentage: change,
            multiplier: 1.0,
            direction,
            last_updated: "2025-01-07T10:00:00Z".to_string(),
            event_time: "2025-01-07T18:00:00Z".to_string(),
            event_status: String::new(),
            is_live: live,
            home_score: None,
            away_score: None,
            minute_of_match: None,
            betting_volume_percent: None,
            home_team_country: String::new(),
            away_team_country: String::new(),
        }
    }

    fn groups() -> Vec<GroupedEvent> {
        group_movements(&[
            movement("gal-fb", "Galatasaray vs Fenerbahçe", "Süper Lig", -17.5, Direction::Steaming, false),
            movement("gal-fb", "Galatasaray vs Fenerbahçe", "Süper Lig", 20.0, Direction::Drifting, false),
            movement("mci-ars", "Manchester City vs Arsenal", "Premier League", 8.0, Direction::Drifting, true),
            movement("rm-bar", "Real Madrid vs Barcelona", "La Liga", -5.0, Direction::Shortening, false),
        ])
    }

    fn slugs(groups: &[GroupedEvent]) -> Vec<&str> {
        groups.iter().map(|g| g.event_slug.as_str()).collect()
    }

    #[test]
    fn defaults_pass_everything() {
        let all = groups();
        assert_eq!(filter_grouped(&all, &MovementFilters::default()), all);
        assert!(!MovementFilters::default().has_active_filters());
    }

    #[test]
    fn search_matches_label_case_insensitively() {
        let f = MovementFilters { search: "ARSENAL".to_string(), ..Default::default() };
        assert_eq!(slugs(&filter_grouped(&groups(), &f)), vec!["mci-ars"]);
    }

    #[test]
    fn direction_matches_any_movement_in_group() {
        let f = MovementFilters { direction: Some(Direction::Steaming), ..Default::default() };
        assert_eq!(slugs(&filter_grouped(&groups(), &f)), vec!["gal-fb"]);

        let f = MovementFilters { direction: Some(Direction::Drifting), ..Default::default() };
        assert_eq!(slugs(&filter_grouped(&groups(), &f)), vec!["gal-fb", "mci-ars"]);
    }

    #[test]
    fn threshold_and_status_combine() {
        let f = MovementFilters { min_percentage: 6.0, ..Default::default() };
        assert_eq!(slugs(&filter_grouped(&groups(), &f)), vec!["gal-fb", "mci-ars"]);

        let f = MovementFilters { min_percentage: 6.0, status: StatusFilter::Scheduled, ..Default::default() };
        assert_eq!(slugs(&filter_grouped(&groups(), &f)), vec!["gal-fb"]);

        let f = MovementFilters { status: StatusFilter::Live, ..Default::default() };
        assert_eq!(slugs(&filter_grouped(&groups(), &f)), vec!["mci-ars"]);
    }

    #[test]
    fn league_and_sport_are_exact() {
        let f = MovementFilters { league: Some("La Liga".to_string()), ..Default::default() };
        assert_eq!(slugs(&filter_grouped(&groups(), &f)), vec!["rm-bar"]);

        let f = MovementFilters { league: Some("La".to_string()), ..Default::default() };
        assert!(filter_grouped(&groups(), &f).is_empty());

        let f = MovementFilters { sport: Some("Basketbol".to_string()), ..Default::default() };
        assert!(filter_grouped(&groups(), &f).is_empty());
    }

    #[test]
    fn reset_clears_everything() {
        let f = MovementFilters {
            search: "x".to_string(),
            direction: Some(Direction::Drifting),
            min_percentage: 10.0,
            status: StatusFilter::Live,
            ..Default::default()
        };
        assert!(f.has_active_filters());
        assert_eq!(f.reset(), MovementFilters::default());
    }
}
