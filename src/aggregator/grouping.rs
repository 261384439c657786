use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::types::{parse_timestamp, GroupedEvent, OddsMovement};

/// Group movements by event slug and order the groups by their largest
/// absolute change, highest first.
///
/// Single pass over the input. Groups live in a `Vec` in first-appearance
/// order with a slug → index map beside it, so the stable sort leaves groups
/// with equal severity in first-appearance order.
pub fn group_movements(movements: &[OddsMovement]) -> Vec<GroupedEvent> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<GroupedEvent> = Vec::new();

    for movement in movements {
        let slot = *index.entry(movement.event_slug.as_str()).or_insert_with(|| {
            groups.push(seed_group(movement));
            groups.len() - 1
        });
        let group = &mut groups[slot];

        group.movements.push(movement.clone());
        group.movement_count = group.movements.len();

        let abs_change = movement.change_percentage.abs();
        if abs_change > group.max_change_percentage {
            group.max_change_percentage = abs_change;
        }

        if is_later(&movement.last_updated, &group.last_updated) {
            group.last_updated = movement.last_updated.clone();
        }
    }

    groups.sort_by(|a, b| b.max_change_percentage.total_cmp(&a.max_change_percentage));
    groups
}

/// Event-level fields come from the first movement seen for the slug.
fn seed_group(first: &OddsMovement) -> GroupedEvent {
    GroupedEvent {
        event_slug: first.event_slug.clone(),
        match_label: first.match_label.clone(),
        sport: first.sport.clone(),
        sport_code: first.sport_code.clone(),
        league: first.league.clone(),
        league_country: first.league_country.clone(),
        event_time: first.event_time.clone(),
        event_status: first.event_status.clone(),
        is_live: first.is_live,
        home_score: first.home_score,
        away_score: first.away_score,
        minute_of_match: first.minute_of_match,
        betting_volume_percent: first.betting_volume_percent,
        home_team_country: first.home_team_country.clone(),
        away_team_country: first.away_team_country.clone(),
        movements: Vec::new(),
        movement_count: 0,
        max_change_percentage: 0.0,
        last_updated: first.last_updated.clone(),
    }
}

/// Strictly later as instants. An unparseable timestamp is the smallest
/// possible value: never later than anything, and anything valid beats it.
fn is_later(candidate: &str, current: &str) -> bool {
    parse_timestamp(candidate) > parse_timestamp(current)
}

/// Distinct sport and league labels for the movement filter dropdowns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementFacets {
    pub sports: Vec<String>,
    pub leagues: Vec<String>,
}

pub fn movement_facets(movements: &[OddsMovement]) -> MovementFacets {
    let sports: BTreeSet<&str> = movements
        .iter()
        .map(|m| m.sport.as_str())
        .filter(|s| !s.is_empty())
        .collect();
    let leagues: BTreeSet<&str> = movements
        .iter()
        .map(|m| m.league.as_str())
        .filter(|s| !s.is_empty())
        .collect();
    MovementFacets {
        sports: sports.into_iter().map(str::to_string).collect(),
        leagues: leagues.into_iter().map(str::to_string).collect(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Direction;

    fn movement(slug: &str, change: f64, last_updated: &str) -> OddsMovement {
        OddsMovement {
            event_slug: slug.to_string(),
            match_label: format!("{slug} match"),
            sport: "Futbol".to_string(),
            sport_code: "football".to_string(),
            league: "Süper Lig".to_string(),
            league_country: "Türkiye".to_string(),
            market: "Maç Sonucu".to_string(),
            market_description: "Match result".to_string(),
            outcome: "1".to_string(),
            opening_odds: 2.0,
            current_odds: 2.0 * (1.0 + change / 100.0),
            change_percentage: change,
            multiplier: 1.0 + change / 100.0,
            direction: if change < 0.0 { Direction::Steaming } else { Direction::Drifting },
            last_updated: last_updated.to_string(),
            event_time: "2026-10-16T18:00:00Z".to_string(),
            event_status: "scheduled".to_string(),
            is_live: false,
            home_score: None,
            away_score: None,
            minute_of_match: None,
            betting_volume_percent: None,
            home_team_country: String::new(),
            away_team_country: String::new(),
        }
    }

    fn slugs(groups: &[GroupedEvent]) -> Vec<&str> {
        groups.iter().map(|g| g.event_slug.as_str()).collect()
    }

    #[test]
    fn groups_and_orders_by_max_change() {
        let input = vec![
            movement("gal-fb", -17.5, "2025-01-07T10:30:00Z"),
            movement("rm-bar", 5.0, "2025-01-07T09:00:00Z"),
            movement("gal-fb", 20.0, "2025-01-07T09:45:00Z"),
        ];
        let groups = group_movements(&input);

        assert_eq!(slugs(&groups), vec!["gal-fb", "rm-bar"]);
        assert_eq!(groups[0].movement_count, 2);
        assert_eq!(groups[0].max_change_percentage, 20.0);
        assert_eq!(groups[1].movement_count, 1);
        assert_eq!(groups[1].max_change_percentage, 5.0);
    }

    #[test]
    fn every_movement_lands_in_exactly_one_group_in_input_order() {
        let input = vec![
            movement("a", 1.0, "2025-01-07T10:00:00Z"),
            movement("b", -3.0, "2025-01-07T10:01:00Z"),
            movement("a", -8.0, "2025-01-07T10:02:00Z"),
            movement("c", 0.0, "2025-01-07T10:03:00Z"),
            movement("b", 2.5, "2025-01-07T10:04:00Z"),
            movement("a", 4.0, "2025-01-07T10:05:00Z"),
        ];
        let groups = group_movements(&input);

        let total: usize = groups.iter().map(|g| g.movement_count).sum();
        assert_eq!(total, input.len());
        for g in &groups {
            assert_eq!(g.movement_count, g.movements.len());
            assert!(g.movements.iter().all(|m| m.event_slug == g.event_slug));
            let expected: Vec<&OddsMovement> = input.iter().filter(|m| m.event_slug == g.event_slug).collect();
            assert_eq!(g.movements.iter().collect::<Vec<_>>(), expected);
        }
    }

    #[test]
    fn max_change_and_latest_timestamp_are_exact() {
        let input = vec![
            movement("a", 3.0, "2025-01-07T12:00:00Z"),
            movement("a", -9.5, "2025-01-07T08:00:00Z"),
            movement("a", 7.0, "2025-01-07T14:00:00+03:00"),
        ];
        let groups = group_movements(&input);
        let g = &groups[0];

        let expected_max = g.movements.iter().map(|m| m.change_percentage.abs()).fold(0.0, f64::max);
        assert_eq!(g.max_change_percentage, expected_max);
        assert_eq!(g.max_change_percentage, 9.5);
        // 14:00+03:00 is 11:00Z, earlier than 12:00Z.
        assert_eq!(g.last_updated, "2025-01-07T12:00:00Z");
    }

    #[test]
    fn output_is_non_increasing_and_ties_keep_first_appearance() {
        let input = vec![
            movement("x", 5.0, "2025-01-07T10:00:00Z"),
            movement("y", 12.0, "2025-01-07T10:00:00Z"),
            movement("z", -5.0, "2025-01-07T10:00:00Z"),
            movement("w", 5.0, "2025-01-07T10:00:00Z"),
        ];
        let groups = group_movements(&input);
        assert!(groups
            .windows(2)
            .all(|w| w[0].max_change_percentage >= w[1].max_change_percentage));
        assert_eq!(slugs(&groups), vec!["y", "x", "z", "w"]);
    }

    #[test]
    fn malformed_timestamps_never_win_and_never_drop_records() {
        let input = vec![
            movement("a", 2.0, "not a date"),
            movement("a", 3.0, "2025-01-07T10:00:00Z"),
            movement("a", 4.0, ""),
        ];
        let groups = group_movements(&input);
        assert_eq!(groups[0].movement_count, 3);
        assert_eq!(groups[0].last_updated, "2025-01-07T10:00:00Z");

        let only_bad = group_movements(&[movement("b", 1.0, "garbage"), movement("b", 1.0, "")]);
        assert_eq!(only_bad[0].last_updated, "garbage");
    }

    #[test]
    fn zero_changes_are_valid() {
        let groups = group_movements(&[movement("a", 0.0, "2025-01-07T10:00:00Z")]);
        assert_eq!(groups[0].max_change_percentage, 0.0);
        assert_eq!(groups[0].movement_count, 1);
    }

    #[test]
    fn descriptive_fields_come_from_first_movement() {
        let mut first = movement("a", 1.0, "2025-01-07T10:00:00Z");
        first.is_live = true;
        first.home_score = Some(1);
        first.away_score = Some(0);
        first.minute_of_match = Some(55);
        let mut second = movement("a", 2.0, "2025-01-07T11:00:00Z");
        second.match_label = "renamed".to_string();

        let groups = group_movements(&[first, second]);
        assert_eq!(groups[0].match_label, "a match");
        assert!(groups[0].is_live);
        assert_eq!(groups[0].minute_of_match, Some(55));
    }

    #[test]
    fn empty_input_and_idempotence() {
        assert!(group_movements(&[]).is_empty());

        let input = vec![
            movement("a", 1.0, "2025-01-07T10:00:00Z"),
            movement("b", -6.0, "2025-01-07T10:00:00Z"),
        ];
        assert_eq!(group_movements(&input), group_movements(&input));
    }

    #[test]
    fn facets_are_distinct_and_sorted() {
        let mut a = movement("a", 1.0, "");
        a.sport = "Tenis".to_string();
        a.league = "Wimbledon".to_string();
        let b = movement("b", 1.0, "");
        let c = movement("c", 1.0, "");

        let facets = movement_facets(&[a, b, c]);
        assert_eq!(facets.sports, vec!["Futbol", "Tenis"]);
        assert_eq!(facets.leagues, vec!["Süper Lig", "Wimbledon"]);
    }
}
