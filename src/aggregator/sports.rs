use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ALL_SPORTS;
use crate::types::{Event, EventStatus};

/// Sports highlighted in the sport picker regardless of volume.
const POPULAR_SPORTS: &[&str] = &["football", "basketball", "tennis", "esports"];

/// One entry of the sport picker, with event counts from the current snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SportCategory {
    pub id: String,
    pub name: String,
    pub icon: String,
    /// All events of the sport in the snapshot.
    pub count: usize,
    pub live_count: usize,
    /// Scheduled events that have not kicked off yet.
    pub upcoming_count: usize,
    /// Events carrying AI predictions.
    pub predictions: usize,
    pub is_popular: bool,
}

impl SportCategory {
    /// The `all` pseudo-sport summing every entry in `sports`.
    pub fn all(sports: &[SportCategory]) -> Self {
        SportCategory {
            id: ALL_SPORTS.to_string(),
            name: "All".to_string(),
            icon: "🏆".to_string(),
            count: sports.iter().map(|s| s.count).sum(),
            live_count: sports.iter().map(|s| s.live_count).sum(),
            upcoming_count: sports.iter().map(|s| s.upcoming_count).sum(),
            predictions: sports.iter().map(|s| s.predictions).sum(),
            is_popular: true,
        }
    }
}

pub fn sport_catalogue(events: &[Event]) -> Vec<SportCategory> {
    sport_catalogue_at(events, Utc::now())
}

/// One category per distinct sport id, busiest first. Name and icon come from
/// the first event seen for the id; equal counts keep first appearance.
pub fn sport_catalogue_at(events: &[Event], now: DateTime<Utc>) -> Vec<SportCategory> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut sports: Vec<SportCategory> = Vec::new();

    for event in events {
        let slot = *index.entry(event.sport.id.as_str()).or_insert_with(|| {
            sports.push(SportCategory {
                id: event.sport.id.clone(),
                name: event.sport.name.clone(),
                icon: event.sport.icon.clone(),
                count: 0,
                live_count: 0,
                upcoming_count: 0,
                predictions: 0,
                is_popular: POPULAR_SPORTS.contains(&event.sport.id.as_str()),
            });
            sports.len() - 1
        });
        let sport = &mut sports[slot];

        sport.count += 1;
        if event.is_live {
            sport.live_count += 1;
        } else if event.status == EventStatus::Scheduled && event.start_time >= now {
            sport.upcoming_count += 1;
        }
        if event.has_ai_predictions {
            sport.predictions += 1;
        }
    }

    sports.sort_by(|a, b| b.count.cmp(&a.count));
    sports
}
