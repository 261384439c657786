use serde::{Deserialize, Serialize};

use crate::aggregator::SportCategory;

/// Criteria for the sport picker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SportFilters {
    /// Prepend the `all` pseudo-sport, summed over the full catalogue.
    pub include_all: bool,
    pub popular_only: bool,
    /// Drop sports with fewer events than this.
    pub min_count: Option<usize>,
}

/// The `all` entry is added before filtering, so it is subject to the
/// minimum count like any other sport.
pub fn filter_sports(sports: &[SportCategory], filters: &SportFilters) -> Vec<SportCategory> {
    let all = filters.include_all.then(|| SportCategory::all(sports));

    all.into_iter()
        .chain(sports.iter().cloned())
        .filter(|s| !filters.popular_only || s.is_popular)
        .filter(|s| filters.min_count.map_or(true, |min| s.count >= min))
        .collect()
}
