use serde::{Deserialize, Serialize};

use crate::config::MAX_PER_PAGE;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    pub total: usize,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Slice one page out of `items`. `page` is 1-based and clamped to at least 1;
/// `per_page` is clamped to `1..=MAX_PER_PAGE`. A page past the end is empty
/// but still reports the real totals.
pub fn paginate<T: Clone>(items: &[T], page: u32, per_page: u32) -> Paginated<T> {
    let page = page.max(1);
    let per_page = per_page.clamp(1, MAX_PER_PAGE);
    let total = items.len();
    let total_pages = total.div_ceil(per_page as usize) as u32;

    let start = (page as usize - 1).saturating_mul(per_page as usize);
    let data = if start < total {
        let end = (start + per_page as usize).min(total);
        items[start..end].to_vec()
    } else {
        Vec::new()
    };

    Paginated {
        data,
        pagination: PaginationMeta {
            page,
            per_page,
            total,
            total_pages,
            has_next: page < total_pages,
            has_previous: page > 1,
        },
    }
}

/// Page buttons to show: at most `max_shown` consecutive numbers around
/// `current`, shifted left when the window would run past the last page.
pub fn page_numbers(current: u32, total_pages: u32, max_shown: u32) -> Vec<u32> {
    if total_pages == 0 || max_shown == 0 {
        return Vec::new();
    }
    let current = current.clamp(1, total_pages);
    let mut start = current.saturating_sub(max_shown / 2).max(1);
    let end = (start + max_shown - 1).min(total_pages);
    if end == total_pages {
        start = end.saturating_sub(max_shown - 1).max(1);
    }
    (start..=end).collect()
}
