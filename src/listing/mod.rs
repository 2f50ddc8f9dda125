//! Filtered, sorted and paginated tables over the case register.

pub mod personnel;
pub mod reports;
pub mod vehicles;

use crate::models::Unit;
use serde::Serialize;
use std::cmp::Ordering;

/// Label for a report without an assigned unit, or with a dangling one.
pub const UNASSIGNED_UNIT: &str = "Belum Ditunjuk";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SortDirection {
    #[value(name = "asc")]
    Ascending,
    #[default]
    #[value(name = "desc")]
    Descending,
}

impl SortDirection {
    /// Orient an ascending comparison.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// One page of a table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based, clamped into range.
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

impl<T> Page<T> {
    /// "Menampilkan 11-20 dari 42"
    pub fn range_label(&self) -> String {
        if self.total_items == 0 {
            return "Menampilkan 0 dari 0".to_string();
        }
        let first = (self.page - 1) * self.per_page + 1;
        let last = (self.page * self.per_page).min(self.total_items);
        format!("Menampilkan {}-{} dari {}", first, last, self.total_items)
    }
}

/// Cut `items` into pages and return the requested one.
pub fn paginate<T>(items: Vec<T>, page: usize, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(per_page);
    let page = page.clamp(1, total_pages.max(1));

    let items = items
        .into_iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .collect();

    Page {
        items,
        page,
        per_page,
        total_pages,
        total_items,
    }
}

/// Lowercased, trimmed search term; `None` when blank.
pub fn normalize_term(term: Option<&str>) -> Option<String> {
    term.map(|t| t.trim().to_lowercase()).filter(|t| !t.is_empty())
}

/// Case-insensitive substring match against an already lowercased term.
pub fn contains_term(haystack: &str, term: &str) -> bool {
    haystack.to_lowercase().contains(term)
}

/// Unit name for display and sorting.
pub fn unit_name<'a>(units: &'a [Unit], unit_id: Option<&str>) -> &'a str {
    unit_id
        .and_then(|id| units.iter().find(|u| u.id == id))
        .map(|u| u.name.as_str())
        .unwrap_or(UNASSIGNED_UNIT)
}
