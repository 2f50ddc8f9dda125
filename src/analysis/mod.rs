//! Case aggregation and analytics.
//!
//! `aggregator` rebuilds the case register from the remote store; the other
//! modules are pure functions over the aggregated reports:
//! - `scope`: which reports a viewer may see
//! - `summary`: per-category tallies and date-range filtering
//! - `trend`: three-month and yearly trends
//! - `ranking`: top-N rankings
//! - `dashboard`: view models combining the above
//! - `calendar`: Indonesian month names and month arithmetic

pub mod aggregator;
pub mod calendar;
pub mod dashboard;
pub mod ranking;
pub mod scope;
pub mod summary;
pub mod trend;

pub use aggregator::{aggregate, Aggregation};
pub use scope::Scope;

use chrono::FixedOffset;
use serde::Serialize;
use std::collections::HashMap;

/// A derived statistic that may have nothing to show.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Stats<T> {
    /// No reports matched; rendered as "Data tidak tersedia."
    Empty,
    Data(T),
}

impl<T> Stats<T> {
    pub fn data(&self) -> Option<&T> {
        match self {
            Stats::Empty => None,
            Stats::Data(data) => Some(data),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Stats::Empty)
    }
}

/// Knobs shared by the analytics functions.
#[derive(Debug, Clone, Copy)]
pub struct AnalyticsOptions {
    /// Offset used to decide which calendar month a timestamp falls in.
    pub utc_offset: FixedOffset,
    /// Length of unit, personnel and vehicle-type rankings.
    pub top_n: usize,
    /// Length of the dashboard's case-type ranking.
    pub top_case_types: usize,
}

impl Default for AnalyticsOptions {
    fn default() -> Self {
        Self {
            utc_offset: calendar::utc_offset(9),
            top_n: 5,
            top_case_types: 7,
        }
    }
}

/// String-keyed accumulator that remembers first-insertion order.
#[derive(Debug, Clone)]
pub struct OrderedTally<V> {
    entries: Vec<(String, V)>,
    index: HashMap<String, usize>,
}

impl<V> Default for OrderedTally<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<V: Default> OrderedTally<V> {
    /// Value for `key`, inserted at the end if new.
    pub fn entry(&mut self, key: &str) -> &mut V {
        let idx = match self.index.get(key) {
            Some(&idx) => idx,
            None => {
                self.entries.push((key.to_string(), V::default()));
                self.index.insert(key.to_string(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx].1
    }
}

impl<V> OrderedTally<V> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<(String, V)> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordered_tally_keeps_first_occurrence() {
        let mut tally: OrderedTally<usize> = OrderedTally::default();
        for key in ["Penipuan", "Curanmor", "Penipuan", "Narkoba"] {
            *tally.entry(key) += 1;
        }

        assert_eq!(tally.len(), 3);
        assert_eq!(
            tally.into_vec(),
            vec![
                ("Penipuan".to_string(), 2),
                ("Curanmor".to_string(), 1),
                ("Narkoba".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_stats_accessors() {
        let empty: Stats<u32> = Stats::Empty;
        assert!(empty.is_empty());
        assert_eq!(Stats::Data(3).data(), Some(&3));
    }
}
