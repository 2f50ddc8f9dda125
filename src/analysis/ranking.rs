//! Top-N rankings.
//!
//! Every ranking is sorted by descending count; equal counts keep the order
//! in which their key first appeared.

use super::OrderedTally;
use crate::models::{Personnel, Report, StatusDetail, StolenVehicle, Unit};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::HashMap;

/// Label used when a vehicle has no type recorded.
pub const UNKNOWN_VEHICLE_TYPE: &str = "Tidak Diketahui";

/// One bar of a ranking chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ranked {
    pub name: String,
    pub count: usize,
}

/// Count keys in first-occurrence order.
fn tally<K: AsRef<str>>(keys: impl IntoIterator<Item = K>) -> Vec<(String, usize)> {
    let mut tally: OrderedTally<usize> = OrderedTally::default();
    for key in keys {
        *tally.entry(key.as_ref()) += 1;
    }
    tally.into_vec()
}

/// Stable sort by descending count, then keep the first `n`.
fn top(mut entries: Vec<Ranked>, n: usize) -> Vec<Ranked> {
    entries.sort_by_key(|e| Reverse(e.count));
    entries.truncate(n);
    entries
}

/// Most frequent case categories.
pub fn top_case_types<'a, I>(reports: I, n: usize) -> Vec<Ranked>
where
    I: IntoIterator<Item = &'a Report>,
{
    let entries = tally(reports.into_iter().map(|r| r.case_type.as_str()))
        .into_iter()
        .map(|(name, count)| Ranked { name, count })
        .collect();
    top(entries, n)
}

/// Units with the most assigned reports.
///
/// Unit ids that no longer resolve to a unit are left out.
pub fn top_units<'a, I>(reports: I, units: &[Unit], n: usize) -> Vec<Ranked>
where
    I: IntoIterator<Item = &'a Report>,
{
    let names: HashMap<&str, &str> = units
        .iter()
        .map(|u| (u.id.as_str(), u.name.as_str()))
        .collect();

    let entries = tally(reports.into_iter().filter_map(|r| r.assigned_unit_id()))
        .into_iter()
        .filter_map(|(unit_id, count)| {
            names.get(unit_id.as_str()).map(|name| Ranked {
                name: name.to_string(),
                count,
            })
        })
        .collect();
    top(entries, n)
}

/// Personnel assigned to the most reports that reached final approval (P21).
///
/// Names render as "rank name"; dangling personnel ids are left out.
pub fn top_final_approval_personnel<'a, I>(
    reports: I,
    personnel: &[Personnel],
    n: usize,
) -> Vec<Ranked>
where
    I: IntoIterator<Item = &'a Report>,
{
    let by_id: HashMap<&str, &Personnel> = personnel.iter().map(|p| (p.id.as_str(), p)).collect();

    let ids = reports
        .into_iter()
        .filter(|r| r.status_detail == Some(StatusDetail::P21))
        .flat_map(|r| r.assigned_personnel_ids().iter().map(String::as_str));

    let entries = tally(ids)
        .into_iter()
        .filter_map(|(personnel_id, count)| {
            by_id.get(personnel_id.as_str()).map(|p| Ranked {
                name: p.display_name(),
                count,
            })
        })
        .collect();
    top(entries, n)
}

/// Normalized vehicle type; blank becomes [`UNKNOWN_VEHICLE_TYPE`].
pub fn vehicle_type_label(vehicle_type: &str) -> &str {
    let trimmed = vehicle_type.trim();
    if trimmed.is_empty() {
        UNKNOWN_VEHICLE_TYPE
    } else {
        trimmed
    }
}

/// Most frequently stolen vehicle types.
pub fn top_vehicle_types<'a, I>(vehicles: I, n: usize) -> Vec<Ranked>
where
    I: IntoIterator<Item = &'a StolenVehicle>,
{
    let entries = tally(
        vehicles
            .into_iter()
            .map(|v| vehicle_type_label(&v.vehicle_type)),
    )
    .into_iter()
    .map(|(name, count)| Ranked { name, count })
    .collect();
    top(entries, n)
}

/// Largest count in a ranking, never below 1.
pub fn max_count(entries: &[Ranked]) -> usize {
    entries.iter().map(|e| e.count).max().unwrap_or(0).max(1)
}

/// Bar length as a percentage of `max`; a zero `max` is treated as 1.
pub fn bar_width(count: usize, max: usize) -> f64 {
    count as f64 / max.max(1) as f64 * 100.0
}
