//! The personnel roster.

use super::{contains_term, normalize_term, SortDirection};
use crate::models::{Personnel, Unit};
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PersonnelSortKey {
    Name,
    Rank,
    /// Home unit name.
    Unit,
}

#[derive(Debug, Clone, Default)]
pub struct PersonnelQuery {
    pub unit_id: Option<String>,
    pub search: Option<String>,
    /// `None` sorts by name.
    pub sort: Option<(PersonnelSortKey, SortDirection)>,
}

pub fn list_personnel<'a>(
    personnel: &'a [Personnel],
    units: &[Unit],
    query: &PersonnelQuery,
) -> Vec<&'a Personnel> {
    let unit_names: HashMap<&str, &str> = units
        .iter()
        .map(|u| (u.id.as_str(), u.name.as_str()))
        .collect();
    let unit_of = |p: &Personnel| unit_names.get(p.unit_id.as_str()).copied().unwrap_or("");
    let term = normalize_term(query.search.as_deref());

    let mut rows: Vec<&Personnel> = personnel
        .iter()
        .filter(|p| query.unit_id.as_deref().map_or(true, |u| p.unit_id == u))
        .filter(|p| {
            term.as_deref().map_or(true, |t| {
                contains_term(&p.name, t) || contains_term(&p.rank, t) || contains_term(unit_of(*p), t)
            })
        })
        .collect();

    let (key, direction) = query
        .sort
        .unwrap_or((PersonnelSortKey::Name, SortDirection::Ascending));
    rows.sort_by(|a, b| {
        let ordering: Ordering = match key {
            PersonnelSortKey::Name => a.name.cmp(&b.name),
            PersonnelSortKey::Rank => a.rank.cmp(&b.rank),
            PersonnelSortKey::Unit => unit_of(*a).cmp(unit_of(*b)),
        };
        direction.apply(ordering)
    });

    rows
}
