//! Viewer scoping.

use crate::models::{Personnel, Profile, Report, Role};
use std::collections::HashSet;

/// Which reports a viewer's statistics are computed over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Administrator: every report.
    All,
    /// Operator: reports assigned to their home unit.
    Unit(String),
    /// Operator without a home unit: nothing.
    NoUnit,
}

impl Scope {
    pub fn for_profile(profile: &Profile) -> Self {
        match (profile.role, &profile.unit_id) {
            (Role::Admin, _) => Scope::All,
            (Role::Operator, Some(unit_id)) if !unit_id.is_empty() => Scope::Unit(unit_id.clone()),
            (Role::Operator, _) => Scope::NoUnit,
        }
    }

    pub fn unit_id(&self) -> Option<&str> {
        match self {
            Scope::Unit(unit_id) => Some(unit_id),
            _ => None,
        }
    }

    /// Whether `report` counts towards this viewer's statistics.
    pub fn includes(&self, report: &Report) -> bool {
        match self {
            Scope::All => true,
            Scope::Unit(unit_id) => report.assigned_unit_id() == Some(unit_id.as_str()),
            Scope::NoUnit => false,
        }
    }

    pub fn apply<'a, I>(&self, reports: I) -> Vec<&'a Report>
    where
        I: IntoIterator<Item = &'a Report>,
    {
        reports.into_iter().filter(|r| self.includes(r)).collect()
    }

    /// Report-list visibility.
    ///
    /// Wider than [`Scope::includes`]: an operator also sees reports where
    /// any assigned personnel belongs to their unit.
    pub fn visible_in_report_list<'a, I>(&self, reports: I, personnel: &[Personnel]) -> Vec<&'a Report>
    where
        I: IntoIterator<Item = &'a Report>,
    {
        let unit_id = match self {
            Scope::All => return reports.into_iter().collect(),
            Scope::NoUnit => return Vec::new(),
            Scope::Unit(unit_id) => unit_id,
        };

        let own_personnel: HashSet<&str> = personnel
            .iter()
            .filter(|p| &p.unit_id == unit_id)
            .map(|p| p.id.as_str())
            .collect();

        reports
            .into_iter()
            .filter(|r| {
                self.includes(r)
                    || r
                        .assigned_personnel_ids()
                        .iter()
                        .any(|id| own_personnel.contains(id.as_str()))
            })
            .collect()
    }
}
