//! Stolen vehicles across all reports.

use super::{contains_term, normalize_term, unit_name, SortDirection};
use crate::models::{Report, StolenVehicle, Unit};
use serde::Serialize;
use std::cmp::Ordering;

/// A vehicle paired with the report it was stolen in.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct VehicleRow<'a> {
    pub vehicle: &'a StolenVehicle,
    #[serde(skip)]
    pub report: &'a Report,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum VehicleSortKey {
    /// Full report number, as text.
    Number,
    Date,
    Type,
    Frame,
    Engine,
    Unit,
}

#[derive(Debug, Clone, Default)]
pub struct VehicleQuery {
    pub search: Option<String>,
    pub sort: Option<(VehicleSortKey, SortDirection)>,
}

/// Every stolen vehicle, newest report first.
pub fn flatten(reports: &[Report]) -> Vec<VehicleRow<'_>> {
    let mut rows: Vec<VehicleRow<'_>> = reports
        .iter()
        .flat_map(|report| {
            report
                .stolen_vehicles
                .iter()
                .map(move |vehicle| VehicleRow { vehicle, report })
        })
        .collect();
    rows.sort_by(|a, b| b.report.report_date.cmp(&a.report.report_date));
    rows
}

pub fn list_vehicles<'a>(
    reports: &'a [Report],
    units: &[Unit],
    query: &VehicleQuery,
) -> Vec<VehicleRow<'a>> {
    let term = normalize_term(query.search.as_deref());

    let mut rows: Vec<VehicleRow<'a>> = flatten(reports)
        .into_iter()
        .filter(|row| term.as_deref().map_or(true, |t| matches(row, t)))
        .collect();

    if let Some((key, direction)) = query.sort {
        rows.sort_by(|a, b| direction.apply(compare(a, b, key, units)));
    }

    rows
}

fn matches(row: &VehicleRow<'_>, term: &str) -> bool {
    contains_term(&row.vehicle.vehicle_type, term)
        || contains_term(&row.vehicle.frame_number, term)
        || contains_term(&row.vehicle.engine_number, term)
        || row.report.report_number.contains(term)
        || contains_term(&row.report.reporter_name, term)
}

fn compare(a: &VehicleRow<'_>, b: &VehicleRow<'_>, key: VehicleSortKey, units: &[Unit]) -> Ordering {
    match key {
        VehicleSortKey::Number => a.report.full_number().cmp(&b.report.full_number()),
        VehicleSortKey::Date => a.report.report_date.cmp(&b.report.report_date),
        VehicleSortKey::Type => a.vehicle.vehicle_type.cmp(&b.vehicle.vehicle_type),
        VehicleSortKey::Frame => a.vehicle.frame_number.cmp(&b.vehicle.frame_number),
        VehicleSortKey::Engine => a.vehicle.engine_number.cmp(&b.vehicle.engine_number),
        VehicleSortKey::Unit => unit_name(units, a.report.assigned_unit_id())
            .cmp(unit_name(units, b.report.assigned_unit_id())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures;
    use chrono::{TimeZone, Utc};

    fn vehicle(id: &str, report_id: &str, vehicle_type: &str, frame: &str) -> StolenVehicle {
        StolenVehicle {
            id: id.to_string(),
            report_id: report_id.to_string(),
            vehicle_type: vehicle_type.to_string(),
            frame_number: frame.to_string(),
            engine_number: format!("E-{frame}"),
        }
    }

    fn sample() -> Vec<Report> {
        let mut old = fixtures::report("r1", "Curanmor");
        old.report_date = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        old.stolen_vehicles = vec![vehicle("v1", "r1", "Honda Beat", "MH1AAA")];

        let mut new = fixtures::report("r2", "Curanmor");
        new.report_date = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        new.reporter_name = "Yakob".to_string();
        new.stolen_vehicles = vec![
            vehicle("v2", "r2", "Yamaha NMAX", "MH3BBB"),
            vehicle("v3", "r2", "Honda Vario", "MH1CCC"),
        ];

        vec![old, new, fixtures::report("r3", "Penipuan")]
    }

    #[test]
    fn test_flatten_newest_report_first() {
        let reports = sample();
        let rows = flatten(&reports);
        let ids: Vec<&str> = rows.iter().map(|r| r.vehicle.id.as_str()).collect();
        assert_eq!(ids, vec!["v2", "v3", "v1"]);
        assert_eq!(rows[0].report.id, "r2");
    }

    #[test]
    fn test_search_vehicles() {
        let reports = sample();
        let by_frame = VehicleQuery {
            search: Some("mh1".to_string()),
            ..Default::default()
        };
        assert_eq!(list_vehicles(&reports, &[], &by_frame).len(), 2);

        let by_reporter = VehicleQuery {
            search: Some("yakob".to_string()),
            ..Default::default()
        };
        assert_eq!(list_vehicles(&reports, &[], &by_reporter).len(), 2);
    }

    #[test]
    fn test_sort_by_type() {
        let reports = sample();
        let query = VehicleQuery {
            sort: Some((VehicleSortKey::Type, SortDirection::Ascending)),
            ..Default::default()
        };
        let rows = list_vehicles(&reports, &[], &query);
        let types: Vec<&str> = rows.iter().map(|r| r.vehicle.vehicle_type.as_str()).collect();
        assert_eq!(types, vec!["Honda Beat", "Honda Vario", "Yamaha NMAX"]);
    }
}
