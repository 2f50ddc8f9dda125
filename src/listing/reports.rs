//! The report list.

use super::{contains_term, normalize_term, unit_name, SortDirection};
use crate::analysis::Scope;
use crate::models::{Personnel, Report, ReportStatus, Unit};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportSortKey {
    /// Report number, numerically.
    Number,
    Spkt,
    CaseType,
    Reporter,
    Date,
    Status,
    Detail,
    /// Assigned unit name.
    Unit,
}

#[derive(Debug, Clone, Default)]
pub struct ReportQuery {
    /// `None` shows every status except soft-deleted.
    pub status: Option<ReportStatus>,
    pub search: Option<String>,
    /// `None` sorts newest report first.
    pub sort: Option<(ReportSortKey, SortDirection)>,
}

/// Reports visible to the viewer, filtered and sorted.
pub fn list_reports<'a>(
    reports: &'a [Report],
    personnel: &[Personnel],
    units: &[Unit],
    scope: &Scope,
    query: &ReportQuery,
) -> Vec<&'a Report> {
    let term = normalize_term(query.search.as_deref());

    let mut rows: Vec<&Report> = scope
        .visible_in_report_list(reports, personnel)
        .into_iter()
        .filter(|r| match query.status {
            Some(status) => r.status == status,
            None => r.status != ReportStatus::Deleted,
        })
        .filter(|r| term.as_deref().map_or(true, |t| matches(r, t)))
        .collect();

    match query.sort {
        Some((key, direction)) => {
            rows.sort_by(|a, b| direction.apply(compare(a, b, key, units)));
        }
        None => rows.sort_by(|a, b| b.report_date.cmp(&a.report_date)),
    }

    rows
}

fn matches(report: &Report, term: &str) -> bool {
    contains_term(&report.reporter_name, term)
        || contains_term(&report.case_type, term)
        || report.report_number.contains(term)
        || contains_term(&report.short_number(), term)
}

fn compare(a: &Report, b: &Report, key: ReportSortKey, units: &[Unit]) -> Ordering {
    match key {
        ReportSortKey::Number => number_value(a).cmp(&number_value(b)),
        ReportSortKey::Spkt => a.spkt.to_string().cmp(&b.spkt.to_string()),
        ReportSortKey::CaseType => a.case_type.cmp(&b.case_type),
        ReportSortKey::Reporter => a.reporter_name.cmp(&b.reporter_name),
        ReportSortKey::Date => a.report_date.cmp(&b.report_date),
        ReportSortKey::Status => a.status.to_string().cmp(&b.status.to_string()),
        ReportSortKey::Detail => detail_label(a).cmp(&detail_label(b)),
        ReportSortKey::Unit => unit_name(units, a.assigned_unit_id())
            .cmp(unit_name(units, b.assigned_unit_id())),
    }
}

/// Leading integer of the report number; non-numeric numbers sort first.
fn number_value(report: &Report) -> Option<i64> {
    let digits: String = report
        .report_number
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

fn detail_label(report: &Report) -> String {
    report
        .status_detail
        .map(|d| d.to_string())
        .unwrap_or_default()
}
