//! Per-category tallies.

use super::calendar::format_date;
use super::{OrderedTally, Stats};
use crate::models::{Report, ReportStatus, StatusDetail};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::ops::AddAssign;

/// Count of reports at each investigation sub-stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StageCounts {
    pub lidik: usize,
    pub sidik: usize,
    pub p21: usize,
    pub diversi: usize,
    pub rj: usize,
    pub sp3: usize,
}

impl StageCounts {
    pub fn record(&mut self, detail: StatusDetail) {
        if let Some(slot) = self.slot_mut(detail) {
            *slot += 1;
        }
    }

    /// Count for a sub-stage; the deletion sentinel is never counted.
    pub fn get(&self, detail: StatusDetail) -> usize {
        match detail {
            StatusDetail::Lidik => self.lidik,
            StatusDetail::Sidik => self.sidik,
            StatusDetail::P21 => self.p21,
            StatusDetail::Diversi => self.diversi,
            StatusDetail::RestorativeJustice => self.rj,
            StatusDetail::Sp3 => self.sp3,
            StatusDetail::Deleted => 0,
        }
    }

    fn slot_mut(&mut self, detail: StatusDetail) -> Option<&mut usize> {
        match detail {
            StatusDetail::Lidik => Some(&mut self.lidik),
            StatusDetail::Sidik => Some(&mut self.sidik),
            StatusDetail::P21 => Some(&mut self.p21),
            StatusDetail::Diversi => Some(&mut self.diversi),
            StatusDetail::RestorativeJustice => Some(&mut self.rj),
            StatusDetail::Sp3 => Some(&mut self.sp3),
            StatusDetail::Deleted => None,
        }
    }
}

impl AddAssign for StageCounts {
    fn add_assign(&mut self, other: Self) {
        for detail in StatusDetail::STAGES {
            if let Some(slot) = self.slot_mut(detail) {
                *slot += other.get(detail);
            }
        }
    }
}

/// Totals for one case category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryTally {
    pub total: usize,
    pub completed: usize,
    pub stages: StageCounts,
}

impl CategoryTally {
    pub fn record(&mut self, report: &Report) {
        self.total += 1;
        if report.status == ReportStatus::Completed {
            self.completed += 1;
        }
        if let Some(detail) = report.status_detail {
            self.stages.record(detail);
        }
    }

    /// Total, completed, then the six sub-stages in column order.
    pub fn columns(&self) -> [usize; 8] {
        let mut columns = [0; 8];
        columns[0] = self.total;
        columns[1] = self.completed;
        for (i, detail) in StatusDetail::STAGES.iter().enumerate() {
            columns[i + 2] = self.stages.get(*detail);
        }
        columns
    }
}

impl AddAssign for CategoryTally {
    fn add_assign(&mut self, other: Self) {
        self.total += other.total;
        self.completed += other.completed;
        self.stages += other.stages;
    }
}

/// Column headers matching [`CategoryTally::columns`], after "Kasus".
pub fn column_headers() -> Vec<&'static str> {
    let mut headers = vec!["Total", "Selesai"];
    headers.extend(StatusDetail::STAGES.iter().map(|d| d.column_label()));
    headers
}

/// Case categories in first-occurrence order, plus a totals row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseSummary {
    pub rows: Vec<(String, CategoryTally)>,
    pub totals: CategoryTally,
}

/// Tally reports per case category.
pub fn summarize<'a, I>(reports: I) -> Stats<CaseSummary>
where
    I: IntoIterator<Item = &'a Report>,
{
    let mut tally: OrderedTally<CategoryTally> = OrderedTally::default();
    for report in reports {
        tally.entry(&report.case_type).record(report);
    }

    if tally.is_empty() {
        return Stats::Empty;
    }

    let rows = tally.into_vec();
    let mut totals = CategoryTally::default();
    for (_, row) in &rows {
        totals += *row;
    }

    Stats::Data(CaseSummary { rows, totals })
}

/// Inclusive filing-date window.
///
/// Dates are taken at UTC midnight; the end bound is pushed one full day
/// forward so reports filed on the end date are always included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    fn bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = self.start.and_time(chrono::NaiveTime::MIN).and_utc();
        let end = self.end.and_time(chrono::NaiveTime::MIN).and_utc() + Duration::hours(24);
        (start, end)
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        let (start, end) = self.bounds();
        t >= start && t <= end
    }

    /// Reports filed within the window.
    pub fn filter<'a, I>(&self, reports: I) -> Vec<&'a Report>
    where
        I: IntoIterator<Item = &'a Report>,
    {
        reports
            .into_iter()
            .filter(|r| self.contains(r.report_date))
            .collect()
    }

    /// "Periode: 2/3/2024 - 9/3/2024"
    pub fn period_label(range: Option<&DateRange>) -> String {
        match range {
            Some(r) => format!("Periode: {} - {}", format_date(r.start), format_date(r.end)),
            None => "Periode: Semua Data".to_string(),
        }
    }
}
