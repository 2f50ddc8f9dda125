//! Month-over-month trends.

use super::calendar::{local_date, YearMonth};
use super::OrderedTally;
use crate::models::Report;
use chrono::{DateTime, Datelike, FixedOffset, Utc};
use serde::Serialize;
use std::ops::AddAssign;

/// Number of months in the short trend window.
pub const QUARTER_MONTHS: usize = 3;

/// Reports filed in one month, and how many of them are completed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MonthCount {
    pub total: usize,
    pub completed: usize,
}

impl MonthCount {
    fn record(&mut self, report: &Report) {
        self.total += 1;
        if report.is_completed() {
            self.completed += 1;
        }
    }
}

impl AddAssign for MonthCount {
    fn add_assign(&mut self, other: Self) {
        self.total += other.total;
        self.completed += other.completed;
    }
}

/// One case category across the trend window, oldest month first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendRow {
    pub case_type: String,
    pub months: [MonthCount; QUARTER_MONTHS],
}

/// Per-category counts for the current month and the two before it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuarterTrend {
    /// Oldest first.
    pub months: [YearMonth; QUARTER_MONTHS],
    pub rows: Vec<TrendRow>,
}

impl QuarterTrend {
    /// Long Indonesian month names, oldest first.
    pub fn labels(&self) -> [&'static str; QUARTER_MONTHS] {
        self.months.map(|m| m.long_name())
    }

    pub fn totals(&self) -> [MonthCount; QUARTER_MONTHS] {
        let mut totals = [MonthCount::default(); QUARTER_MONTHS];
        for row in &self.rows {
            for (total, month) in totals.iter_mut().zip(row.months) {
                *total += month;
            }
        }
        totals
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Trend over the month containing `now` and the two preceding months.
///
/// Months are decided at `offset`. Reports dated after the current month
/// fall outside the window; categories with no report in the window are
/// dropped.
pub fn quarter_trend<'a, I>(reports: I, now: DateTime<Utc>, offset: FixedOffset) -> QuarterTrend
where
    I: IntoIterator<Item = &'a Report>,
{
    let current = YearMonth::of(local_date(now, offset));
    let months = [current.shift(-2), current.shift(-1), current];

    let mut tally: OrderedTally<[MonthCount; QUARTER_MONTHS]> = OrderedTally::default();
    for report in reports {
        let month = YearMonth::of(local_date(report.report_date, offset));
        if let Some(idx) = months.iter().position(|m| *m == month) {
            tally.entry(&report.case_type)[idx].record(report);
        }
    }

    let rows = tally
        .into_vec()
        .into_iter()
        .filter(|(_, counts)| counts.iter().any(|c| c.total > 0))
        .map(|(case_type, months)| TrendRow { case_type, months })
        .collect();

    QuarterTrend { months, rows }
}

/// One bar of the yearly chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthBucket {
    /// Short Indonesian month name.
    pub label: &'static str,
    #[serde(flatten)]
    pub count: MonthCount,
}

/// Twelve monthly buckets for one calendar year, across all categories.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyTrend {
    pub year: i32,
    pub months: Vec<MonthBucket>,
}

impl YearlyTrend {
    /// Whether any month has a report; an all-zero year is not charted.
    pub fn has_data(&self) -> bool {
        self.months.iter().any(|m| m.count.total > 0)
    }

    /// Largest monthly total, never below 1.
    pub fn max_total(&self) -> usize {
        self.months
            .iter()
            .map(|m| m.count.total)
            .max()
            .unwrap_or(0)
            .max(1)
    }
}

pub fn yearly_trend<'a, I>(reports: I, year: i32, offset: FixedOffset) -> YearlyTrend
where
    I: IntoIterator<Item = &'a Report>,
{
    let mut counts = [MonthCount::default(); 12];
    for report in reports {
        let date = local_date(report.report_date, offset);
        if date.year() == year {
            counts[date.month0() as usize].record(report);
        }
    }

    let months = counts
        .iter()
        .enumerate()
        .map(|(i, count)| MonthBucket {
            label: YearMonth::new(year, i as u32 + 1).short_name(),
            count: *count,
        })
        .collect();

    YearlyTrend { year, months }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::calendar::utc_offset;
    use crate::models::{fixtures, ReportStatus, StatusDetail};
    use chrono::TimeZone;

    fn filed(id: &str, case_type: &str, y: i32, m: u32, d: u32, completed: bool) -> Report {
        let mut report = fixtures::report(id, case_type);
        report.report_date = Utc.with_ymd_and_hms(y, m, d, 3, 0, 0).unwrap();
        if completed {
            report = fixtures::with_status(report, ReportStatus::Completed, StatusDetail::P21);
        }
        report
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_quarter_window_spans_year_boundary() {
        let trend = quarter_trend(Vec::<&Report>::new(), now(), utc_offset(9));
        assert_eq!(trend.labels(), ["Desember", "Januari", "Februari"]);
        assert_eq!(trend.months[0], YearMonth::new(2023, 12));
        assert!(trend.is_empty());
    }

    #[test]
    fn test_quarter_trend_buckets() {
        let reports = vec![
            filed("r1", "Curanmor", 2023, 12, 5, true),
            filed("r2", "Curanmor", 2024, 2, 1, false),
            filed("r3", "Penipuan", 2024, 1, 20, true),
            filed("r4", "Penipuan", 2024, 1, 21, false),
            // outside the window
            filed("r5", "Narkoba", 2023, 11, 30, false),
            filed("r6", "Narkoba", 2024, 3, 1, false),
        ];

        let trend = quarter_trend(&reports, now(), utc_offset(9));

        assert_eq!(trend.rows.len(), 2);
        assert_eq!(trend.rows[0].case_type, "Curanmor");
        assert_eq!(
            trend.rows[0].months,
            [
                MonthCount { total: 1, completed: 1 },
                MonthCount::default(),
                MonthCount { total: 1, completed: 0 },
            ]
        );
        assert_eq!(trend.rows[1].months[1], MonthCount { total: 2, completed: 1 });

        let totals = trend.totals();
        assert_eq!(totals.iter().map(|t| t.total).sum::<usize>(), 4);
        assert_eq!(totals[1], MonthCount { total: 2, completed: 1 });
    }

    #[test]
    fn test_quarter_trend_uses_local_month() {
        // 30 Nov 20:00 UTC is 1 Dec in WIT
        let mut report = fixtures::report("r1", "Curanmor");
        report.report_date = Utc.with_ymd_and_hms(2023, 11, 30, 20, 0, 0).unwrap();

        let local = quarter_trend([&report], now(), utc_offset(9));
        assert_eq!(local.rows.len(), 1);

        let utc = quarter_trend([&report], now(), utc_offset(0));
        assert!(utc.is_empty());
    }

    #[test]
    fn test_quarter_trend_ignores_future_reports() {
        let reports = vec![
            filed("r1", "Curanmor", 2024, 2, 10, false),
            filed("r2", "Curanmor", 2024, 4, 2, false),
        ];

        let trend = quarter_trend(&reports, now(), utc_offset(9));

        assert_eq!(trend.rows.len(), 1);
        assert_eq!(trend.rows[0].months[2], MonthCount { total: 1, completed: 0 });
    }

    #[test]
    fn test_yearly_trend() {
        let reports = vec![
            filed("r1", "Curanmor", 2024, 1, 5, true),
            filed("r2", "Penipuan", 2024, 1, 9, false),
            filed("r3", "Curanmor", 2024, 8, 17, false),
            filed("r4", "Curanmor", 2023, 8, 17, false),
        ];

        let trend = yearly_trend(&reports, 2024, utc_offset(9));

        assert_eq!(trend.months.len(), 12);
        assert_eq!(trend.months[0].label, "Jan");
        assert_eq!(trend.months[0].count, MonthCount { total: 2, completed: 1 });
        assert_eq!(trend.months[7].label, "Agu");
        assert_eq!(trend.months[7].count.total, 1);
        assert_eq!(trend.max_total(), 2);
        assert!(trend.has_data());
    }

    #[test]
    fn test_yearly_trend_empty() {
        let trend = yearly_trend(Vec::<&Report>::new(), 2024, utc_offset(9));
        assert!(!trend.has_data());
        assert_eq!(trend.max_total(), 1);
    }
}
