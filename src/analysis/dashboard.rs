//! View models for the dashboard and the crime-data screen.

use super::calendar::local_date;
use super::ranking::{top_case_types, top_final_approval_personnel, top_units, Ranked};
use super::summary::{summarize, CaseSummary, DateRange};
use super::trend::{quarter_trend, yearly_trend, QuarterTrend, YearlyTrend};
use super::{AnalyticsOptions, Scope, Stats};
use crate::models::{Personnel, Profile, Report, ReportStatus, ReportType, Role, Unit};
use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

/// Headline counters shown above the charts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HeadlineStats {
    pub total: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub stolen_vehicles: usize,
}

impl HeadlineStats {
    pub fn from_reports(reports: &[&Report]) -> Self {
        Self {
            total: reports.len(),
            in_progress: reports
                .iter()
                .filter(|r| r.status == ReportStatus::InProgress)
                .count(),
            completed: reports.iter().filter(|r| r.is_completed()).count(),
            stolen_vehicles: reports.iter().map(|r| r.stolen_vehicles.len()).sum(),
        }
    }
}

/// Charts for one report type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabView {
    pub stats: HeadlineStats,
    pub yearly: YearlyTrend,
    pub top_case_types: Vec<Ranked>,
    /// Administrators only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_units: Option<Vec<Ranked>>,
    /// Administrators only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_personnel: Option<Vec<Ranked>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub title: String,
    pub police_reports: Stats<TabView>,
    pub public_complaints: Stats<TabView>,
}

impl Dashboard {
    pub fn tab(&self, report_type: ReportType) -> &Stats<TabView> {
        match report_type {
            ReportType::PoliceReport => &self.police_reports,
            ReportType::PublicComplaint => &self.public_complaints,
        }
    }
}

/// Everything the dashboard needs, scoped to the viewer.
pub struct DashboardInput<'a> {
    pub reports: &'a [Report],
    pub units: &'a [Unit],
    pub personnel: &'a [Personnel],
    pub profile: &'a Profile,
}

pub fn build_dashboard(
    input: &DashboardInput<'_>,
    now: DateTime<Utc>,
    options: &AnalyticsOptions,
) -> Dashboard {
    let scope = Scope::for_profile(input.profile);
    let scoped = scope.apply(input.reports);
    let year = local_date(now, options.utc_offset).year();

    let title = match (input.profile.role, scope.unit_id()) {
        (Role::Operator, Some(unit_id)) => input
            .units
            .iter()
            .find(|u| u.id == unit_id)
            .map(|u| format!("Dashboard - {}", u.name))
            .unwrap_or_else(|| "Dashboard Analitik".to_string()),
        _ => "Dashboard Analitik".to_string(),
    };

    let tab = |report_type: ReportType| {
        let reports: Vec<&Report> = scoped
            .iter()
            .copied()
            .filter(|r| r.report_type == report_type)
            .collect();
        build_tab(&reports, input, year, options)
    };

    Dashboard {
        title,
        police_reports: tab(ReportType::PoliceReport),
        public_complaints: tab(ReportType::PublicComplaint),
    }
}

fn build_tab(
    reports: &[&Report],
    input: &DashboardInput<'_>,
    year: i32,
    options: &AnalyticsOptions,
) -> Stats<TabView> {
    if reports.is_empty() {
        return Stats::Empty;
    }

    let is_admin = input.profile.role == Role::Admin;
    let reports_iter = || reports.iter().copied();

    Stats::Data(TabView {
        stats: HeadlineStats::from_reports(reports),
        yearly: yearly_trend(reports_iter(), year, options.utc_offset),
        top_case_types: top_case_types(reports_iter(), options.top_case_types),
        top_units: is_admin.then(|| top_units(reports_iter(), input.units, options.top_n)),
        top_personnel: is_admin.then(|| {
            top_final_approval_personnel(reports_iter(), input.personnel, options.top_n)
        }),
    })
}

/// Category summary over an optional date window, plus the three-month trend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrimeData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<DateRange>,
    pub summary: Stats<CaseSummary>,
    /// Always over the whole scope; the date window does not apply.
    pub trend: QuarterTrend,
}

impl CrimeData {
    pub fn period_label(&self) -> String {
        DateRange::period_label(self.range.as_ref())
    }
}

pub fn build_crime_data(
    reports: &[Report],
    profile: &Profile,
    range: Option<DateRange>,
    now: DateTime<Utc>,
    options: &AnalyticsOptions,
) -> CrimeData {
    let scoped = Scope::for_profile(profile).apply(reports);
    let summary = match &range {
        Some(range) => summarize(range.filter(scoped.iter().copied())),
        None => summarize(scoped.iter().copied()),
    };

    CrimeData {
        range,
        summary,
        trend: quarter_trend(scoped.iter().copied(), now, options.utc_offset),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{fixtures, Assignment, StatusDetail, StolenVehicle};
    use chrono::{NaiveDate, TimeZone};

    fn profile(role: Role, unit_id: Option<&str>) -> Profile {
        Profile {
            role,
            unit_id: unit_id.map(String::from),
            unit_name: None,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn sample() -> (Vec<Report>, Vec<Unit>, Vec<Personnel>) {
        let mut r1 = fixtures::with_status(
            fixtures::report("r1", "Curanmor"),
            ReportStatus::Completed,
            StatusDetail::P21,
        );
        r1.assignment = Assignment::from_parts(Some("u1".into()), vec!["p1".into()]);
        r1.stolen_vehicles.push(StolenVehicle {
            id: "v1".into(),
            report_id: "r1".into(),
            vehicle_type: "Honda Beat".into(),
            frame_number: "MH1".into(),
            engine_number: "JM1".into(),
        });

        let mut r2 = fixtures::report("r2", "Penipuan");
        r2.assignment = Assignment::from_parts(Some("u2".into()), vec![]);

        let mut r3 = fixtures::report("r3", "Penganiayaan");
        r3.report_type = ReportType::PublicComplaint;
        r3.police_model = None;
        r3.assignment = Assignment::from_parts(Some("u1".into()), vec![]);

        let units = vec![
            fixtures::unit("u1", "Unit Resmob"),
            fixtures::unit("u2", "Unit Tipiter"),
        ];
        let personnel = vec![fixtures::personnel("p1", "Budi", "u1")];
        (vec![r1, r2, r3], units, personnel)
    }

    #[test]
    fn test_admin_dashboard() {
        let (reports, units, personnel) = sample();
        let admin = profile(Role::Admin, None);
        let input = DashboardInput {
            reports: &reports,
            units: &units,
            personnel: &personnel,
            profile: &admin,
        };

        let dashboard = build_dashboard(&input, now(), &AnalyticsOptions::default());
        assert_eq!(dashboard.title, "Dashboard Analitik");

        let tab = dashboard.police_reports.data().unwrap();
        assert_eq!(
            tab.stats,
            HeadlineStats {
                total: 2,
                in_progress: 1,
                completed: 1,
                stolen_vehicles: 1
            }
        );
        assert_eq!(tab.yearly.year, 2024);
        assert_eq!(tab.yearly.months[4].count.total, 2);
        assert_eq!(tab.top_units.as_ref().unwrap().len(), 2);
        assert_eq!(tab.top_personnel.as_ref().unwrap()[0].name, "BRIPKA Budi");

        let complaints = dashboard.tab(ReportType::PublicComplaint).data().unwrap();
        assert_eq!(complaints.stats.total, 1);
    }

    #[test]
    fn test_operator_dashboard_is_scoped() {
        let (reports, units, personnel) = sample();
        let operator = profile(Role::Operator, Some("u2"));
        let input = DashboardInput {
            reports: &reports,
            units: &units,
            personnel: &personnel,
            profile: &operator,
        };

        let dashboard = build_dashboard(&input, now(), &AnalyticsOptions::default());
        assert_eq!(dashboard.title, "Dashboard - Unit Tipiter");

        let tab = dashboard.police_reports.data().unwrap();
        assert_eq!(tab.stats.total, 1);
        assert!(tab.top_units.is_none());
        assert!(tab.top_personnel.is_none());
        assert!(dashboard.public_complaints.is_empty());
    }

    #[test]
    fn test_empty_dashboard() {
        let admin = profile(Role::Admin, None);
        let input = DashboardInput {
            reports: &[],
            units: &[],
            personnel: &[],
            profile: &admin,
        };

        let dashboard = build_dashboard(&input, now(), &AnalyticsOptions::default());
        assert!(dashboard.police_reports.is_empty());
        assert!(dashboard.public_complaints.is_empty());
    }

    #[test]
    fn test_crime_data_range_does_not_narrow_trend() {
        let (reports, _, _) = sample();
        let admin = profile(Role::Admin, None);
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        let data = build_crime_data(
            &reports,
            &admin,
            Some(DateRange::new(day, day)),
            now(),
            &AnalyticsOptions::default(),
        );

        assert!(data.summary.is_empty());
        assert_eq!(data.period_label(), "Periode: 1/1/2024 - 1/1/2024");
        assert_eq!(data.trend.rows.len(), 3);
    }

    #[test]
    fn test_crime_data_whole_scope() {
        let (reports, _, _) = sample();
        let operator = profile(Role::Operator, Some("u1"));

        let data = build_crime_data(&reports, &operator, None, now(), &AnalyticsOptions::default());
        let summary = data.summary.data().unwrap();
        assert_eq!(summary.totals.total, 2);
        assert_eq!(data.period_label(), "Periode: Semua Data");
    }
}
