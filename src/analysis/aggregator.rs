//! Report aggregation.
//!
//! Rebuilds the in-memory case register from the normalized remote tables:
//! one primary batch (units, personnel, reports with their vehicle and
//! history rows), then one assignment lookup per report.

use crate::models::{Personnel, Report, ReportStatus, Unit};
use crate::store::rows::ReportRow;
use crate::store::{CaseStore, StoreError, StoreResult};
use futures::future::join_all;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Outcome of one report's personnel-assignment lookup.
#[derive(Debug)]
pub struct AssignmentLookup {
    pub report_id: String,
    pub outcome: StoreResult<Vec<String>>,
}

impl AssignmentLookup {
    /// Assigned personnel ids; a failed lookup counts as no assignment.
    pub fn personnel_ids(&self) -> Vec<String> {
        match &self.outcome {
            Ok(ids) => ids.clone(),
            Err(_) => Vec::new(),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.outcome.is_err()
    }
}

/// The rebuilt case register.
#[derive(Debug, Default)]
pub struct Aggregation {
    pub units: Vec<Unit>,
    pub personnel: Vec<Personnel>,
    /// Active reports, newest report date first.
    pub reports: Vec<Report>,
    /// Ids of reports whose assignment lookup failed.
    pub failed_lookups: Vec<String>,
}

/// Fetch every table and assemble the case register.
///
/// Fails as a whole if any of the three primary reads fails. Assignment
/// lookups fail per report and never abort the batch.
pub async fn aggregate<S: CaseStore + ?Sized>(store: &S) -> Result<Aggregation, StoreError> {
    let (unit_rows, personnel_rows, report_rows) = tokio::try_join!(
        store.fetch_units(),
        store.fetch_personnel(),
        store.fetch_reports(),
    )?;

    debug!(
        "Fetched {} units, {} personnel, {} reports",
        unit_rows.len(),
        personnel_rows.len(),
        report_rows.len()
    );

    let lookups = lookup_assignments(store, &report_rows).await;
    let failed_lookups: Vec<String> = lookups
        .iter()
        .filter(|l| l.is_failed())
        .map(|l| l.report_id.clone())
        .collect();

    let reports = merge_reports(report_rows, &lookups);

    info!(
        "Loaded {} active reports ({} assignment lookups failed)",
        reports.len(),
        failed_lookups.len()
    );

    Ok(Aggregation {
        units: unit_rows.into_iter().map(Unit::from).collect(),
        personnel: personnel_rows.into_iter().map(Personnel::from).collect(),
        reports,
        failed_lookups,
    })
}

/// Issue one junction lookup per report, all at once.
///
/// Results come back in the same order as `rows`.
pub async fn lookup_assignments<S: CaseStore + ?Sized>(
    store: &S,
    rows: &[ReportRow],
) -> Vec<AssignmentLookup> {
    let lookups = rows.iter().map(|row| async move {
        let outcome = store
            .fetch_assignments(&row.id)
            .await
            .map(|links| links.into_iter().map(|a| a.personnel_id).collect());

        if let Err(e) = &outcome {
            warn!("Error fetching assignments for report {}: {}", row.id, e);
        }

        AssignmentLookup {
            report_id: row.id.clone(),
            outcome,
        }
    });

    join_all(lookups).await
}

/// Join report rows with their lookups, drop soft-deleted reports and
/// keep the first row per id.
pub fn merge_reports(rows: Vec<ReportRow>, lookups: &[AssignmentLookup]) -> Vec<Report> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut reports = Vec::with_capacity(rows.len());

    for (row, lookup) in rows.into_iter().zip(lookups) {
        if row.status == ReportStatus::Deleted {
            continue;
        }
        if !seen.insert(row.id.clone()) {
            warn!("Duplicate report id {} ignored", row.id);
            continue;
        }
        reports.push(row.into_report(lookup.personnel_ids()));
    }

    reports
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{fixtures, StatusDetail};
    use crate::store::fake::{personnel_row, report_row, unit_row, FakeState, FakeStore};
    use crate::store::rows::StatusHistoryRow;
    use chrono::{TimeZone, Utc};

    fn history(detail: StatusDetail, day: u32) -> StatusHistoryRow {
        StatusHistoryRow {
            status: ReportStatus::InProgress,
            status_detail: detail,
            description: String::new(),
            updated_at: Utc.with_ymd_and_hms(2024, 5, day, 9, 0, 0).unwrap(),
            updated_by: "Admin".to_string(),
        }
    }

    fn create_test_store() -> FakeStore {
        let mut assigned = fixtures::report("r1", "Curanmor");
        assigned.assignment = crate::models::Assignment::Unit {
            unit_id: "u1".to_string(),
        };
        let mut r1 = report_row(&assigned);
        r1.status_history = Some(vec![
            history(StatusDetail::Sidik, 20),
            history(StatusDetail::Lidik, 11),
        ]);

        let r2 = report_row(&fixtures::report("r2", "Penipuan"));
        let deleted = report_row(&fixtures::with_status(
            fixtures::report("r3", "Curanmor"),
            ReportStatus::Deleted,
            StatusDetail::Deleted,
        ));

        let mut state = FakeState {
            units: vec![unit_row("u1", "Unit Resmob")],
            personnel: vec![personnel_row("p1", "Budi", "u1")],
            reports: vec![r1, r2, deleted],
            ..Default::default()
        };
        state
            .assignments
            .insert("r1".to_string(), vec!["p1".to_string()]);
        FakeStore::new(state)
    }

    #[tokio::test]
    async fn test_aggregate_joins_rows() {
        let store = create_test_store();
        let agg = aggregate(&store).await.unwrap();

        assert_eq!(agg.units.len(), 1);
        assert_eq!(agg.personnel.len(), 1);
        assert_eq!(agg.reports.len(), 2);

        let r1 = agg.reports.iter().find(|r| r.id == "r1").unwrap();
        assert_eq!(r1.assigned_unit_id(), Some("u1"));
        assert_eq!(r1.assigned_personnel_ids(), &["p1".to_string()]);
        assert!(agg.failed_lookups.is_empty());
    }

    #[tokio::test]
    async fn test_history_is_ascending() {
        let store = create_test_store();
        let agg = aggregate(&store).await.unwrap();

        for report in &agg.reports {
            assert!(report
                .status_history
                .windows(2)
                .all(|w| w[0].updated_at <= w[1].updated_at));
        }
        let r1 = agg.reports.iter().find(|r| r.id == "r1").unwrap();
        assert_eq!(r1.status_history[0].status_detail, StatusDetail::Lidik);
    }

    #[tokio::test]
    async fn test_soft_deleted_excluded() {
        let store = create_test_store();
        let agg = aggregate(&store).await.unwrap();

        assert!(agg
            .reports
            .iter()
            .all(|r| r.status != ReportStatus::Deleted));
        assert!(agg.reports.iter().all(|r| r.id != "r3"));
    }

    #[tokio::test]
    async fn test_lookup_failure_is_isolated() {
        let store = create_test_store();
        store.with_state(|s| {
            s.fail_assignments_for.insert("r1".to_string());
        });

        let agg = aggregate(&store).await.unwrap();

        assert_eq!(agg.reports.len(), 2);
        assert_eq!(agg.failed_lookups, vec!["r1".to_string()]);
        let r1 = agg.reports.iter().find(|r| r.id == "r1").unwrap();
        assert!(r1.assigned_personnel_ids().is_empty());
        assert_eq!(r1.assigned_unit_id(), Some("u1"));
    }

    #[tokio::test]
    async fn test_primary_failure_aborts() {
        let store = create_test_store();
        store.with_state(|s| s.fail_personnel = true);

        let err = aggregate(&store).await.unwrap_err();
        assert!(err.to_string().contains("personnel unavailable"));
    }

    #[tokio::test]
    async fn test_empty_store() {
        let store = FakeStore::default();
        let agg = aggregate(&store).await.unwrap();
        assert!(agg.reports.is_empty());
        assert!(agg.units.is_empty());
    }

    #[test]
    fn test_merge_keeps_first_duplicate() {
        let mut first = fixtures::report("r1", "Curanmor");
        first.reporter_name = "Pertama".to_string();
        let mut second = fixtures::report("r1", "Penipuan");
        second.reporter_name = "Kedua".to_string();

        let rows = vec![report_row(&first), report_row(&second)];
        let lookups = vec![
            AssignmentLookup {
                report_id: "r1".to_string(),
                outcome: Ok(Vec::new()),
            },
            AssignmentLookup {
                report_id: "r1".to_string(),
                outcome: Err(StoreError::NotFound("r1".to_string())),
            },
        ];

        let reports = merge_reports(rows, &lookups);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].reporter_name, "Pertama");
    }
}
