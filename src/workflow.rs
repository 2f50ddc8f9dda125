//! Mutating workflows over the cached case register.
//!
//! Every operation checks the viewer's role, performs its remote steps in
//! order and only then applies the change to the cache. A failed remote
//! step leaves the cache exactly as it was.

use crate::analysis::{aggregate, Aggregation, Scope};
use crate::forms::{self, OperatorDraft, PersonnelDraft, ReportDraft, ValidationError};
use crate::models::{
    Assignment, Personnel, Profile, Report, ReportStatus, Role, StatusDetail, StatusUpdate, Unit,
};
use crate::store::rows::{NewReport, NewStatusHistory, ReportFields, ReportPatch};
use crate::store::{CaseStore, PrivilegedFunction, StoreError};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::{debug, info};

/// History note written when a report is created.
pub const CREATED_NOTE: &str = "Laporan dibuat oleh Admin.";
/// History note written when a report is soft-deleted.
pub const DELETED_NOTE: &str = "Laporan dihapus (Soft Delete)";

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Akses ditolak: {0}")]
    Permission(String),

    #[error("{0} tidak ditemukan")]
    NotFound(String),

    #[error("Keterangan {detail} tidak berlaku untuk status {status}")]
    InvalidStatus {
        status: ReportStatus,
        detail: StatusDetail,
    },

    #[error("Laporan #{0} belum ditunjuk ke unit")]
    NoUnitAssigned(String),

    #[error("Personil {personnel} bukan anggota unit yang ditunjuk")]
    PersonnelOutsideUnit { personnel: String },
}

/// The signed-in viewer's profile plus the aggregated register.
#[derive(Debug, Clone)]
pub struct CaseCache {
    pub profile: Profile,
    pub units: Vec<Unit>,
    pub personnel: Vec<Personnel>,
    /// Active reports, newest first.
    pub reports: Vec<Report>,
    /// Reports whose personnel lookup failed during the last load.
    pub failed_lookups: Vec<String>,
}

impl CaseCache {
    pub fn new(profile: Profile, aggregation: Aggregation) -> Self {
        Self {
            profile,
            units: aggregation.units,
            personnel: aggregation.personnel,
            reports: aggregation.reports,
            failed_lookups: aggregation.failed_lookups,
        }
    }

    /// Fetch the viewer's profile, then aggregate every table.
    pub async fn load<S: CaseStore + ?Sized>(
        store: &S,
        user_id: &str,
    ) -> Result<Self, WorkflowError> {
        let profile = store.fetch_profile(user_id).await?;
        debug!("Loaded profile: role {}", profile.role);
        let aggregation = aggregate(store).await?;
        Ok(Self::new(profile, aggregation))
    }

    pub fn scope(&self) -> Scope {
        Scope::for_profile(&self.profile)
    }

    pub fn is_admin(&self) -> bool {
        self.profile.role == Role::Admin
    }

    pub fn report(&self, report_id: &str) -> Result<&Report, WorkflowError> {
        self.reports
            .iter()
            .find(|r| r.id == report_id)
            .ok_or_else(|| WorkflowError::NotFound(format!("Laporan {report_id}")))
    }

    fn report_index(&self, report_id: &str) -> Result<usize, WorkflowError> {
        self.reports
            .iter()
            .position(|r| r.id == report_id)
            .ok_or_else(|| WorkflowError::NotFound(format!("Laporan {report_id}")))
    }

    fn unit_index(&self, unit_id: &str) -> Result<usize, WorkflowError> {
        self.units
            .iter()
            .position(|u| u.id == unit_id)
            .ok_or_else(|| WorkflowError::NotFound(format!("Unit {unit_id}")))
    }

    fn personnel_index(&self, personnel_id: &str) -> Result<usize, WorkflowError> {
        self.personnel
            .iter()
            .position(|p| p.id == personnel_id)
            .ok_or_else(|| WorkflowError::NotFound(format!("Personil {personnel_id}")))
    }

    pub fn require_admin(&self, action: &str) -> Result<(), WorkflowError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(WorkflowError::Permission(format!(
                "hanya Admin yang dapat {action}"
            )))
        }
    }

    /// Admins handle every report; operators the reports in their list.
    fn require_report_access(&self, report: &Report) -> Result<(), WorkflowError> {
        let visible = !self
            .scope()
            .visible_in_report_list(std::iter::once(report), &self.personnel)
            .is_empty();
        if visible {
            Ok(())
        } else {
            Err(WorkflowError::Permission(format!(
                "laporan #{} bukan milik unit Anda",
                report.report_number
            )))
        }
    }

    /// A report the viewer may open.
    pub fn visible_report(&self, report_id: &str) -> Result<&Report, WorkflowError> {
        let report = self.report(report_id)?;
        self.require_report_access(report)?;
        Ok(report)
    }

    fn author(&self) -> String {
        self.profile.role.to_string()
    }

    // === Reports ===

    /// File a new report in `Proses / Lidik` and prepend it to the cache.
    pub async fn create_report<S: CaseStore + ?Sized>(
        &mut self,
        store: &S,
        draft: &ReportDraft,
        now: DateTime<Utc>,
    ) -> Result<&Report, WorkflowError> {
        self.require_admin("membuat laporan")?;
        let fields = draft.to_fields()?;
        let id = new_report_id(now);
        let vehicles = draft.vehicle_rows(&id)?;

        let mut row = store
            .insert_report(&NewReport {
                id: id.clone(),
                fields,
                status: ReportStatus::InProgress,
                status_detail: StatusDetail::Lidik,
            })
            .await?;
        row.stolen_vehicles = if vehicles.is_empty() {
            Some(Vec::new())
        } else {
            Some(store.replace_vehicles(&id, &vehicles).await?)
        };
        let history = store
            .insert_status_history(&NewStatusHistory {
                report_id: id.clone(),
                status: ReportStatus::InProgress,
                status_detail: StatusDetail::Lidik,
                description: CREATED_NOTE.to_string(),
                updated_by: Role::Admin.to_string(),
            })
            .await?;
        row.status_history = Some(vec![history]);

        info!("Created report {} ({})", id, row.case_type);
        self.reports.insert(0, row.into_report(Vec::new()));
        Ok(&self.reports[0])
    }

    /// Overwrite a report's fields and replace its stolen vehicles.
    pub async fn edit_report<S: CaseStore + ?Sized>(
        &mut self,
        store: &S,
        report_id: &str,
        draft: &ReportDraft,
    ) -> Result<&Report, WorkflowError> {
        self.require_admin("mengubah laporan")?;
        let index = self.report_index(report_id)?;
        let fields = draft.to_fields()?;
        let vehicles = draft.vehicle_rows(report_id)?;

        store
            .update_report(
                report_id,
                &ReportPatch {
                    fields: Some(fields.clone()),
                    ..Default::default()
                },
            )
            .await?;
        let vehicle_rows = store.replace_vehicles(report_id, &vehicles).await?;

        let report = &mut self.reports[index];
        apply_fields(report, fields);
        report.stolen_vehicles = vehicle_rows
            .into_iter()
            .map(|v| v.into_vehicle(report_id))
            .collect();
        info!("Updated report {}", report_id);
        Ok(&*report)
    }

    /// Mark a report deleted and drop it from the cache.
    pub async fn soft_delete_report<S: CaseStore + ?Sized>(
        &mut self,
        store: &S,
        report_id: &str,
    ) -> Result<Report, WorkflowError> {
        self.require_admin("menghapus laporan")?;
        let index = self.report_index(report_id)?;

        store
            .update_report(
                report_id,
                &ReportPatch {
                    status: Some(ReportStatus::Deleted),
                    status_detail: Some(StatusDetail::Deleted),
                    ..Default::default()
                },
            )
            .await?;
        store
            .insert_status_history(&NewStatusHistory {
                report_id: report_id.to_string(),
                status: ReportStatus::Deleted,
                status_detail: StatusDetail::Deleted,
                description: DELETED_NOTE.to_string(),
                updated_by: self.author(),
            })
            .await?;

        info!("Soft-deleted report {}", report_id);
        Ok(self.reports.remove(index))
    }

    /// Point a report at a unit.
    ///
    /// Moving a report to another unit also unlinks its personnel, who
    /// belong to the previous unit.
    pub async fn assign_unit<S: CaseStore + ?Sized>(
        &mut self,
        store: &S,
        report_id: &str,
        unit_id: &str,
    ) -> Result<&Report, WorkflowError> {
        self.require_admin("menunjuk unit")?;
        let index = self.report_index(report_id)?;
        self.unit_index(unit_id)?;

        let report = &self.reports[index];
        let unit_changed = report.assigned_unit_id() != Some(unit_id);
        let unlink_personnel = unit_changed && !report.assigned_personnel_ids().is_empty();

        store
            .update_report(
                report_id,
                &ReportPatch {
                    assigned_unit_id: Some(unit_id.to_string()),
                    ..Default::default()
                },
            )
            .await?;
        if unlink_personnel {
            store.replace_assignments(report_id, &[]).await?;
        }

        let report = &mut self.reports[index];
        let personnel_ids = if unit_changed {
            Vec::new()
        } else {
            report.assigned_personnel_ids().to_vec()
        };
        report.assignment = Assignment::from_parts(Some(unit_id.to_string()), personnel_ids);
        info!("Assigned report {} to unit {}", report_id, unit_id);
        Ok(&*report)
    }

    /// Move a report to a new status and append the history entry.
    pub async fn update_status<S: CaseStore + ?Sized>(
        &mut self,
        store: &S,
        report_id: &str,
        status: ReportStatus,
        detail: StatusDetail,
        description: &str,
    ) -> Result<&Report, WorkflowError> {
        let index = self.report_index(report_id)?;
        self.require_report_access(&self.reports[index])?;
        if status == ReportStatus::Deleted || !StatusDetail::allowed_for(status).contains(&detail)
        {
            return Err(WorkflowError::InvalidStatus { status, detail });
        }

        store
            .update_report(
                report_id,
                &ReportPatch {
                    status: Some(status),
                    status_detail: Some(detail),
                    ..Default::default()
                },
            )
            .await?;
        let history = store
            .insert_status_history(&NewStatusHistory {
                report_id: report_id.to_string(),
                status,
                status_detail: detail,
                description: description.trim().to_string(),
                updated_by: self.author(),
            })
            .await?;

        let report = &mut self.reports[index];
        report.status = status;
        report.status_detail = Some(detail);
        report.status_history.push(StatusUpdate::from(history));
        info!(
            "Status laporan #{} diperbarui menjadi {}.",
            report.report_number, detail
        );
        Ok(&*report)
    }

    /// Replace the personnel working a report.
    ///
    /// Every id must belong to the report's assigned unit; duplicates are
    /// collapsed.
    pub async fn assign_personnel<S: CaseStore + ?Sized>(
        &mut self,
        store: &S,
        report_id: &str,
        personnel_ids: &[String],
    ) -> Result<&Report, WorkflowError> {
        let index = self.report_index(report_id)?;
        let report = &self.reports[index];
        self.require_report_access(report)?;
        let unit_id = report
            .assigned_unit_id()
            .ok_or_else(|| WorkflowError::NoUnitAssigned(report.report_number.clone()))?;

        let mut ids: Vec<String> = Vec::with_capacity(personnel_ids.len());
        for id in personnel_ids {
            let member = &self.personnel[self.personnel_index(id)?];
            if member.unit_id != unit_id {
                return Err(WorkflowError::PersonnelOutsideUnit {
                    personnel: member.display_name(),
                });
            }
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }

        store.replace_assignments(report_id, &ids).await?;

        let report = &mut self.reports[index];
        report.assignment = report.assignment.with_personnel(ids);
        info!(
            "Assigned {} personnel to report {}",
            report.assigned_personnel_ids().len(),
            report_id
        );
        Ok(&*report)
    }

    // === Units ===

    pub async fn create_unit<S: CaseStore + ?Sized>(
        &mut self,
        store: &S,
        name: &str,
    ) -> Result<&Unit, WorkflowError> {
        self.require_admin("menambah unit")?;
        let name = forms::unit_name(name)?;
        let row = store.insert_unit(&name).await?;
        info!("Created unit {} ({})", row.name, row.id);
        self.units.push(Unit::from(row));
        Ok(&self.units[self.units.len() - 1])
    }

    pub async fn rename_unit<S: CaseStore + ?Sized>(
        &mut self,
        store: &S,
        unit_id: &str,
        name: &str,
    ) -> Result<&Unit, WorkflowError> {
        self.require_admin("mengubah unit")?;
        let index = self.unit_index(unit_id)?;
        let name = forms::unit_name(name)?;
        store.update_unit(unit_id, &name).await?;
        self.units[index].name = name;
        Ok(&self.units[index])
    }

    /// Delete a unit through the privileged function.
    ///
    /// The server refuses with a conflict while personnel or reports still
    /// reference the unit; the conflict message is passed through.
    pub async fn delete_unit<S: CaseStore + ?Sized>(
        &mut self,
        store: &S,
        unit_id: &str,
    ) -> Result<Unit, WorkflowError> {
        self.require_admin("menghapus unit")?;
        let index = self.unit_index(unit_id)?;
        store
            .invoke(PrivilegedFunction::DeleteUnit, json!({ "unitId": unit_id }))
            .await?;
        info!("Deleted unit {}", unit_id);
        Ok(self.units.remove(index))
    }

    // === Personnel ===

    pub async fn create_personnel<S: CaseStore + ?Sized>(
        &mut self,
        store: &S,
        draft: &PersonnelDraft,
    ) -> Result<&Personnel, WorkflowError> {
        self.require_admin("menambah personil")?;
        let payload = draft.to_payload(&self.units)?;
        let row = store.insert_personnel(&payload).await?;
        info!("Created personnel {} ({})", row.name, row.id);
        self.personnel.push(Personnel::from(row));
        Ok(&self.personnel[self.personnel.len() - 1])
    }

    pub async fn edit_personnel<S: CaseStore + ?Sized>(
        &mut self,
        store: &S,
        personnel_id: &str,
        draft: &PersonnelDraft,
    ) -> Result<&Personnel, WorkflowError> {
        self.require_admin("mengubah personil")?;
        let index = self.personnel_index(personnel_id)?;
        let payload = draft.to_payload(&self.units)?;
        store.update_personnel(personnel_id, &payload).await?;

        let member = &mut self.personnel[index];
        member.name = payload.name;
        member.rank = payload.rank;
        member.unit_id = payload.unit_id;
        Ok(&*member)
    }

    /// Delete a personnel record and its login account.
    pub async fn delete_personnel<S: CaseStore + ?Sized>(
        &mut self,
        store: &S,
        personnel_id: &str,
    ) -> Result<Personnel, WorkflowError> {
        self.require_admin("menghapus personil")?;
        let index = self.personnel_index(personnel_id)?;
        store
            .invoke(
                PrivilegedFunction::DeletePersonnel,
                json!({ "personnelId": personnel_id }),
            )
            .await?;

        for report in &mut self.reports {
            if report.assigned_personnel_ids().iter().any(|id| id == personnel_id) {
                let remaining = report
                    .assigned_personnel_ids()
                    .iter()
                    .filter(|id| *id != personnel_id)
                    .cloned()
                    .collect();
                report.assignment = report.assignment.with_personnel(remaining);
            }
        }
        info!("Deleted personnel {}", personnel_id);
        Ok(self.personnel.remove(index))
    }

    /// Create a login account for a personnel record.
    pub async fn create_operator<S: CaseStore + ?Sized>(
        &mut self,
        store: &S,
        draft: &OperatorDraft,
    ) -> Result<&Personnel, WorkflowError> {
        self.require_admin("membuat akun operator")?;
        draft.validate()?;
        let index = self.personnel_index(&draft.personnel_id)?;

        let response = store
            .invoke(
                PrivilegedFunction::CreateOperator,
                json!({
                    "personnelId": draft.personnel_id,
                    "email": draft.email.trim(),
                    "password": draft.password,
                }),
            )
            .await?;

        let member = &mut self.personnel[index];
        member.user_id = response
            .get("userId")
            .and_then(|v| v.as_str())
            .map(String::from);
        member.user_email = Some(draft.email.trim().to_string());
        info!("Created operator account for {}", member.display_name());
        Ok(&*member)
    }
}

fn apply_fields(report: &mut Report, fields: ReportFields) {
    report.report_type = fields.report_type;
    report.report_year = fields.report_year;
    report.report_number = fields.report_number;
    report.police_model = fields.police_model;
    report.spkt = fields.spkt;
    report.report_date = fields.report_date;
    report.reporter_name = fields.reporter_name;
    report.case_type = fields.case_type;
    report.incident_date = fields.incident_date;
    report.incident_time = fields.incident_time;
    report.incident_location = fields.incident_location;
    report.location_type = fields.location_type;
    report.district = fields.district;
    report.sub_district = fields.sub_district;
    report.loss_amount = fields.loss_amount;
}

static ID_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Client-generated report id: `r-{millis}-{9 base-36 chars}`.
pub fn new_report_id(now: DateTime<Utc>) -> String {
    let sequence = ID_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let seed = u64::from(now.timestamp_subsec_nanos())
        ^ (u64::from(std::process::id()) << 32)
        ^ sequence.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    format!("r-{}-{}", now.timestamp_millis(), base36(seed, 9))
}

fn base36(mut n: u64, width: usize) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut out = vec!['0'; width];
    for slot in out.iter_mut().rev() {
        *slot = DIGITS[(n % 36) as usize] as char;
        n /= 36;
    }
    out.into_iter().collect()
}
