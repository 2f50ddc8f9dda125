//! In-memory case store for tests.

use super::rows::{
    AssignmentRow, NewReport, NewStatusHistory, NewVehicle, PersonnelPayload, PersonnelRow,
    ReportPatch, ReportRow, StatusHistoryRow, StolenVehicleRow, UnitRow,
};
use super::{CaseStore, PrivilegedFunction, StoreError, StoreResult};
use crate::models::Profile;
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Tables plus switches that make individual calls fail.
#[derive(Debug, Default)]
pub struct FakeState {
    pub profiles: HashMap<String, Profile>,
    pub units: Vec<UnitRow>,
    pub personnel: Vec<PersonnelRow>,
    pub reports: Vec<ReportRow>,
    pub assignments: HashMap<String, Vec<String>>,

    pub fail_units: bool,
    pub fail_personnel: bool,
    pub fail_reports: bool,
    pub fail_assignments_for: HashSet<String>,
    pub fail_report_updates: bool,
    pub fail_history: bool,

    /// Every privileged function call, in order.
    pub invocations: Vec<(PrivilegedFunction, Value)>,
    pub next_id: u32,
    pub clock: u32,
}

impl FakeState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    /// Monotonic timestamps for inserted history rows.
    fn tick(&mut self) -> DateTime<Utc> {
        self.clock += 1;
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap() + Duration::minutes(self.clock as i64)
    }

    fn report_mut(&mut self, report_id: &str) -> StoreResult<&mut ReportRow> {
        self.reports
            .iter_mut()
            .find(|r| r.id == report_id)
            .ok_or_else(|| StoreError::NotFound(format!("report {report_id}")))
    }
}

/// Case store holding its tables in memory.
#[derive(Debug, Default)]
pub struct FakeStore {
    pub state: Mutex<FakeState>,
}

impl FakeStore {
    pub fn new(state: FakeState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// Run a closure against the state, e.g. to flip a failure switch.
    pub fn with_state<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }
}

fn unavailable(what: &str) -> StoreError {
    StoreError::Api {
        status: 503,
        message: format!("{what} unavailable"),
    }
}

fn required_str<'a>(body: &'a Value, key: &str) -> StoreResult<&'a str> {
    body.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::BadRequest(format!("Missing required fields: {key}")))
}

#[async_trait]
impl CaseStore for FakeStore {
    async fn fetch_profile(&self, user_id: &str) -> StoreResult<Profile> {
        self.with_state(|s| {
            s.profiles
                .get(user_id)
                .cloned()
                .ok_or_else(|| StoreError::NotFound(format!("profile {user_id}")))
        })
    }

    async fn fetch_units(&self) -> StoreResult<Vec<UnitRow>> {
        self.with_state(|s| {
            if s.fail_units {
                return Err(unavailable("units"));
            }
            Ok(s.units.clone())
        })
    }

    async fn fetch_personnel(&self) -> StoreResult<Vec<PersonnelRow>> {
        self.with_state(|s| {
            if s.fail_personnel {
                return Err(unavailable("personnel"));
            }
            Ok(s.personnel.clone())
        })
    }

    async fn fetch_reports(&self) -> StoreResult<Vec<ReportRow>> {
        self.with_state(|s| {
            if s.fail_reports {
                return Err(unavailable("reports"));
            }
            let mut rows = s.reports.clone();
            rows.sort_by(|a, b| b.report_date.cmp(&a.report_date));
            Ok(rows)
        })
    }

    async fn fetch_assignments(&self, report_id: &str) -> StoreResult<Vec<AssignmentRow>> {
        self.with_state(|s| {
            if s.fail_assignments_for.contains(report_id) {
                return Err(unavailable("assigned_personnel"));
            }
            Ok(s.assignments
                .get(report_id)
                .map(|ids| {
                    ids.iter()
                        .map(|id| AssignmentRow {
                            personnel_id: id.clone(),
                        })
                        .collect()
                })
                .unwrap_or_default())
        })
    }

    async fn insert_report(&self, report: &NewReport) -> StoreResult<ReportRow> {
        self.with_state(|s| {
            let f = &report.fields;
            let row = ReportRow {
                id: report.id.clone(),
                report_type: f.report_type,
                report_year: f.report_year,
                report_number: f.report_number.clone(),
                police_model: f.police_model,
                spkt: f.spkt,
                report_date: f.report_date,
                reporter_name: f.reporter_name.clone(),
                case_type: f.case_type.clone(),
                incident_date: f.incident_date,
                incident_time: f.incident_time.clone(),
                incident_location: f.incident_location.clone(),
                location_type: f.location_type,
                district: f.district.clone(),
                sub_district: f.sub_district.clone(),
                loss_amount: f.loss_amount,
                status: report.status,
                status_detail: Some(report.status_detail),
                assigned_unit_id: None,
                stolen_vehicles: Some(Vec::new()),
                status_history: Some(Vec::new()),
            };
            s.reports.push(row.clone());
            Ok(row)
        })
    }

    async fn update_report(&self, report_id: &str, patch: &ReportPatch) -> StoreResult<()> {
        self.with_state(|s| {
            if s.fail_report_updates {
                return Err(StoreError::Forbidden(
                    "new row violates row-level security policy".to_string(),
                ));
            }
            let row = s.report_mut(report_id)?;
            if let Some(f) = &patch.fields {
                row.report_type = f.report_type;
                row.report_year = f.report_year;
                row.report_number = f.report_number.clone();
                row.police_model = f.police_model;
                row.spkt = f.spkt;
                row.report_date = f.report_date;
                row.reporter_name = f.reporter_name.clone();
                row.case_type = f.case_type.clone();
                row.incident_date = f.incident_date;
                row.incident_time = f.incident_time.clone();
                row.incident_location = f.incident_location.clone();
                row.location_type = f.location_type;
                row.district = f.district.clone();
                row.sub_district = f.sub_district.clone();
                row.loss_amount = f.loss_amount;
            }
            if let Some(status) = patch.status {
                row.status = status;
            }
            if let Some(detail) = patch.status_detail {
                row.status_detail = Some(detail);
            }
            if let Some(unit_id) = &patch.assigned_unit_id {
                row.assigned_unit_id = Some(unit_id.clone());
            }
            Ok(())
        })
    }

    async fn replace_vehicles(
        &self,
        report_id: &str,
        vehicles: &[NewVehicle],
    ) -> StoreResult<Vec<StolenVehicleRow>> {
        self.with_state(|s| {
            let rows: Vec<StolenVehicleRow> = vehicles
                .iter()
                .map(|v| StolenVehicleRow {
                    id: s.next_id("v"),
                    report_id: Some(v.report_id.clone()),
                    vehicle_type: v.vehicle_type.clone(),
                    frame_number: v.frame_number.clone(),
                    engine_number: v.engine_number.clone(),
                })
                .collect();
            s.report_mut(report_id)?.stolen_vehicles = Some(rows.clone());
            Ok(rows)
        })
    }

    async fn insert_status_history(
        &self,
        entry: &NewStatusHistory,
    ) -> StoreResult<StatusHistoryRow> {
        self.with_state(|s| {
            if s.fail_history {
                return Err(unavailable("status_history"));
            }
            let row = StatusHistoryRow {
                status: entry.status,
                status_detail: entry.status_detail,
                description: entry.description.clone(),
                updated_at: s.tick(),
                updated_by: entry.updated_by.clone(),
            };
            s.report_mut(&entry.report_id)?
                .status_history
                .get_or_insert_with(Vec::new)
                .push(row.clone());
            Ok(row)
        })
    }

    async fn replace_assignments(
        &self,
        report_id: &str,
        personnel_ids: &[String],
    ) -> StoreResult<()> {
        self.with_state(|s| {
            s.assignments
                .insert(report_id.to_string(), personnel_ids.to_vec());
            Ok(())
        })
    }

    async fn insert_unit(&self, name: &str) -> StoreResult<UnitRow> {
        self.with_state(|s| {
            let row = UnitRow {
                id: s.next_id("u"),
                name: name.to_string(),
            };
            s.units.push(row.clone());
            Ok(row)
        })
    }

    async fn update_unit(&self, unit_id: &str, name: &str) -> StoreResult<()> {
        self.with_state(|s| {
            let unit = s
                .units
                .iter_mut()
                .find(|u| u.id == unit_id)
                .ok_or_else(|| StoreError::NotFound(format!("unit {unit_id}")))?;
            unit.name = name.to_string();
            Ok(())
        })
    }

    async fn insert_personnel(&self, payload: &PersonnelPayload) -> StoreResult<PersonnelRow> {
        self.with_state(|s| {
            let row = PersonnelRow {
                id: s.next_id("p"),
                name: payload.name.clone(),
                rank: payload.rank.clone(),
                unit_id: payload.unit_id.clone(),
                user_id: None,
            };
            s.personnel.push(row.clone());
            Ok(row)
        })
    }

    async fn update_personnel(
        &self,
        personnel_id: &str,
        payload: &PersonnelPayload,
    ) -> StoreResult<()> {
        self.with_state(|s| {
            let row = s
                .personnel
                .iter_mut()
                .find(|p| p.id == personnel_id)
                .ok_or_else(|| StoreError::NotFound(format!("personnel {personnel_id}")))?;
            row.name = payload.name.clone();
            row.rank = payload.rank.clone();
            row.unit_id = payload.unit_id.clone();
            Ok(())
        })
    }

    async fn invoke(&self, function: PrivilegedFunction, body: Value) -> StoreResult<Value> {
        self.with_state(|s| {
            s.invocations.push((function, body.clone()));
            match function {
                PrivilegedFunction::CreateOperator => {
                    let personnel_id = required_str(&body, "personnelId")?;
                    let user_id = s.next_id("user");
                    let row = s
                        .personnel
                        .iter_mut()
                        .find(|p| p.id == personnel_id)
                        .ok_or_else(|| StoreError::NotFound("Personil tidak ditemukan".into()))?;
                    row.user_id = Some(user_id.clone());
                    Ok(json!({ "success": true, "userId": user_id }))
                }
                PrivilegedFunction::DeletePersonnel => {
                    let personnel_id = required_str(&body, "personnelId")?;
                    s.personnel.retain(|p| p.id != personnel_id);
                    Ok(json!({ "success": true }))
                }
                PrivilegedFunction::DeleteUnit => {
                    let unit_id = required_str(&body, "unitId")?.to_string();
                    if s.personnel.iter().any(|p| p.unit_id == unit_id) {
                        return Err(StoreError::Conflict(
                            "Gagal menghapus: Unit ini masih memiliki personil terdaftar. Pindahkan personil terlebih dahulu."
                                .to_string(),
                        ));
                    }
                    if s
                        .reports
                        .iter()
                        .any(|r| r.assigned_unit_id.as_deref() == Some(unit_id.as_str()))
                    {
                        return Err(StoreError::Conflict(
                            "Gagal menghapus: Unit ini masih memiliki laporan yang ditugaskan. Pindahkan laporan terlebih dahulu."
                                .to_string(),
                        ));
                    }
                    s.units.retain(|u| u.id != unit_id);
                    Ok(json!({ "success": true }))
                }
            }
        })
    }
}

/// Raw report row built from a domain fixture.
pub fn report_row(report: &crate::models::Report) -> ReportRow {
    ReportRow {
        id: report.id.clone(),
        report_type: report.report_type,
        report_year: report.report_year,
        report_number: report.report_number.clone(),
        police_model: report.police_model,
        spkt: report.spkt,
        report_date: report.report_date,
        reporter_name: report.reporter_name.clone(),
        case_type: report.case_type.clone(),
        incident_date: report.incident_date,
        incident_time: report.incident_time.clone(),
        incident_location: report.incident_location.clone(),
        location_type: report.location_type,
        district: report.district.clone(),
        sub_district: report.sub_district.clone(),
        loss_amount: report.loss_amount,
        status: report.status,
        status_detail: report.status_detail,
        assigned_unit_id: report.assigned_unit_id().map(String::from),
        stolen_vehicles: None,
        status_history: None,
    }
}

pub fn unit_row(id: &str, name: &str) -> UnitRow {
    UnitRow {
        id: id.to_string(),
        name: name.to_string(),
    }
}

pub fn personnel_row(id: &str, name: &str, unit_id: &str) -> PersonnelRow {
    PersonnelRow {
        id: id.to_string(),
        name: name.to_string(),
        rank: "BRIPKA".to_string(),
        unit_id: unit_id.to_string(),
        user_id: None,
    }
}
