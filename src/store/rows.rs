//! Raw rows exchanged with the remote store.
//!
//! Field names follow the remote tables (snake_case). Conversions into the
//! domain models live here so the aggregator only deals with whole rows.

use crate::models::{
    Assignment, LocationType, PoliceModel, Personnel, Profile, Report, ReportStatus, ReportType,
    Role, Spkt, StatusDetail, StatusUpdate, StolenVehicle, Unit,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

/// Row of the `units` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitRow {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
}

impl From<UnitRow> for Unit {
    fn from(row: UnitRow) -> Self {
        Unit {
            id: row.id,
            name: row.name,
        }
    }
}

/// Row of the `personnel` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonnelRow {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    pub rank: String,
    pub unit_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl From<PersonnelRow> for Personnel {
    fn from(row: PersonnelRow) -> Self {
        Personnel {
            id: row.id,
            name: row.name,
            rank: row.rank,
            unit_id: row.unit_id,
            user_id: row.user_id,
            user_email: None,
        }
    }
}

/// Row of the `stolen_vehicles` table, as embedded under a report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StolenVehicleRow {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub report_id: Option<String>,
    #[serde(default)]
    pub vehicle_type: String,
    #[serde(default)]
    pub frame_number: String,
    #[serde(default)]
    pub engine_number: String,
}

impl StolenVehicleRow {
    pub fn into_vehicle(self, report_id: &str) -> StolenVehicle {
        StolenVehicle {
            id: self.id,
            report_id: self.report_id.unwrap_or_else(|| report_id.to_string()),
            vehicle_type: self.vehicle_type,
            frame_number: self.frame_number,
            engine_number: self.engine_number,
        }
    }
}

/// Row of the `status_history` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusHistoryRow {
    pub status: ReportStatus,
    pub status_detail: StatusDetail,
    #[serde(default)]
    pub description: String,
    #[serde(deserialize_with = "timestamp")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_by: String,
}

impl From<StatusHistoryRow> for StatusUpdate {
    fn from(row: StatusHistoryRow) -> Self {
        StatusUpdate {
            status: row.status,
            status_detail: row.status_detail,
            description: row.description,
            updated_at: row.updated_at,
            updated_by: row.updated_by,
        }
    }
}

/// Row of the `assigned_personnel` junction table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentRow {
    #[serde(deserialize_with = "id_string")]
    pub personnel_id: String,
}

/// Row of the `reports` table with its embedded sub-rows.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportRow {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub report_type: ReportType,
    pub report_year: i32,
    #[serde(deserialize_with = "id_string")]
    pub report_number: String,
    #[serde(default)]
    pub police_model: Option<PoliceModel>,
    pub spkt: Spkt,
    #[serde(deserialize_with = "timestamp")]
    pub report_date: DateTime<Utc>,
    pub reporter_name: String,
    pub case_type: String,
    #[serde(deserialize_with = "timestamp")]
    pub incident_date: DateTime<Utc>,
    #[serde(default)]
    pub incident_time: String,
    #[serde(default)]
    pub incident_location: String,
    pub location_type: LocationType,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub sub_district: String,
    #[serde(default)]
    pub loss_amount: Option<f64>,
    pub status: ReportStatus,
    #[serde(default)]
    pub status_detail: Option<StatusDetail>,
    #[serde(default)]
    pub assigned_unit_id: Option<String>,
    #[serde(default, deserialize_with = "embedded_rows")]
    pub stolen_vehicles: Option<Vec<StolenVehicleRow>>,
    #[serde(default, deserialize_with = "embedded_rows")]
    pub status_history: Option<Vec<StatusHistoryRow>>,
}

impl ReportRow {
    /// Convert to the domain model, attaching the resolved personnel links.
    ///
    /// Absent sub-collections become empty; history is sorted ascending by
    /// timestamp (stable for equal timestamps).
    pub fn into_report(self, personnel_ids: Vec<String>) -> Report {
        let id = self.id;
        let stolen_vehicles = self
            .stolen_vehicles
            .unwrap_or_default()
            .into_iter()
            .map(|v| v.into_vehicle(&id))
            .collect();

        let mut status_history: Vec<StatusUpdate> = self
            .status_history
            .unwrap_or_default()
            .into_iter()
            .map(StatusUpdate::from)
            .collect();
        status_history.sort_by_key(|h| h.updated_at);

        Report {
            id,
            report_type: self.report_type,
            report_year: self.report_year,
            report_number: self.report_number,
            police_model: self.police_model,
            spkt: self.spkt,
            report_date: self.report_date,
            reporter_name: self.reporter_name,
            case_type: self.case_type,
            incident_date: self.incident_date,
            incident_time: self.incident_time,
            incident_location: self.incident_location,
            location_type: self.location_type,
            district: self.district,
            sub_district: self.sub_district,
            loss_amount: self.loss_amount,
            status: self.status,
            status_detail: self.status_detail,
            assignment: Assignment::from_parts(self.assigned_unit_id, personnel_ids),
            stolen_vehicles,
            status_history,
        }
    }
}

/// Embedded unit name on a profile row.
#[derive(Debug, Clone, Deserialize)]
pub struct UnitName {
    pub name: String,
}

/// Row of the `profiles` table, with the home unit's name embedded.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileRow {
    pub role: Role,
    #[serde(default)]
    pub unit_id: Option<String>,
    #[serde(default)]
    pub units: Option<UnitName>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Profile {
            role: row.role,
            unit_id: row.unit_id,
            unit_name: row.units.map(|u| u.name),
        }
    }
}

// === Write payloads ===

/// Editable report fields, shared by insert and update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportFields {
    pub report_type: ReportType,
    pub report_year: i32,
    pub report_number: String,
    pub police_model: Option<PoliceModel>,
    pub spkt: Spkt,
    pub report_date: DateTime<Utc>,
    pub reporter_name: String,
    pub case_type: String,
    pub incident_date: DateTime<Utc>,
    pub incident_time: String,
    pub incident_location: String,
    pub location_type: LocationType,
    pub district: String,
    pub sub_district: String,
    pub loss_amount: Option<f64>,
}

/// Insert payload for `reports`.
#[derive(Debug, Clone, Serialize)]
pub struct NewReport {
    pub id: String,
    #[serde(flatten)]
    pub fields: ReportFields,
    pub status: ReportStatus,
    pub status_detail: StatusDetail,
}

/// Partial update for `reports`; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportPatch {
    #[serde(flatten)]
    pub fields: Option<ReportFields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ReportStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_detail: Option<StatusDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_unit_id: Option<String>,
}

/// Insert payload for `stolen_vehicles`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewVehicle {
    pub report_id: String,
    pub vehicle_type: String,
    pub frame_number: String,
    pub engine_number: String,
}

/// Insert payload for `status_history`; the store stamps `updated_at`.
#[derive(Debug, Clone, Serialize)]
pub struct NewStatusHistory {
    pub report_id: String,
    pub status: ReportStatus,
    pub status_detail: StatusDetail,
    pub description: String,
    pub updated_by: String,
}

/// Insert/update payload for `personnel`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonnelPayload {
    pub name: String,
    pub rank: String,
    pub unit_id: String,
}

/// Accept ids stored either as text or as integers.
/// Decode rows one at a time. A row that does not fit is logged and skipped.
pub fn decode_rows<T: DeserializeOwned>(table: &str, values: Vec<Value>) -> Vec<T> {
    values
        .into_iter()
        .filter_map(|value| {
            let id = value.get("id").map(Value::to_string).unwrap_or_default();
            match serde_json::from_value(value) {
                Ok(row) => Some(row),
                Err(e) => {
                    warn!("Skipping {} row {}: {}", table, id, e);
                    None
                }
            }
        })
        .collect()
}

fn embedded_rows<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let values: Option<Vec<Value>> = Option::deserialize(deserializer)?;
    Ok(values.map(|values| decode_rows("embedded", values)))
}

fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Int(n) => n.to_string(),
    })
}

/// Accept RFC 3339 timestamps, naive timestamps (taken as UTC) and bare dates.
fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    // Postgres renders short offsets as "+00"
    if let Ok(ts) = DateTime::parse_from_str(&format!("{raw}00"), "%Y-%m-%d %H:%M:%S%.f%z") {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
