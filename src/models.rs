//! Data models for the case register.
//!
//! This module contains the core data structures shared by the aggregator,
//! the analytics summarizer, the listings and the workflows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of the signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Operator,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "Admin"),
            Role::Operator => write!(f, "Operator"),
        }
    }
}

/// Kind of report filed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportType {
    /// Formal police report.
    #[serde(rename = "Laporan Polisi")]
    PoliceReport,
    /// Public complaint.
    #[serde(rename = "Pengaduan Masyarakat")]
    PublicComplaint,
}

impl ReportType {
    /// Prefix used in formatted report numbers.
    pub fn prefix(&self) -> &'static str {
        match self {
            ReportType::PoliceReport => "LP",
            ReportType::PublicComplaint => "REG",
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportType::PoliceReport => write!(f, "Laporan Polisi"),
            ReportType::PublicComplaint => write!(f, "Pengaduan Masyarakat"),
        }
    }
}

/// Police report model letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoliceModel {
    A,
    B,
    C,
}

impl fmt::Display for PoliceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoliceModel::A => write!(f, "A"),
            PoliceModel::B => write!(f, "B"),
            PoliceModel::C => write!(f, "C"),
        }
    }
}

/// Office where the report was filed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Spkt {
    #[serde(rename = "Polresta Sorong Kota")]
    PolrestaSorongKota,
    #[serde(rename = "Polsek Sorong Kota")]
    PolsekSorongKota,
    #[serde(rename = "Polsek Sorong Manoi")]
    PolsekSorongManoi,
    #[serde(rename = "Polsek Sorong Timur")]
    PolsekSorongTimur,
    #[serde(rename = "Polsek Sorong Barat")]
    PolsekSorongBarat,
    #[serde(rename = "Polsek KP3 Laut")]
    PolsekKp3Laut,
}

impl fmt::Display for Spkt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Spkt::PolrestaSorongKota => "Polresta Sorong Kota",
            Spkt::PolsekSorongKota => "Polsek Sorong Kota",
            Spkt::PolsekSorongManoi => "Polsek Sorong Manoi",
            Spkt::PolsekSorongTimur => "Polsek Sorong Timur",
            Spkt::PolsekSorongBarat => "Polsek Sorong Barat",
            Spkt::PolsekKp3Laut => "Polsek KP3 Laut",
        };
        write!(f, "{}", name)
    }
}

/// Kind of place where the incident happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocationType {
    #[serde(rename = "Jalan Raya")]
    Road,
    #[serde(rename = "Pemukiman")]
    Residential,
    #[serde(rename = "Perkantoran")]
    Office,
    #[serde(rename = "Pusat Perbelanjaan")]
    Shopping,
    #[serde(rename = "Tempat Ibadah")]
    Worship,
    #[serde(rename = "Sekolah")]
    School,
    #[serde(rename = "Lainnya")]
    Other,
}

impl fmt::Display for LocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LocationType::Road => "Jalan Raya",
            LocationType::Residential => "Pemukiman",
            LocationType::Office => "Perkantoran",
            LocationType::Shopping => "Pusat Perbelanjaan",
            LocationType::Worship => "Tempat Ibadah",
            LocationType::School => "Sekolah",
            LocationType::Other => "Lainnya",
        };
        write!(f, "{}", name)
    }
}

/// Coarse lifecycle status of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum ReportStatus {
    /// Under investigation.
    #[serde(rename = "Proses")]
    #[value(name = "proses")]
    InProgress,
    /// Investigation finished.
    #[serde(rename = "Selesai")]
    #[value(name = "selesai")]
    Completed,
    /// Soft-deleted sentinel.
    #[serde(rename = "Dihapus")]
    #[value(name = "dihapus")]
    Deleted,
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportStatus::InProgress => write!(f, "Proses"),
            ReportStatus::Completed => write!(f, "Selesai"),
            ReportStatus::Deleted => write!(f, "Dihapus"),
        }
    }
}

/// Sub-stage within a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum StatusDetail {
    #[serde(rename = "Lidik")]
    #[value(name = "lidik")]
    Lidik,
    #[serde(rename = "Sidik")]
    #[value(name = "sidik")]
    Sidik,
    /// Case file accepted by the prosecutor (final approval).
    #[serde(rename = "P21")]
    #[value(name = "p21")]
    P21,
    #[serde(rename = "Diversi")]
    #[value(name = "diversi")]
    Diversi,
    #[serde(rename = "Restorative Justice")]
    #[value(name = "rj")]
    RestorativeJustice,
    #[serde(rename = "SP3")]
    #[value(name = "sp3")]
    Sp3,
    #[serde(rename = "Data Dihapus")]
    #[value(skip)]
    Deleted,
}

impl StatusDetail {
    /// The six investigation sub-stages, in column order.
    pub const STAGES: [StatusDetail; 6] = [
        StatusDetail::Lidik,
        StatusDetail::Sidik,
        StatusDetail::P21,
        StatusDetail::Diversi,
        StatusDetail::RestorativeJustice,
        StatusDetail::Sp3,
    ];

    /// Sub-stages that may accompany the given status.
    pub fn allowed_for(status: ReportStatus) -> &'static [StatusDetail] {
        match status {
            ReportStatus::InProgress => &[StatusDetail::Lidik, StatusDetail::Sidik],
            ReportStatus::Completed => &[
                StatusDetail::P21,
                StatusDetail::Diversi,
                StatusDetail::RestorativeJustice,
                StatusDetail::Sp3,
            ],
            ReportStatus::Deleted => &[StatusDetail::Deleted],
        }
    }

    /// Short column label used in tables and spreadsheets.
    pub fn column_label(&self) -> &'static str {
        match self {
            StatusDetail::Lidik => "Lidik",
            StatusDetail::Sidik => "Sidik",
            StatusDetail::P21 => "P21",
            StatusDetail::Diversi => "Diversi",
            StatusDetail::RestorativeJustice => "RJ",
            StatusDetail::Sp3 => "SP3",
            StatusDetail::Deleted => "Dihapus",
        }
    }
}

impl fmt::Display for StatusDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusDetail::Lidik => write!(f, "Lidik"),
            StatusDetail::Sidik => write!(f, "Sidik"),
            StatusDetail::P21 => write!(f, "P21"),
            StatusDetail::Diversi => write!(f, "Diversi"),
            StatusDetail::RestorativeJustice => write!(f, "Restorative Justice"),
            StatusDetail::Sp3 => write!(f, "SP3"),
            StatusDetail::Deleted => write!(f, "Data Dihapus"),
        }
    }
}

/// An organizational sub-division.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: String,
    pub name: String,
}

/// A member of the unit roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Personnel {
    pub id: String,
    pub name: String,
    pub rank: String,
    /// Home unit.
    pub unit_id: String,
    /// Linked login account, if an operator account was created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
}

impl Personnel {
    /// Name as shown in rankings, e.g. `IPTU Budi`.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.rank, self.name)
    }
}

/// A vehicle reported stolen as part of a case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StolenVehicle {
    pub id: String,
    pub report_id: String,
    pub vehicle_type: String,
    pub frame_number: String,
    pub engine_number: String,
}

/// One immutable entry of a report's status history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: ReportStatus,
    pub status_detail: StatusDetail,
    pub description: String,
    pub updated_at: DateTime<Utc>,
    pub updated_by: String,
}

/// Who a report is assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Assignment {
    #[default]
    Unassigned,
    Unit {
        unit_id: String,
    },
    UnitAndPersonnel {
        unit_id: String,
        personnel_ids: Vec<String>,
    },
}

impl Assignment {
    /// Build an assignment from the nullable unit column and the junction rows.
    ///
    /// Personnel links without a unit are dropped; personnel are only ever
    /// assigned after a unit is.
    pub fn from_parts(unit_id: Option<String>, personnel_ids: Vec<String>) -> Self {
        match unit_id {
            None => Assignment::Unassigned,
            Some(unit_id) if personnel_ids.is_empty() => Assignment::Unit { unit_id },
            Some(unit_id) => Assignment::UnitAndPersonnel {
                unit_id,
                personnel_ids,
            },
        }
    }

    pub fn unit_id(&self) -> Option<&str> {
        match self {
            Assignment::Unassigned => None,
            Assignment::Unit { unit_id } | Assignment::UnitAndPersonnel { unit_id, .. } => {
                Some(unit_id)
            }
        }
    }

    /// Assigned personnel; empty when none.
    pub fn personnel_ids(&self) -> &[String] {
        match self {
            Assignment::UnitAndPersonnel { personnel_ids, .. } => personnel_ids,
            _ => &[],
        }
    }

    /// Same unit, new personnel list.
    pub fn with_personnel(&self, personnel_ids: Vec<String>) -> Self {
        Self::from_parts(self.unit_id().map(String::from), personnel_ids)
    }
}

/// A case record with its sub-records attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub report_type: ReportType,
    pub report_year: i32,
    pub report_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub police_model: Option<PoliceModel>,
    pub spkt: Spkt,
    pub report_date: DateTime<Utc>,
    pub reporter_name: String,
    /// Free-text case category, e.g. "Curanmor".
    pub case_type: String,
    pub incident_date: DateTime<Utc>,
    pub incident_time: String,
    pub incident_location: String,
    pub location_type: LocationType,
    pub district: String,
    pub sub_district: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loss_amount: Option<f64>,
    pub status: ReportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_detail: Option<StatusDetail>,
    pub assignment: Assignment,
    pub stolen_vehicles: Vec<StolenVehicle>,
    /// Ascending by `updated_at`.
    pub status_history: Vec<StatusUpdate>,
}

impl Report {
    pub fn assigned_unit_id(&self) -> Option<&str> {
        self.assignment.unit_id()
    }

    pub fn assigned_personnel_ids(&self) -> &[String] {
        self.assignment.personnel_ids()
    }

    pub fn is_completed(&self) -> bool {
        self.status == ReportStatus::Completed
    }

    /// Short form used in the report list, e.g. `LP-12`.
    pub fn short_number(&self) -> String {
        format!("{}-{}", self.report_type.prefix(), self.report_number)
    }

    /// Full form, e.g. `LP/B/12/2024` or `REG/7/2024`.
    pub fn full_number(&self) -> String {
        match self.police_model {
            Some(model) => format!(
                "{}/{}/{}/{}",
                self.report_type.prefix(),
                model,
                self.report_number,
                self.report_year
            ),
            None => format!(
                "{}/{}/{}",
                self.report_type.prefix(),
                self.report_number,
                self.report_year
            ),
        }
    }
}

/// Profile row of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_name: Option<String>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    /// A minimal in-progress police report.
    pub fn report(id: &str, case_type: &str) -> Report {
        Report {
            id: id.to_string(),
            report_type: ReportType::PoliceReport,
            report_year: 2024,
            report_number: "1".to_string(),
            police_model: Some(PoliceModel::B),
            spkt: Spkt::PolrestaSorongKota,
            report_date: Utc.with_ymd_and_hms(2024, 5, 10, 8, 0, 0).unwrap(),
            reporter_name: "Pelapor".to_string(),
            case_type: case_type.to_string(),
            incident_date: Utc.with_ymd_and_hms(2024, 5, 9, 0, 0, 0).unwrap(),
            incident_time: "12:00".to_string(),
            incident_location: "Jl. Basuki Rahmat".to_string(),
            location_type: LocationType::Road,
            district: "Sorong".to_string(),
            sub_district: "Remu".to_string(),
            loss_amount: None,
            status: ReportStatus::InProgress,
            status_detail: Some(StatusDetail::Lidik),
            assignment: Assignment::Unassigned,
            stolen_vehicles: Vec::new(),
            status_history: Vec::new(),
        }
    }

    pub fn with_status(mut report: Report, status: ReportStatus, detail: StatusDetail) -> Report {
        report.status = status;
        report.status_detail = Some(detail);
        report
    }

    pub fn unit(id: &str, name: &str) -> Unit {
        Unit {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    pub fn personnel(id: &str, name: &str, unit_id: &str) -> Personnel {
        Personnel {
            id: id.to_string(),
            name: name.to_string(),
            rank: "BRIPKA".to_string(),
            unit_id: unit_id.to_string(),
            user_id: None,
            user_email: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_detail_serde_names() {
        let json = serde_json::to_string(&StatusDetail::RestorativeJustice).unwrap();
        assert_eq!(json, "\"Restorative Justice\"");
        let parsed: ReportStatus = serde_json::from_str("\"Selesai\"").unwrap();
        assert_eq!(parsed, ReportStatus::Completed);
    }

    #[test]
    fn test_allowed_details() {
        assert!(StatusDetail::allowed_for(ReportStatus::InProgress).contains(&StatusDetail::Sidik));
        assert!(!StatusDetail::allowed_for(ReportStatus::InProgress).contains(&StatusDetail::P21));
        assert_eq!(StatusDetail::allowed_for(ReportStatus::Completed).len(), 4);
    }

    #[test]
    fn test_assignment_from_parts() {
        assert_eq!(Assignment::from_parts(None, vec![]), Assignment::Unassigned);
        assert_eq!(
            Assignment::from_parts(None, vec!["p1".to_string()]),
            Assignment::Unassigned
        );

        let unit_only = Assignment::from_parts(Some("u1".to_string()), vec![]);
        assert_eq!(unit_only.unit_id(), Some("u1"));
        assert!(unit_only.personnel_ids().is_empty());

        let full = unit_only.with_personnel(vec!["p1".to_string(), "p2".to_string()]);
        assert_eq!(full.personnel_ids().len(), 2);
        assert_eq!(full.unit_id(), Some("u1"));
    }

    #[test]
    fn test_report_numbers() {
        let mut report = fixtures::report("r1", "Curanmor");
        report.report_number = "12".to_string();
        assert_eq!(report.short_number(), "LP-12");
        assert_eq!(report.full_number(), "LP/B/12/2024");

        report.report_type = ReportType::PublicComplaint;
        report.police_model = None;
        assert_eq!(report.short_number(), "REG-12");
        assert_eq!(report.full_number(), "REG/12/2024");
    }

    #[test]
    fn test_personnel_display_name() {
        let p = fixtures::personnel("p1", "Budi", "u1");
        assert_eq!(p.display_name(), "BRIPKA Budi");
    }
}
