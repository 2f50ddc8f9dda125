//! Input drafts for the mutating workflows and their validation.

use crate::models::{LocationType, PoliceModel, Report, ReportType, Spkt, Unit};
use crate::regions;
use crate::store::rows::{NewVehicle, PersonnelPayload, ReportFields};
use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::Deserialize;
use thiserror::Error;

/// Minimum length of an operator account password.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Rejected form input.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{0} wajib diisi")]
    Missing(&'static str),

    #[error("Tahun laporan tidak valid: {0}")]
    InvalidYear(i32),

    #[error("Jam kejadian tidak valid: {0} (format JJ:MM)")]
    InvalidTime(String),

    #[error("Kecamatan tidak dikenal: {0}")]
    UnknownDistrict(String),

    #[error("Kelurahan {sub_district} tidak termasuk Kecamatan {district}")]
    SubDistrictMismatch {
        district: String,
        sub_district: String,
    },

    #[error("Nilai kerugian tidak boleh negatif")]
    NegativeLoss,

    #[error("Unit tidak ditemukan: {0}")]
    UnknownUnit(String),

    #[error("Email tidak valid: {0}")]
    InvalidEmail(String),

    #[error("Kata sandi minimal {MIN_PASSWORD_LEN} karakter")]
    PasswordTooShort,
}

fn required(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Missing(field));
    }
    Ok(trimmed.to_string())
}

/// A stolen vehicle as entered on the report form.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VehicleDraft {
    pub vehicle_type: String,
    pub frame_number: String,
    pub engine_number: String,
}

impl VehicleDraft {
    pub fn into_new_vehicle(self, report_id: &str) -> Result<NewVehicle, ValidationError> {
        Ok(NewVehicle {
            report_id: report_id.to_string(),
            vehicle_type: required(&self.vehicle_type, "Jenis kendaraan")?,
            frame_number: required(&self.frame_number, "Nomor rangka")?,
            engine_number: required(&self.engine_number, "Nomor mesin")?,
        })
    }
}

/// The report form.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDraft {
    pub report_type: ReportType,
    pub report_year: i32,
    pub report_number: String,
    pub police_model: PoliceModel,
    pub spkt: Spkt,
    pub report_date: NaiveDate,
    pub reporter_name: String,
    pub case_type: String,
    pub incident_date: NaiveDate,
    pub incident_time: String,
    pub incident_location: String,
    pub location_type: LocationType,
    pub district: String,
    pub sub_district: String,
    pub loss_amount: f64,
    pub vehicles: Vec<VehicleDraft>,
}

impl ReportDraft {
    /// Blank form as shown for a new report.
    pub fn new(today: NaiveDate) -> Self {
        let (district, sub_district) = regions::default_location();
        Self {
            report_type: ReportType::PoliceReport,
            report_year: today.year(),
            report_number: String::new(),
            police_model: PoliceModel::B,
            spkt: Spkt::PolrestaSorongKota,
            report_date: today,
            reporter_name: String::new(),
            case_type: String::new(),
            incident_date: today,
            incident_time: "12:00".to_string(),
            incident_location: String::new(),
            location_type: LocationType::Road,
            district: district.to_string(),
            sub_district: sub_district.to_string(),
            loss_amount: 0.0,
            vehicles: Vec::new(),
        }
    }

    /// Form pre-filled from an existing report, for editing.
    pub fn from_report(report: &Report) -> Self {
        Self {
            report_type: report.report_type,
            report_year: report.report_year,
            report_number: report.report_number.clone(),
            police_model: report.police_model.unwrap_or(PoliceModel::B),
            spkt: report.spkt,
            report_date: report.report_date.date_naive(),
            reporter_name: report.reporter_name.clone(),
            case_type: report.case_type.clone(),
            incident_date: report.incident_date.date_naive(),
            incident_time: report.incident_time.clone(),
            incident_location: report.incident_location.clone(),
            location_type: report.location_type,
            district: report.district.clone(),
            sub_district: report.sub_district.clone(),
            loss_amount: report.loss_amount.unwrap_or(0.0),
            vehicles: report
                .stolen_vehicles
                .iter()
                .map(|v| VehicleDraft {
                    vehicle_type: v.vehicle_type.clone(),
                    frame_number: v.frame_number.clone(),
                    engine_number: v.engine_number.clone(),
                })
                .collect(),
        }
    }

    /// Change district; the sub-district resets to the district's first.
    pub fn set_district(&mut self, district: &str) {
        self.district = district.to_string();
        self.sub_district = regions::sub_districts(district)
            .and_then(|subs| subs.first())
            .map(|s| s.to_string())
            .unwrap_or_default();
    }

    /// Validate and convert to the stored columns.
    ///
    /// The police model is only kept for formal police reports. Dates are
    /// stored at UTC midnight.
    pub fn to_fields(&self) -> Result<ReportFields, ValidationError> {
        if !(1900..=9999).contains(&self.report_year) {
            return Err(ValidationError::InvalidYear(self.report_year));
        }
        let incident_time = self.incident_time.trim();
        if NaiveTime::parse_from_str(incident_time, "%H:%M").is_err() {
            return Err(ValidationError::InvalidTime(self.incident_time.clone()));
        }
        let subs = regions::sub_districts(&self.district)
            .ok_or_else(|| ValidationError::UnknownDistrict(self.district.clone()))?;
        if !subs.contains(&self.sub_district.as_str()) {
            return Err(ValidationError::SubDistrictMismatch {
                district: self.district.clone(),
                sub_district: self.sub_district.clone(),
            });
        }
        if self.loss_amount < 0.0 || !self.loss_amount.is_finite() {
            return Err(ValidationError::NegativeLoss);
        }

        Ok(ReportFields {
            report_type: self.report_type,
            report_year: self.report_year,
            report_number: required(&self.report_number, "Nomor laporan")?,
            police_model: match self.report_type {
                ReportType::PoliceReport => Some(self.police_model),
                ReportType::PublicComplaint => None,
            },
            spkt: self.spkt,
            report_date: self.report_date.and_time(NaiveTime::MIN).and_utc(),
            reporter_name: required(&self.reporter_name, "Nama pelapor")?,
            case_type: required(&self.case_type, "Jenis kasus")?,
            incident_date: self.incident_date.and_time(NaiveTime::MIN).and_utc(),
            incident_time: incident_time.to_string(),
            incident_location: required(&self.incident_location, "Lokasi kejadian")?,
            location_type: self.location_type,
            district: self.district.clone(),
            sub_district: self.sub_district.clone(),
            loss_amount: Some(self.loss_amount),
        })
    }

    /// Validated vehicle rows for `report_id`.
    pub fn vehicle_rows(&self, report_id: &str) -> Result<Vec<NewVehicle>, ValidationError> {
        self.vehicles
            .iter()
            .cloned()
            .map(|v| v.into_new_vehicle(report_id))
            .collect()
    }
}

/// Report fields read from a draft file; absent keys keep the form's value.
///
/// Enum values use their stored spelling, e.g. `report_type = "Pengaduan Masyarakat"`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportForm {
    pub report_type: Option<ReportType>,
    pub report_year: Option<i32>,
    pub report_number: Option<String>,
    pub police_model: Option<PoliceModel>,
    pub spkt: Option<Spkt>,
    pub report_date: Option<NaiveDate>,
    pub reporter_name: Option<String>,
    pub case_type: Option<String>,
    pub incident_date: Option<NaiveDate>,
    pub incident_time: Option<String>,
    pub incident_location: Option<String>,
    pub location_type: Option<LocationType>,
    pub district: Option<String>,
    pub sub_district: Option<String>,
    pub loss_amount: Option<f64>,
    /// Replaces the whole vehicle list when present.
    pub vehicles: Option<Vec<VehicleDraft>>,
}

impl ReportForm {
    /// Fill `draft` with the keys present in this form.
    ///
    /// A new district without a sub-district falls back to the district's
    /// first sub-district, as on the form.
    pub fn apply_to(self, draft: &mut ReportDraft) {
        macro_rules! set {
            ($($field:ident),*) => {
                $(if let Some(value) = self.$field {
                    draft.$field = value;
                })*
            };
        }
        set!(
            report_type,
            report_year,
            report_number,
            police_model,
            spkt,
            report_date,
            reporter_name,
            case_type,
            incident_date,
            incident_time,
            incident_location,
            location_type,
            loss_amount,
            vehicles
        );
        if let Some(district) = self.district {
            draft.set_district(&district);
        }
        if let Some(sub_district) = self.sub_district {
            draft.sub_district = sub_district;
        }
    }
}

/// The personnel form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonnelDraft {
    pub name: String,
    pub rank: String,
    pub unit_id: String,
}

impl PersonnelDraft {
    pub fn to_payload(&self, units: &[Unit]) -> Result<PersonnelPayload, ValidationError> {
        let unit_id = required(&self.unit_id, "Unit")?;
        if !units.iter().any(|u| u.id == unit_id) {
            return Err(ValidationError::UnknownUnit(unit_id));
        }
        Ok(PersonnelPayload {
            name: required(&self.name, "Nama")?,
            rank: required(&self.rank, "Pangkat")?,
            unit_id,
        })
    }
}

/// The unit form; only a name.
pub fn unit_name(name: &str) -> Result<String, ValidationError> {
    required(name, "Nama unit")
}

/// Login account to create for a personnel record.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorDraft {
    pub personnel_id: String,
    pub email: String,
    pub password: String,
}

impl OperatorDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        required(&self.personnel_id, "Personil")?;
        let email = required(&self.email, "Email")?;
        let valid_email = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !valid_email {
            return Err(ValidationError::InvalidEmail(email));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort);
        }
        Ok(())
    }
}
