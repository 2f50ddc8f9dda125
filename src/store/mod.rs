//! Remote store abstraction.
//!
//! All persistence, authentication and authorization live in a hosted
//! relational store. This module defines the contract the rest of the
//! crate relies on:
//! - `rest`: the HTTP implementation (tables, auth endpoint, functions)
//! - `fake`: an in-memory implementation used by the tests

pub mod error;
#[cfg(test)]
pub mod fake;
pub mod rest;
pub mod rows;
pub mod session;

pub use error::{StoreError, StoreResult};
pub use rest::RestStore;
pub use session::Session;

use crate::models::Profile;
use async_trait::async_trait;
use rows::{
    AssignmentRow, NewReport, NewStatusHistory, NewVehicle, PersonnelPayload, PersonnelRow,
    ReportPatch, ReportRow, StatusHistoryRow, StolenVehicleRow, UnitRow,
};
use std::fmt;

/// Privileged operations that run server-side with elevated credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivilegedFunction {
    /// Create a login account linked to a personnel record.
    CreateOperator,
    /// Delete a personnel record and its linked login account.
    DeletePersonnel,
    /// Delete a unit; rejected with a conflict while still referenced.
    DeleteUnit,
}

impl PrivilegedFunction {
    /// Function name on the remote platform.
    pub fn name(&self) -> &'static str {
        match self {
            PrivilegedFunction::CreateOperator => "create-operator",
            PrivilegedFunction::DeletePersonnel => "delete-personnel",
            PrivilegedFunction::DeleteUnit => "delete-unit",
        }
    }
}

impl fmt::Display for PrivilegedFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Read/write access to the case tables.
///
/// Implementations must be callable concurrently; the aggregator issues
/// several reads at once.
#[async_trait]
pub trait CaseStore: Send + Sync {
    /// Role and home unit of a signed-in user.
    async fn fetch_profile(&self, user_id: &str) -> StoreResult<Profile>;

    async fn fetch_units(&self) -> StoreResult<Vec<UnitRow>>;

    async fn fetch_personnel(&self) -> StoreResult<Vec<PersonnelRow>>;

    /// Reports with stolen-vehicle and status-history rows joined
    /// server-side, newest report first.
    async fn fetch_reports(&self) -> StoreResult<Vec<ReportRow>>;

    /// Junction rows linking personnel to one report.
    async fn fetch_assignments(&self, report_id: &str) -> StoreResult<Vec<AssignmentRow>>;

    /// Insert a report and return the stored row.
    async fn insert_report(&self, report: &NewReport) -> StoreResult<ReportRow>;

    async fn update_report(&self, report_id: &str, patch: &ReportPatch) -> StoreResult<()>;

    /// Replace every stolen-vehicle row of a report.
    async fn replace_vehicles(
        &self,
        report_id: &str,
        vehicles: &[NewVehicle],
    ) -> StoreResult<Vec<StolenVehicleRow>>;

    /// Append a status-history entry and return it with its timestamp.
    async fn insert_status_history(
        &self,
        entry: &NewStatusHistory,
    ) -> StoreResult<StatusHistoryRow>;

    /// Replace every junction row of a report.
    async fn replace_assignments(&self, report_id: &str, personnel_ids: &[String])
        -> StoreResult<()>;

    async fn insert_unit(&self, name: &str) -> StoreResult<UnitRow>;

    async fn update_unit(&self, unit_id: &str, name: &str) -> StoreResult<()>;

    async fn insert_personnel(&self, payload: &PersonnelPayload) -> StoreResult<PersonnelRow>;

    async fn update_personnel(&self, personnel_id: &str, payload: &PersonnelPayload)
        -> StoreResult<()>;

    /// Invoke a privileged serverless function with a JSON body.
    async fn invoke(
        &self,
        function: PrivilegedFunction,
        body: serde_json::Value,
    ) -> StoreResult<serde_json::Value>;
}
