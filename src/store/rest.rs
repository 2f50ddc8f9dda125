//! HTTP implementation of the case store.
//!
//! Talks to the hosted platform's REST interface (`/rest/v1`), its password
//! auth endpoint (`/auth/v1`) and its serverless functions (`/functions/v1`).

use super::rows::{
    decode_rows, AssignmentRow, NewReport, NewStatusHistory, NewVehicle, PersonnelPayload,
    PersonnelRow, ProfileRow, ReportPatch, ReportRow, StatusHistoryRow, StolenVehicleRow, UnitRow,
};
use super::session::{Session, TokenResponse};
use super::{CaseStore, PrivilegedFunction, StoreError, StoreResult};
use crate::models::Profile;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{header, Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const REPORTS_SELECT: &str = "*,stolen_vehicles(*),status_history(*)";

/// Case store backed by the remote platform's HTTP API.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: Client,
    base_url: String,
    anon_key: String,
    access_token: Option<String>,
}

impl RestStore {
    /// Create a client for the platform at `base_url`.
    pub fn new(base_url: &str, anon_key: &str, timeout_seconds: u64) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            access_token: None,
        })
    }

    /// Attach a session; subsequent calls run with the user's identity.
    pub fn with_session(mut self, session: &Session) -> Self {
        self.access_token = Some(session.access_token.clone());
        self
    }

    /// Sign in with email and password.
    pub async fn sign_in(&self, email: &str, password: &str) -> StoreResult<Session> {
        #[derive(Serialize)]
        struct PasswordGrant<'a> {
            email: &'a str,
            password: &'a str,
        }

        let url = format!("{}/auth/v1/token", self.base_url);
        let response = self
            .client
            .post(&url)
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&PasswordGrant { email, password })
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::BAD_REQUEST {
            let message = error_message(response).await;
            return Err(StoreError::Unauthorized(message));
        }

        let token: TokenResponse = Self::handle_json(response).await?;
        Ok(token.into_session(email, Utc::now()))
    }

    /// Revoke the attached session.
    pub async fn sign_out(&self) -> StoreResult<()> {
        let url = format!("{}/auth/v1/logout", self.base_url);
        let response = self.request(Method::POST, &url).send().await?;
        Self::handle_empty(response).await
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Build a request carrying the API key and the bearer token.
    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", bearer))
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> StoreResult<Vec<T>> {
        debug!("GET {} {:?}", table, query);
        let response = self
            .request(Method::GET, &self.table_url(table))
            .query(query)
            .send()
            .await?;
        Self::handle_json(response).await
    }

    async fn insert<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        table: &str,
        body: &B,
    ) -> StoreResult<Vec<T>> {
        debug!("POST {}", table);
        let response = self
            .request(Method::POST, &self.table_url(table))
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        Self::handle_json(response).await
    }

    async fn insert_one<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        table: &str,
        body: &B,
    ) -> StoreResult<T> {
        self.insert::<T, B>(table, body)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::InvalidResponse(format!("insert into {table} returned no row")))
    }

    async fn patch<B: Serialize + ?Sized>(
        &self,
        table: &str,
        filter: (&str, String),
        body: &B,
    ) -> StoreResult<()> {
        debug!("PATCH {} {:?}", table, filter);
        let response = self
            .request(Method::PATCH, &self.table_url(table))
            .query(&[filter])
            .header("Prefer", "return=minimal")
            .json(body)
            .send()
            .await?;
        Self::handle_empty(response).await
    }

    async fn delete(&self, table: &str, filter: (&str, String)) -> StoreResult<()> {
        debug!("DELETE {} {:?}", table, filter);
        let response = self
            .request(Method::DELETE, &self.table_url(table))
            .query(&[filter])
            .send()
            .await?;
        Self::handle_empty(response).await
    }

    async fn handle_json<T: DeserializeOwned>(response: Response) -> StoreResult<T> {
        if !response.status().is_success() {
            return Err(error_from(response).await);
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(Into::into)
    }

    async fn handle_empty(response: Response) -> StoreResult<()> {
        if !response.status().is_success() {
            return Err(error_from(response).await);
        }
        Ok(())
    }
}

fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

async fn error_from(response: Response) -> StoreError {
    let status = response.status().as_u16();
    let message = error_message(response).await;
    StoreError::from_status(status, message)
}

/// Pull a human-readable message out of an error body.
async fn error_message(response: Response) -> String {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    extract_message(&text).unwrap_or_else(|| {
        if text.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        } else {
            text
        }
    })
}

fn extract_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    ["message", "msg", "error_description", "error"]
        .iter()
        .find_map(|key| json.get(*key).and_then(Value::as_str))
        .map(String::from)
}

#[async_trait]
impl CaseStore for RestStore {
    async fn fetch_profile(&self, user_id: &str) -> StoreResult<Profile> {
        let rows: Vec<ProfileRow> = self
            .select(
                "profiles",
                &[
                    ("select", "role,unit_id,units(name)".to_string()),
                    ("id", eq(user_id)),
                ],
            )
            .await?;

        rows.into_iter()
            .next()
            .map(Profile::from)
            .ok_or_else(|| StoreError::NotFound("Profil pengguna tidak ditemukan.".to_string()))
    }

    async fn fetch_units(&self) -> StoreResult<Vec<UnitRow>> {
        self.select("units", &[("select", "*".to_string())]).await
    }

    async fn fetch_personnel(&self) -> StoreResult<Vec<PersonnelRow>> {
        self.select("personnel", &[("select", "*".to_string())])
            .await
    }

    async fn fetch_reports(&self) -> StoreResult<Vec<ReportRow>> {
        let values: Vec<Value> = self
            .select(
                "reports",
                &[
                    ("select", REPORTS_SELECT.to_string()),
                    ("order", "report_date.desc".to_string()),
                ],
            )
            .await?;
        Ok(decode_rows("reports", values))
    }

    async fn fetch_assignments(&self, report_id: &str) -> StoreResult<Vec<AssignmentRow>> {
        self.select(
            "assigned_personnel",
            &[
                ("select", "personnel_id".to_string()),
                ("report_id", eq(report_id)),
            ],
        )
        .await
    }

    async fn insert_report(&self, report: &NewReport) -> StoreResult<ReportRow> {
        self.insert_one("reports", report).await
    }

    async fn update_report(&self, report_id: &str, patch: &ReportPatch) -> StoreResult<()> {
        self.patch("reports", ("id", eq(report_id)), patch).await
    }

    async fn replace_vehicles(
        &self,
        report_id: &str,
        vehicles: &[NewVehicle],
    ) -> StoreResult<Vec<StolenVehicleRow>> {
        self.delete("stolen_vehicles", ("report_id", eq(report_id)))
            .await?;
        if vehicles.is_empty() {
            return Ok(Vec::new());
        }
        self.insert("stolen_vehicles", vehicles).await
    }

    async fn insert_status_history(
        &self,
        entry: &NewStatusHistory,
    ) -> StoreResult<StatusHistoryRow> {
        self.insert_one("status_history", entry).await
    }

    async fn replace_assignments(
        &self,
        report_id: &str,
        personnel_ids: &[String],
    ) -> StoreResult<()> {
        #[derive(Serialize)]
        struct NewAssignment<'a> {
            report_id: &'a str,
            personnel_id: &'a str,
        }

        self.delete("assigned_personnel", ("report_id", eq(report_id)))
            .await?;
        if personnel_ids.is_empty() {
            return Ok(());
        }

        let rows: Vec<NewAssignment<'_>> = personnel_ids
            .iter()
            .map(|personnel_id| NewAssignment {
                report_id,
                personnel_id,
            })
            .collect();
        self.insert::<Value, _>("assigned_personnel", &rows).await?;
        Ok(())
    }

    async fn insert_unit(&self, name: &str) -> StoreResult<UnitRow> {
        self.insert_one("units", &serde_json::json!({ "name": name }))
            .await
    }

    async fn update_unit(&self, unit_id: &str, name: &str) -> StoreResult<()> {
        self.patch(
            "units",
            ("id", eq(unit_id)),
            &serde_json::json!({ "name": name }),
        )
        .await
    }

    async fn insert_personnel(&self, payload: &PersonnelPayload) -> StoreResult<PersonnelRow> {
        self.insert_one("personnel", payload).await
    }

    async fn update_personnel(
        &self,
        personnel_id: &str,
        payload: &PersonnelPayload,
    ) -> StoreResult<()> {
        self.patch("personnel", ("id", eq(personnel_id)), payload)
            .await
    }

    async fn invoke(
        &self,
        function: PrivilegedFunction,
        body: Value,
    ) -> StoreResult<Value> {
        let url = format!("{}/functions/v1/{}", self.base_url, function.name());
        debug!("Invoking function {}", function);
        let response = self
            .request(Method::POST, &url)
            .json(&body)
            .send()
            .await?;
        Self::handle_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_message() {
        assert_eq!(
            extract_message(r#"{"code":"PGRST116","message":"JSON object requested"}"#),
            Some("JSON object requested".to_string())
        );
        assert_eq!(
            extract_message(r#"{"error":"Forbidden: Admin access required"}"#),
            Some("Forbidden: Admin access required".to_string())
        );
        assert_eq!(
            extract_message(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#),
            Some("Invalid login credentials".to_string())
        );
        assert_eq!(extract_message("<html>bad gateway</html>"), None);
    }

    #[test]
    fn test_new_trims_base_url() {
        let store = RestStore::new("https://abc.supabase.co/", "anon", 30).unwrap();
        assert_eq!(
            store.table_url("reports"),
            "https://abc.supabase.co/rest/v1/reports"
        );
        assert_eq!(eq("r-1"), "eq.r-1");
    }
}
