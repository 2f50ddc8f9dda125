//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.reskrim.toml` files.

use crate::analysis::{calendar, AnalyticsOptions};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = ".reskrim.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Remote store connection.
    #[serde(default)]
    pub store: StoreConfig,

    /// Sign-in defaults.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Analytics settings.
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Page sizes of the tables.
    #[serde(default)]
    pub listing: ListingConfig,

    /// Spreadsheet export settings.
    #[serde(default)]
    pub export: ExportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Where the theme and the session are kept between runs.
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
            verbose: false,
        }
    }
}

fn default_state_file() -> PathBuf {
    PathBuf::from(".reskrim_state.toml")
}

/// Remote store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the hosted platform.
    #[serde(default)]
    pub url: String,

    /// Public (anonymous) API key.
    #[serde(default)]
    pub anon_key: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Email used by `login` when none is given.
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Offset in hours used to bucket reports into calendar months (WIT).
    #[serde(default = "default_utc_offset")]
    pub utc_offset_hours: i32,

    /// Length of unit, personnel and vehicle-type rankings.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Length of the dashboard's case-type ranking.
    #[serde(default = "default_top_case_types")]
    pub top_case_types: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: default_utc_offset(),
            top_n: default_top_n(),
            top_case_types: default_top_case_types(),
        }
    }
}

fn default_utc_offset() -> i32 {
    9
}

fn default_top_n() -> usize {
    5
}

fn default_top_case_types() -> usize {
    7
}

impl AnalyticsConfig {
    pub fn options(&self) -> AnalyticsOptions {
        AnalyticsOptions {
            utc_offset: calendar::utc_offset(self.utc_offset_hours),
            top_n: self.top_n,
            top_case_types: self.top_case_types,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    #[serde(default = "default_reports_per_page")]
    pub reports_per_page: usize,

    #[serde(default = "default_vehicles_per_page")]
    pub vehicles_per_page: usize,

    #[serde(default = "default_personnel_per_page")]
    pub personnel_per_page: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            reports_per_page: default_reports_per_page(),
            vehicles_per_page: default_vehicles_per_page(),
            personnel_per_page: default_personnel_per_page(),
        }
    }
}

fn default_reports_per_page() -> usize {
    20
}

fn default_vehicles_per_page() -> usize {
    15
}

fn default_personnel_per_page() -> usize {
    15
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory spreadsheets are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments (and their environment fallbacks) take precedence over
    /// config file settings, but only when given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref url) = args.url {
            self.store.url = url.clone();
        }
        if let Some(ref anon_key) = args.anon_key {
            self.store.anon_key = anon_key.clone();
        }
        if let Some(timeout) = args.timeout {
            self.store.timeout_seconds = timeout;
        }
        if let Some(ref state_file) = args.state_file {
            self.general.state_file = state_file.clone();
        }
        if let Some(hours) = args.utc_offset {
            self.analytics.utc_offset_hours = hours;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Store URL and key, or an error naming what is missing.
    pub fn store_endpoint(&self) -> Result<(&str, &str)> {
        if self.store.url.trim().is_empty() {
            anyhow::bail!(
                "Store URL not configured. Set RESKRIM_URL, pass --url or add [store] url to {}",
                CONFIG_FILE
            );
        }
        if self.store.anon_key.trim().is_empty() {
            anyhow::bail!(
                "Store API key not configured. Set RESKRIM_ANON_KEY, pass --anon-key or add [store] anon_key to {}",
                CONFIG_FILE
            );
        }
        Ok((&self.store.url, &self.store.anon_key))
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.analytics.utc_offset_hours, 9);
        assert_eq!(config.analytics.top_n, 5);
        assert_eq!(config.analytics.top_case_types, 7);
        assert_eq!(config.listing.reports_per_page, 20);
        assert_eq!(config.listing.vehicles_per_page, 15);
        assert_eq!(config.listing.personnel_per_page, 15);
        assert_eq!(config.store.timeout_seconds, 30);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
verbose = true

[store]
url = "https://kasus.example.co"
anon_key = "public-key"

[auth]
email = "admin@polresta.id"

[analytics]
utc_offset_hours = 7
top_n = 3

[listing]
reports_per_page = 50
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert!(config.general.verbose);
        assert_eq!(config.store.url, "https://kasus.example.co");
        assert_eq!(config.auth.email.as_deref(), Some("admin@polresta.id"));
        assert_eq!(config.analytics.utc_offset_hours, 7);
        assert_eq!(config.analytics.top_n, 3);
        assert_eq!(config.analytics.top_case_types, 7);
        assert_eq!(config.listing.reports_per_page, 50);
        assert_eq!(config.listing.vehicles_per_page, 15);
        assert_eq!(config.store.timeout_seconds, 30);
    }

    #[test]
    fn test_analytics_options() {
        let options = AnalyticsConfig::default().options();
        assert_eq!(options.utc_offset.local_minus_utc(), 9 * 3600);
        assert_eq!(options.top_case_types, 7);
    }

    #[test]
    fn test_store_endpoint_requires_url_and_key() {
        let mut config = Config::default();
        assert!(config.store_endpoint().is_err());

        config.store.url = "https://kasus.example.co".to_string();
        assert!(config.store_endpoint().is_err());

        config.store.anon_key = "public-key".to_string();
        assert_eq!(
            config.store_endpoint().unwrap(),
            ("https://kasus.example.co", "public-key")
        );
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[store]"));
        assert!(toml_str.contains("[analytics]"));
        assert!(toml_str.contains("[listing]"));
    }
}
