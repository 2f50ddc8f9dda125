//! Local state persisted between runs: the colour theme and the session.

use crate::store::Session;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub theme: Theme,

    /// Current sign-in, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<Session>,
}

impl Preferences {
    /// Load the state file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize state")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write state file: {}", path.display()))
    }

    pub fn sign_out(&mut self) -> Option<Session> {
        self.session.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn session() -> Session {
        Session {
            access_token: "jwt".to_string(),
            refresh_token: "refresh".to_string(),
            user_id: "user-1".to_string(),
            email: "admin@polresta.id".to_string(),
            expires_at: Utc.with_ymd_and_hms(2024, 6, 1, 1, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_missing_file_defaults_to_light() {
        let dir = TempDir::new().unwrap();
        let prefs = Preferences::load(&dir.path().join("state.toml")).unwrap();
        assert_eq!(prefs.theme, Theme::Light);
        assert!(prefs.session.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("state.toml");

        let prefs = Preferences {
            theme: Theme::Light.toggled(),
            session: Some(session()),
        };
        prefs.save(&path).unwrap();

        let loaded = Preferences::load(&path).unwrap();
        assert_eq!(loaded, prefs);
        assert_eq!(loaded.theme, Theme::Dark);
    }

    #[test]
    fn test_sign_out_clears_session() {
        let mut prefs = Preferences {
            session: Some(session()),
            ..Default::default()
        };
        assert!(prefs.sign_out().is_some());
        assert!(prefs.session.is_none());
        assert!(prefs.sign_out().is_none());
    }
}
