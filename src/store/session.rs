//! Authenticated session returned by the password sign-in endpoint.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A signed-in session. Persisted between runs in the state file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Token endpoint response body.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
    pub user: TokenUser,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

fn default_expires_in() -> i64 {
    3600
}

impl TokenResponse {
    pub fn into_session(self, email: &str, now: DateTime<Utc>) -> Session {
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            user_id: self.user.id,
            email: self.user.email.unwrap_or_else(|| email.to_string()),
            expires_at: now + Duration::seconds(self.expires_in),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_token_response_into_session() {
        let body = serde_json::json!({
            "access_token": "jwt",
            "token_type": "bearer",
            "expires_in": 60,
            "refresh_token": "refresh",
            "user": {"id": "user-1", "email": "admin@polresta.id"}
        });
        let token: TokenResponse = serde_json::from_value(body).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let session = token.into_session("fallback@polresta.id", now);

        assert_eq!(session.user_id, "user-1");
        assert_eq!(session.email, "admin@polresta.id");
        assert!(!session.is_expired(now));
        assert!(session.is_expired(now + Duration::seconds(60)));
    }
}
