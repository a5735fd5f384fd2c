//! Auth backend seam

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

use crate::error::SessionResult;

/// User identity as returned by the auth backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: HashMap<String, serde_json::Value>,
}

/// Token bundle for a signed-in user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: AuthUser,
}

impl AuthSession {
    /// Time left on the access token; zero once past expiry
    pub fn expires_in(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).to_std().unwrap_or(Duration::ZERO)
    }

    /// Whether the access token expires within `buffer` of `now`
    pub fn needs_refresh(&self, now: DateTime<Utc>, buffer: Duration) -> bool {
        let buffer = ChronoDuration::from_std(buffer).unwrap_or(ChronoDuration::MAX);
        self.expires_at - now <= buffer
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Operations the session supervisor needs from the hosted auth service
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Validate an access token, `None` if the backend no longer accepts it
    async fn get_user(&self, access_token: &str) -> SessionResult<Option<AuthUser>>;

    /// Exchange a refresh token for a new session
    async fn refresh_session(&self, refresh_token: &str) -> SessionResult<AuthSession>;

    /// Revoke the session server-side
    async fn sign_out(&self, access_token: &str) -> SessionResult<()>;
}
