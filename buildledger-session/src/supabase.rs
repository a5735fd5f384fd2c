//! Supabase GoTrue client

use async_trait::async_trait;
use buildledger_config::BackendConfig;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, info, warn};

use crate::backend::{AuthBackend, AuthSession, AuthUser};
use crate::error::{SessionError, SessionResult};

/// Token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> SessionResult<AuthSession> {
        let expires_at = match (self.expires_at, self.expires_in) {
            (Some(ts), _) => DateTime::from_timestamp(ts, 0).ok_or_else(|| {
                SessionError::InvalidResponse(format!("expires_at out of range: {}", ts))
            })?,
            (None, Some(secs)) => ChronoDuration::try_seconds(secs)
                .and_then(|ttl| now.checked_add_signed(ttl))
                .ok_or_else(|| {
                    SessionError::InvalidResponse(format!("expires_in out of range: {}", secs))
                })?,
            (None, None) => {
                return Err(SessionError::InvalidResponse(
                    "token response carries no expiry".to_string(),
                ))
            }
        };

        Ok(AuthSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        })
    }
}

/// Auth API client speaking the GoTrue REST protocol
#[derive(Debug, Clone)]
pub struct SupabaseAuthClient {
    client: Client,
    auth_url: String,
    anon_key: String,
}

impl SupabaseAuthClient {
    pub fn new(config: &BackendConfig) -> SessionResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("buildledger/", env!("CARGO_PKG_VERSION")))
            .build()?;

        debug!(
            "Creating auth client for {} with timeout: {}s",
            config.auth_url(),
            config.request_timeout.as_secs()
        );

        Ok(Self {
            client,
            auth_url: config.auth_url(),
            anon_key: config.anon_key.clone(),
        })
    }

    pub fn auth_url(&self) -> &str {
        &self.auth_url
    }

    /// Password sign-in
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> SessionResult<AuthSession> {
        info!("Signing in {}", email);
        let request = self
            .request(self.client.post(format!("{}/token", self.auth_url)))
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }));

        self.token_request(request).await
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header("apikey", &self.anon_key)
    }

    async fn token_request(&self, request: RequestBuilder) -> SessionResult<AuthSession> {
        let response = check_status(request.send().await?).await?;
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| SessionError::InvalidResponse(e.to_string()))?;
        token.into_session(Utc::now())
    }
}

#[async_trait]
impl AuthBackend for SupabaseAuthClient {
    async fn get_user(&self, access_token: &str) -> SessionResult<Option<AuthUser>> {
        let response = self
            .request(self.client.get(format!("{}/user", self.auth_url)))
            .bearer_auth(access_token)
            .send()
            .await?;

        if matches!(response.status(), StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            debug!("Access token rejected by auth backend");
            return Ok(None);
        }

        let user = check_status(response)
            .await?
            .json::<AuthUser>()
            .await
            .map_err(|e| SessionError::InvalidResponse(e.to_string()))?;
        Ok(Some(user))
    }

    async fn refresh_session(&self, refresh_token: &str) -> SessionResult<AuthSession> {
        debug!("Refreshing auth session");
        let request = self
            .request(self.client.post(format!("{}/token", self.auth_url)))
            .query(&[("grant_type", "refresh_token")])
            .json(&json!({ "refresh_token": refresh_token }));

        let session = self.token_request(request).await?;
        info!("Auth session refreshed, expires at {}", session.expires_at);
        Ok(session)
    }

    async fn sign_out(&self, access_token: &str) -> SessionResult<()> {
        let response = self
            .request(self.client.post(format!("{}/logout", self.auth_url)))
            .bearer_auth(access_token)
            .send()
            .await?;

        // An already-revoked token is as good as signed out
        if matches!(response.status(), StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND) {
            warn!("Sign-out for a session the backend no longer knows");
            return Ok(());
        }

        check_status(response).await?;
        info!("Signed out");
        Ok(())
    }
}

/// Turn a non-success response into a backend error
async fn check_status(response: Response) -> SessionResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<JsonValue>(&body)
        .ok()
        .and_then(|value| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|key| value.get(key).and_then(JsonValue::as_str).map(str::to_string))
        })
        .unwrap_or(body);

    Err(SessionError::Backend {
        status: status.as_u16(),
        message,
    })
}
