//! Hosted auth backend configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive_duration, validate_url, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection settings for the Supabase project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Project URL, e.g. `https://<ref>.supabase.co`
    #[serde(default = "default_url")]
    pub url: String,

    /// Public anon key sent as the `apikey` header
    #[serde(default)]
    pub anon_key: String,

    /// Per-request timeout
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_request_timeout"
    )]
    pub request_timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            anon_key: String::new(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl BackendConfig {
    /// Base URL of the GoTrue auth API
    pub fn auth_url(&self) -> String {
        format!("{}/auth/v1", self.url.trim_end_matches('/'))
    }
}

impl Validatable for BackendConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_url(&self.url, "url", self.domain_name())?;
        validate_positive_duration(self.request_timeout, "request_timeout", self.domain_name())?;

        if self.anon_key.is_empty() {
            log::warn!("backend.anon_key is empty; requests to the auth API will be rejected");
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "backend"
    }
}

// Supabase CLI local stack
fn default_url() -> String {
    "http://localhost:54321".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}
