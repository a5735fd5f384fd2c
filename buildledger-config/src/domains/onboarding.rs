//! Onboarding progress storage configuration

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where per-user onboarding progress is kept
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnboardingConfig {
    /// Directory holding one JSON document per user key
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    /// Storage key prefix; the user id is appended
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for OnboardingConfig {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            key_prefix: default_key_prefix(),
        }
    }
}

impl OnboardingConfig {
    /// Storage key for a user
    pub fn key_for(&self, user_id: &str) -> String {
        format!("{}{}", self.key_prefix, user_id)
    }
}

impl Validatable for OnboardingConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.key_prefix, "key_prefix", self.domain_name())?;

        if self
            .key_prefix
            .chars()
            .any(|c| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
        {
            return Err(self.validation_error(
                "key_prefix can only contain alphanumeric characters, underscores, and hyphens",
            ));
        }

        if self.storage_dir.as_os_str().is_empty() {
            return Err(self.validation_error("storage_dir cannot be empty"));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "onboarding"
    }
}

fn default_storage_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("buildledger")
        .join("onboarding")
}

fn default_key_prefix() -> String {
    "buildledger_onboarding_".to_string()
}
