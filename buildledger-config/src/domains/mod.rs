//! Domain-specific configuration modules

pub mod backend;
pub mod limits;
pub mod logging;
pub mod onboarding;
pub mod session;
pub mod utils;

use crate::error::ConfigResult;
use serde::{Deserialize, Serialize};

/// Main BuildLedger configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BuildLedgerConfig {
    /// Idle session monitoring and token refresh
    #[serde(default)]
    pub session: session::SessionConfig,

    /// Per-plan usage ceilings
    #[serde(default)]
    pub limits: limits::LimitsConfig,

    /// Hosted auth backend connection
    #[serde(default)]
    pub backend: backend::BackendConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: logging::LoggingConfig,

    /// Onboarding progress storage
    #[serde(default)]
    pub onboarding: onboarding::OnboardingConfig,
}

impl BuildLedgerConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        crate::validation::validate_config(self)
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let config = BuildLedgerConfig::default();
        serde_yaml::to_string(&config)
            .unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}
