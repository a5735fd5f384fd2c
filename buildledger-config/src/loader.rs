//! Configuration loading and environment variable handling

use crate::domains::BuildLedgerConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "BUILDLEDGER".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<BuildLedgerConfig> {
        let content = std::fs::read_to_string(path)?;
        let mut config: BuildLedgerConfig = serde_yaml::from_str(&content)?;

        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<BuildLedgerConfig> {
        let mut config = BuildLedgerConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<BuildLedgerConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut BuildLedgerConfig) -> ConfigResult<()> {
        self.apply_session_overrides(&mut config.session)?;
        self.apply_backend_overrides(&mut config.backend)?;
        self.apply_logging_overrides(&mut config.logging)?;
        self.apply_onboarding_overrides(&mut config.onboarding);
        Ok(())
    }

    /// Apply session config overrides
    fn apply_session_overrides(
        &self,
        config: &mut crate::domains::session::SessionConfig,
    ) -> ConfigResult<()> {
        if let Some(d) = self.get_env_seconds("SESSION_IDLE_TIMEOUT")? {
            config.idle_timeout = d;
        }

        if let Some(d) = self.get_env_seconds("SESSION_WARNING_LEAD")? {
            config.warning_lead = d;
        }

        if let Some(d) = self.get_env_seconds("SESSION_CHECK_INTERVAL")? {
            config.check_interval = d;
        }

        if let Some(d) = self.get_env_seconds("SESSION_REFRESH_BUFFER")? {
            config.refresh_buffer = d;
        }

        Ok(())
    }

    /// Apply backend config overrides
    fn apply_backend_overrides(
        &self,
        config: &mut crate::domains::backend::BackendConfig,
    ) -> ConfigResult<()> {
        if let Ok(url) = self.get_env_var("SUPABASE_URL") {
            config.url = url;
        }

        if let Ok(key) = self.get_env_var("SUPABASE_ANON_KEY") {
            config.anon_key = key;
        }

        if let Some(d) = self.get_env_seconds("BACKEND_TIMEOUT")? {
            config.request_timeout = d;
        }

        Ok(())
    }

    /// Apply logging config overrides
    fn apply_logging_overrides(
        &self,
        config: &mut crate::domains::logging::LoggingConfig,
    ) -> ConfigResult<()> {
        if let Ok(log_level) = self.get_env_var("LOG_LEVEL") {
            config.level = crate::domains::logging::LogLevel::from_str(&log_level)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_LEVEL: {}", log_level)))?;
        }

        if let Ok(format) = self.get_env_var("LOG_FORMAT") {
            config.format = crate::domains::logging::LogFormat::from_str(&format)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_FORMAT: {}", format)))?;
        }

        Ok(())
    }

    /// Apply onboarding config overrides
    fn apply_onboarding_overrides(&self, config: &mut crate::domains::onboarding::OnboardingConfig) {
        if let Ok(dir) = self.get_env_var("ONBOARDING_DIR") {
            config.storage_dir = PathBuf::from(dir);
        }
    }

    /// Parse a prefixed variable holding whole seconds
    fn get_env_seconds(&self, name: &str) -> ConfigResult<Option<Duration>> {
        match self.get_env_var(name) {
            Ok(value) => {
                let seconds: u64 = value
                    .parse()
                    .map_err(|e| ConfigError::EnvError(format!("Invalid {}: {}", name, e)))?;
                Ok(Some(Duration::from_secs(seconds)))
            }
            Err(_) => Ok(None),
        }
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
