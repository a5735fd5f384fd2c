//! Session monitoring configuration

use crate::error::ConfigResult;
use crate::validation::{validate_max_duration, validate_positive_duration, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound for every session duration
pub const MAX_SESSION_DURATION: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Idle timeout, warning and token refresh settings for an authenticated session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Inactivity after which the session is force-signed-out
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_idle_timeout"
    )]
    pub idle_timeout: Duration,

    /// How long before the idle timeout the warning is raised
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_warning_lead"
    )]
    pub warning_lead: Duration,

    /// Period of the recurring idle/refresh check
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_check_interval"
    )]
    pub check_interval: Duration,

    /// Refresh the auth token once it expires within this window
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_refresh_buffer"
    )]
    pub refresh_buffer: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout: default_idle_timeout(),
            warning_lead: default_warning_lead(),
            check_interval: default_check_interval(),
            refresh_buffer: default_refresh_buffer(),
        }
    }
}

impl SessionConfig {
    /// Production settings: the defaults
    pub fn production() -> Self {
        Self::default()
    }

    /// Development settings with a long idle window
    pub fn development() -> Self {
        Self {
            idle_timeout: Duration::from_secs(8 * 60 * 60),
            warning_lead: Duration::from_secs(10 * 60),
            check_interval: Duration::from_secs(60),
            refresh_buffer: default_refresh_buffer(),
        }
    }

    /// Strict settings for shared devices
    pub fn strict() -> Self {
        Self {
            idle_timeout: Duration::from_secs(10 * 60),
            warning_lead: Duration::from_secs(2 * 60),
            check_interval: Duration::from_secs(15),
            refresh_buffer: default_refresh_buffer(),
        }
    }

    /// Idle time after which the warning is shown
    pub fn warning_after(&self) -> Duration {
        self.idle_timeout.saturating_sub(self.warning_lead)
    }
}

impl Validatable for SessionConfig {
    fn validate(&self) -> ConfigResult<()> {
        for (value, field) in [
            (self.idle_timeout, "idle_timeout"),
            (self.warning_lead, "warning_lead"),
            (self.check_interval, "check_interval"),
            (self.refresh_buffer, "refresh_buffer"),
        ] {
            validate_positive_duration(value, field, self.domain_name())?;
            validate_max_duration(value, MAX_SESSION_DURATION, field, self.domain_name())?;
        }

        if self.warning_lead >= self.idle_timeout {
            return Err(self.validation_error(format!(
                "warning_lead ({}s) must be shorter than idle_timeout ({}s)",
                self.warning_lead.as_secs(),
                self.idle_timeout.as_secs()
            )));
        }

        if self.check_interval > self.warning_lead {
            log::warn!(
                "session check_interval ({}s) exceeds warning_lead ({}s); the warning may be skipped",
                self.check_interval.as_secs(),
                self.warning_lead.as_secs()
            );
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "session"
    }
}

fn default_idle_timeout() -> Duration {
    Duration::from_secs(30 * 60)
}

fn default_warning_lead() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_check_interval() -> Duration {
    Duration::from_secs(30)
}

fn default_refresh_buffer() -> Duration {
    Duration::from_secs(5 * 60)
}
