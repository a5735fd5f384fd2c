//! Configuration validation traits and utilities

use crate::error::{ConfigError, ConfigResult};
use std::time::Duration;

/// Trait for validatable configuration
pub trait Validatable {
    /// Validate the configuration
    fn validate(&self) -> ConfigResult<()>;

    /// Get the domain name for error reporting
    fn domain_name(&self) -> &'static str;

    /// Helper to create a domain-specific validation error
    fn validation_error(&self, message: impl Into<String>) -> ConfigError {
        ConfigError::DomainError {
            domain: self.domain_name().to_string(),
            message: message.into(),
        }
    }
}

/// Validate a required string field
pub fn validate_required_string(value: &str, field_name: &str, domain: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} cannot be empty", field_name),
        });
    }
    Ok(())
}

/// Validate a non-zero duration
pub fn validate_positive_duration(value: Duration, field_name: &str, domain: &str) -> ConfigResult<()> {
    if value.is_zero() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} must be greater than 0 seconds", field_name),
        });
    }
    Ok(())
}

/// Validate a duration against an upper bound
pub fn validate_max_duration(
    value: Duration,
    max: Duration,
    field_name: &str,
    domain: &str,
) -> ConfigResult<()> {
    if value > max {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!(
                "{} must be at most {} seconds, got {}",
                field_name,
                max.as_secs(),
                value.as_secs()
            ),
        });
    }
    Ok(())
}

/// Validate an http(s) URL
pub fn validate_url(url: &str, field_name: &str, domain: &str) -> ConfigResult<()> {
    if url.is_empty() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} cannot be empty", field_name),
        });
    }

    let parsed = url::Url::parse(url).map_err(|e| ConfigError::DomainError {
        domain: domain.to_string(),
        message: format!("{} has invalid URL format: {}", field_name, e),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} scheme '{}' not allowed (only http/https)", field_name, scheme),
        }),
    }
}

/// Validate that a higher tier's value does not fall below a lower tier's
pub fn validate_not_below(
    higher: u64,
    lower: u64,
    field_name: &str,
    domain: &str,
) -> ConfigResult<()> {
    if higher < lower {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!(
                "{} must not decrease across tiers ({} < {})",
                field_name, higher, lower
            ),
        });
    }
    Ok(())
}

/// Validate a complete configuration object
pub fn validate_config(config: &crate::domains::BuildLedgerConfig) -> ConfigResult<()> {
    config.session.validate()?;
    config.limits.validate()?;
    config.backend.validate()?;
    config.logging.validate()?;
    config.onboarding.validate()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://abc.supabase.co", "url", "backend").is_ok());
        assert!(validate_url("http://localhost:54321", "url", "backend").is_ok());
        assert!(validate_url("", "url", "backend").is_err());
        assert!(validate_url("not a url", "url", "backend").is_err());
        assert!(validate_url("ftp://example.com", "url", "backend").is_err());
    }

    #[test]
    fn test_validate_not_below() {
        assert!(validate_not_below(10, 5, "clients", "limits").is_ok());
        assert!(validate_not_below(5, 5, "clients", "limits").is_ok());

        let err = validate_not_below(4, 5, "clients", "limits").unwrap_err();
        assert!(err.to_string().contains("clients"));
    }

    #[test]
    fn test_validate_max_duration() {
        let day = Duration::from_secs(86_400);
        assert!(validate_max_duration(day, day, "idle_timeout", "session").is_ok());

        let err = validate_max_duration(Duration::MAX, day, "idle_timeout", "session").unwrap_err();
        assert!(err.to_string().contains("at most 86400 seconds"));
    }

    #[test]
    fn test_validate_required_string_rejects_whitespace() {
        assert!(validate_required_string("   ", "anon_key", "backend").is_err());
        assert!(validate_required_string("key", "anon_key", "backend").is_ok());
    }
}
