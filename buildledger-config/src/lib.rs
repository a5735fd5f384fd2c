//! Domain-driven configuration management for BuildLedger
//!
//! Configuration is split by functional domain (session, plan limits,
//! backend, logging, onboarding), each with its own defaults and
//! validation, and can be overridden from `BUILDLEDGER_*` environment
//! variables.

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use validation::Validatable;

// Re-export domain configurations
pub use domains::{
    backend::BackendConfig,
    limits::{LimitsConfig, PlanLimits},
    logging::{LogFormat, LogLevel, LoggingConfig},
    onboarding::OnboardingConfig,
    session::{SessionConfig, MAX_SESSION_DURATION},
    BuildLedgerConfig,
};

// Re-export utilities
pub use domains::utils::serde_duration;
