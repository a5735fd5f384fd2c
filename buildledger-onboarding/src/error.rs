//! Onboarding error types

use thiserror::Error;

/// Result type for onboarding operations
pub type OnboardingResult<T> = Result<T, OnboardingError>;

#[derive(Debug, Error)]
pub enum OnboardingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid user id '{0}'")]
    InvalidUserId(String),

    #[error("Unknown onboarding step '{0}'")]
    UnknownStep(String),
}
