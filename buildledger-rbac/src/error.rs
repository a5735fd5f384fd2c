//! Error types for access control operations

use thiserror::Error;

use crate::models::{Feature, Plan, UsageCounter};

/// Result type for RBAC operations
pub type RbacResult<T> = Result<T, RbacError>;

/// RBAC-specific errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RbacError {
    /// Plan name not recognised
    #[error("Unknown plan: {name}")]
    UnknownPlan { name: String },

    /// Role name not recognised
    #[error("Unknown role: {name}")]
    UnknownRole { name: String },

    /// Feature flag not recognised
    #[error("Unknown feature: {name}")]
    UnknownFeature { name: String },

    /// Usage counter not recognised
    #[error("Unknown usage counter: {name}")]
    UnknownCounter { name: String },

    /// Feature requires a higher plan
    #[error("Feature {feature} is not included in the {plan} plan (requires {required})")]
    FeatureNotInPlan {
        feature: Feature,
        plan: Plan,
        required: Plan,
    },

    /// Usage counter is at or above its ceiling
    #[error("{counter} limit reached for the {plan} plan ({current}/{limit})")]
    LimitReached {
        counter: UsageCounter,
        plan: Plan,
        current: u64,
        limit: u64,
    },
}

impl RbacError {
    /// Check if this error denies access (as opposed to a bad input)
    pub fn is_denial(&self) -> bool {
        matches!(self, Self::FeatureNotInPlan { .. } | Self::LimitReached { .. })
    }
}
