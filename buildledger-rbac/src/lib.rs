//! Plan-based access control for BuildLedger
//!
//! This crate answers two questions for the rest of the application:
//! - may a user on a given subscription plan use a feature?
//! - is a usage counter (clients, projects, ...) still under the plan's ceiling?
//!
//! The permission table is fixed at build time and tier-inclusive: every
//! plan is granted everything the plans below it are granted. Usage ceilings
//! come from configuration, with Enterprise always unbounded.

pub mod auth;
pub mod error;
pub mod limits;
pub mod models;
pub mod permissions;

pub use auth::{AuthContext, AuthContextBuilder};
pub use error::{RbacError, RbacResult};
pub use limits::{
    is_within_limit, is_within_limit_str, limit_for, limit_for_str, usage_percentage, UsageEntry,
    UsageLimits, UsageReport,
};
pub use models::{Feature, Limit, Plan, UsageCounter, UserRole};
pub use permissions::{
    features_for, has_permission, has_permission_str, minimum_plan_for, PermissionChecker,
    PermissionTable,
};
