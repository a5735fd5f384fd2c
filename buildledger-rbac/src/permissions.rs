//! Plan permission table and feature checks

use once_cell::sync::Lazy;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

use crate::{
    auth::AuthContext,
    error::{RbacError, RbacResult},
    limits::{UsageLimits, UsageReport},
    models::{Feature, Plan, UsageCounter, UserRole},
};

/// What a plan declares on top of the plans below it
enum Grant {
    Adds(&'static [Feature]),
    FullAccess,
}

/// Grants each plan adds. The match is exhaustive so a new plan cannot be
/// introduced without deciding its grants.
fn grants(plan: Plan) -> Grant {
    match plan {
        Plan::Starter => Grant::Adds(&[
            Feature::ViewDashboard,
            Feature::ViewProjects,
            Feature::ViewClients,
            Feature::CreateEditClients,
            Feature::ViewItems,
            Feature::CreateEditItems,
            Feature::CreateQuotes,
            Feature::CreateInvoices,
        ]),
        Plan::Pro => Grant::Adds(&[
            Feature::CreateEditProjects,
            Feature::ExportPdf,
            Feature::CustomBranding,
            Feature::ViewAnalytics,
            Feature::TeamManagement,
        ]),
        Plan::Enterprise => Grant::FullAccess,
    }
}

/// Effective access of a single plan
#[derive(Debug, Clone, PartialEq, Eq)]
enum Access {
    Only(BTreeSet<Feature>),
    Full,
}

impl Access {
    fn contains(&self, feature: Feature) -> bool {
        match self {
            Access::Only(features) => features.contains(&feature),
            Access::Full => true,
        }
    }
}

/// Immutable, tier-inclusive permission table
///
/// Each plan's effective set is the union of its own grants and the grants
/// of every lower plan, so Starter ⊆ Pro ⊆ Enterprise holds by construction.
#[derive(Debug)]
pub struct PermissionTable {
    access: [Access; 3],
}

static TABLE: Lazy<PermissionTable> = Lazy::new(PermissionTable::build);

impl PermissionTable {
    fn build() -> Self {
        let mut inherited: BTreeSet<Feature> = BTreeSet::new();
        let mut full = false;

        // Plan::ALL is in tier order, so each entry sees every lower grant
        let access = Plan::ALL.map(|plan| {
            match grants(plan) {
                Grant::Adds(features) => inherited.extend(features.iter().copied()),
                Grant::FullAccess => full = true,
            }

            if full {
                Access::Full
            } else {
                Access::Only(inherited.clone())
            }
        });

        Self { access }
    }

    /// The process-wide table
    pub fn global() -> &'static PermissionTable {
        &TABLE
    }

    pub fn has_permission(&self, plan: Plan, feature: Feature) -> bool {
        self.access[plan.index()].contains(feature)
    }

    pub fn has_full_access(&self, plan: Plan) -> bool {
        matches!(self.access[plan.index()], Access::Full)
    }

    pub fn features_for(&self, plan: Plan) -> BTreeSet<Feature> {
        match &self.access[plan.index()] {
            Access::Only(features) => features.clone(),
            Access::Full => Feature::ALL.iter().copied().collect(),
        }
    }

    /// Lowest plan granting `feature`
    pub fn minimum_plan_for(&self, feature: Feature) -> Plan {
        Plan::ALL
            .iter()
            .copied()
            .find(|plan| self.has_permission(*plan, feature))
            .unwrap_or(Plan::Enterprise)
    }

    /// Feature-by-plan grid in table order
    pub fn matrix(&self) -> Vec<(Feature, [bool; 3])> {
        Feature::ALL
            .iter()
            .map(|feature| {
                (
                    *feature,
                    Plan::ALL.map(|plan| self.has_permission(plan, *feature)),
                )
            })
            .collect()
    }
}

/// Check whether `plan` grants `feature`
pub fn has_permission(plan: Plan, feature: Feature) -> bool {
    PermissionTable::global().has_permission(plan, feature)
}

/// Effective feature set of a plan
pub fn features_for(plan: Plan) -> BTreeSet<Feature> {
    PermissionTable::global().features_for(plan)
}

/// Lowest plan granting `feature`, used for upgrade prompts
pub fn minimum_plan_for(feature: Feature) -> Plan {
    PermissionTable::global().minimum_plan_for(feature)
}

/// Lenient check on raw names as stored by the backend
///
/// Unknown roles or features deny access. They are logged at warn level so
/// a misspelt name shows up instead of silently locking users out.
pub fn has_permission_str(role: &str, feature: &str) -> bool {
    let feature = match feature.parse::<Feature>() {
        Ok(feature) => feature,
        Err(e) => {
            warn!(role, error = %e, "Denying access for unrecognised feature");
            return false;
        }
    };

    if matches!(role.parse::<UserRole>(), Ok(r) if r.has_full_access()) {
        return true;
    }

    match role.parse::<Plan>() {
        Ok(plan) => has_permission(plan, feature),
        Err(e) => {
            warn!(%feature, error = %e, "Denying access for unrecognised role");
            false
        }
    }
}

/// Permission checker combining the static table with configured limits
#[derive(Debug, Clone, Default)]
pub struct PermissionChecker {
    limits: UsageLimits,
}

impl PermissionChecker {
    /// Create a new permission checker
    pub fn new(limits: UsageLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &UsageLimits {
        &self.limits
    }

    /// Check if the user may use a feature
    pub fn check(&self, auth_context: &AuthContext, feature: Feature) -> bool {
        let allowed = auth_context.role.has_full_access()
            || has_permission(auth_context.plan, feature);

        debug!(
            user_id = %auth_context.user_id,
            role = %auth_context.role,
            plan = %auth_context.plan,
            %feature,
            allowed,
            "Feature check"
        );

        allowed
    }

    /// Like [`check`](Self::check) but returns an error naming the plan required
    pub fn require_feature(&self, auth_context: &AuthContext, feature: Feature) -> RbacResult<()> {
        if self.check(auth_context, feature) {
            return Ok(());
        }

        Err(RbacError::FeatureNotInPlan {
            feature,
            plan: auth_context.plan,
            required: minimum_plan_for(feature),
        })
    }

    /// Check whether one more `counter` fits under the user's ceiling
    pub fn within_limit(&self, auth_context: &AuthContext, counter: UsageCounter, current: u64) -> bool {
        auth_context.role.has_full_access()
            || self.limits.is_within_limit(auth_context.plan, counter, current)
    }

    /// Like [`within_limit`](Self::within_limit) but returns an error with the ceiling
    pub fn require_within_limit(
        &self,
        auth_context: &AuthContext,
        counter: UsageCounter,
        current: u64,
    ) -> RbacResult<()> {
        if self.within_limit(auth_context, counter, current) {
            return Ok(());
        }

        let limit = self
            .limits
            .limit_for(auth_context.plan, counter)
            .ceiling()
            .unwrap_or(u64::MAX);

        Err(RbacError::LimitReached {
            counter,
            plan: auth_context.plan,
            current,
            limit,
        })
    }

    /// Usage snapshot for the user's plan
    pub fn usage_report(
        &self,
        auth_context: &AuthContext,
        usage: &HashMap<UsageCounter, u64>,
    ) -> UsageReport {
        if auth_context.role.has_full_access() {
            return UsageReport::build(&self.limits, Plan::Enterprise, usage);
        }
        UsageReport::build(&self.limits, auth_context.plan, usage)
    }

    /// Batch feature check
    pub fn batch_check(&self, auth_context: &AuthContext, features: &[Feature]) -> Vec<bool> {
        features
            .iter()
            .map(|feature| self.check(auth_context, *feature))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthContextBuilder;
    use uuid::Uuid;

    fn allow_list(plan: Plan) -> BTreeSet<Feature> {
        // Hand-written expectations, independent of the table builder
        let starter = [
            Feature::ViewDashboard,
            Feature::ViewProjects,
            Feature::ViewClients,
            Feature::CreateEditClients,
            Feature::ViewItems,
            Feature::CreateEditItems,
            Feature::CreateQuotes,
            Feature::CreateInvoices,
        ];
        let pro_extra = [
            Feature::CreateEditProjects,
            Feature::ExportPdf,
            Feature::CustomBranding,
            Feature::ViewAnalytics,
            Feature::TeamManagement,
        ];

        match plan {
            Plan::Starter => starter.into_iter().collect(),
            Plan::Pro => starter.into_iter().chain(pro_extra).collect(),
            Plan::Enterprise => Feature::ALL.into_iter().collect(),
        }
    }

    #[test]
    fn test_has_permission_matches_allow_list() {
        for plan in [Plan::Starter, Plan::Pro] {
            let expected = allow_list(plan);
            for feature in Feature::ALL {
                assert_eq!(
                    has_permission(plan, feature),
                    expected.contains(&feature),
                    "{} / {}",
                    plan,
                    feature
                );
            }
        }
    }

    #[test]
    fn test_enterprise_has_everything() {
        for feature in Feature::ALL {
            assert!(has_permission(Plan::Enterprise, feature));
        }
        assert!(PermissionTable::global().has_full_access(Plan::Enterprise));
        assert!(!PermissionTable::global().has_full_access(Plan::Pro));
    }

    #[test]
    fn test_tiers_are_monotonic() {
        let starter = features_for(Plan::Starter);
        let pro = features_for(Plan::Pro);
        let enterprise = features_for(Plan::Enterprise);

        assert!(starter.is_subset(&pro));
        assert!(pro.is_subset(&enterprise));
        assert!(starter.len() < pro.len());
    }

    #[test]
    fn test_minimum_plan_for() {
        assert_eq!(minimum_plan_for(Feature::ViewProjects), Plan::Starter);
        assert_eq!(minimum_plan_for(Feature::ViewAnalytics), Plan::Pro);
        assert_eq!(minimum_plan_for(Feature::ApiAccess), Plan::Enterprise);
    }

    #[test]
    fn test_has_permission_str_fails_closed() {
        assert!(has_permission_str("Starter", "view_projects"));
        assert!(!has_permission_str("Starter", "view_analytics"));
        assert!(has_permission_str("pro", "view_analytics"));
        assert!(has_permission_str("Enterprise", "api_access"));
        assert!(has_permission_str("super_admin", "api_access"));

        // Typos and unknown names deny
        assert!(!has_permission_str("Starer", "view_projects"));
        assert!(!has_permission_str("Enterprise", "view_projetcs"));
        assert!(!has_permission_str("", ""));
    }

    #[test]
    fn test_checker_super_admin_bypasses_plan() {
        let checker = PermissionChecker::default();
        let admin = AuthContextBuilder::for_user(Uuid::new_v4())
            .with_role(UserRole::SuperAdmin)
            .with_plan(Plan::Starter)
            .build();

        assert!(checker.check(&admin, Feature::AdvancedReporting));
        assert!(checker.within_limit(&admin, UsageCounter::Clients, 1_000_000));
    }

    #[test]
    fn test_require_feature_names_required_plan() {
        let checker = PermissionChecker::default();
        let owner = AuthContextBuilder::for_user(Uuid::new_v4())
            .with_role(UserRole::CompanyOwner)
            .with_plan(Plan::Starter)
            .build();

        assert!(checker.require_feature(&owner, Feature::CreateQuotes).is_ok());

        let err = checker
            .require_feature(&owner, Feature::CustomBranding)
            .unwrap_err();
        assert_eq!(
            err,
            RbacError::FeatureNotInPlan {
                feature: Feature::CustomBranding,
                plan: Plan::Starter,
                required: Plan::Pro,
            }
        );
        assert!(err.is_denial());
    }

    #[test]
    fn test_require_within_limit() {
        let checker = PermissionChecker::default();
        let member = AuthContextBuilder::for_user(Uuid::new_v4())
            .with_plan(Plan::Starter)
            .build();
        let ceiling = checker
            .limits()
            .limit_for(Plan::Starter, UsageCounter::Projects)
            .ceiling()
            .unwrap();

        assert!(checker
            .require_within_limit(&member, UsageCounter::Projects, ceiling - 1)
            .is_ok());

        let err = checker
            .require_within_limit(&member, UsageCounter::Projects, ceiling)
            .unwrap_err();
        assert!(matches!(err, RbacError::LimitReached { limit, .. } if limit == ceiling));
    }

    #[test]
    fn test_batch_check() {
        let checker = PermissionChecker::default();
        let member = AuthContextBuilder::for_user(Uuid::new_v4())
            .with_plan(Plan::Pro)
            .build();

        let results = checker.batch_check(
            &member,
            &[Feature::ViewAnalytics, Feature::ApiAccess, Feature::ViewClients],
        );
        assert_eq!(results, vec![true, false, true]);
    }

    #[test]
    fn test_matrix_shape() {
        let matrix = PermissionTable::global().matrix();
        assert_eq!(matrix.len(), Feature::ALL.len());

        let (_, row) = matrix
            .iter()
            .find(|(feature, _)| *feature == Feature::ExportPdf)
            .unwrap();
        assert_eq!(row, &[false, true, true]);
    }
}
