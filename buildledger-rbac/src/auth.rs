//! Authenticated user context

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::models::{Feature, Plan, UserRole};
use crate::permissions::{features_for, has_permission};

/// Who is asking, and under which plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// User ID as issued by the auth backend
    pub user_id: Uuid,

    /// Company the user belongs to
    pub company_id: Option<Uuid>,

    /// Role within BuildLedger
    pub role: UserRole,

    /// Subscription plan of the user's company
    pub plan: Plan,

    /// Session information
    pub session_id: Option<String>,
}

impl AuthContext {
    /// Create a new authentication context
    pub fn new(user_id: Uuid, role: UserRole, plan: Plan) -> Self {
        Self {
            user_id,
            company_id: None,
            role,
            plan,
            session_id: None,
        }
    }

    pub fn is_super_admin(&self) -> bool {
        self.role == UserRole::SuperAdmin
    }

    pub fn is_company_owner(&self) -> bool {
        self.role == UserRole::CompanyOwner
    }

    /// Check a feature against the role and plan
    pub fn can(&self, feature: Feature) -> bool {
        self.role.has_full_access() || has_permission(self.plan, feature)
    }

    /// Every feature available to this user
    pub fn effective_features(&self) -> BTreeSet<Feature> {
        if self.role.has_full_access() {
            return Feature::ALL.iter().copied().collect();
        }
        features_for(self.plan)
    }

    /// Switch to a new plan after an upgrade or downgrade
    pub fn change_plan(&mut self, plan: Plan) {
        self.plan = plan;
    }
}

/// Builder for authentication contexts
pub struct AuthContextBuilder {
    context: AuthContext,
}

impl AuthContextBuilder {
    /// Member on the Starter plan until told otherwise
    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            context: AuthContext::new(user_id, UserRole::Member, Plan::Starter),
        }
    }

    pub fn with_role(mut self, role: UserRole) -> Self {
        self.context.role = role;
        self
    }

    pub fn with_plan(mut self, plan: Plan) -> Self {
        self.context.plan = plan;
        self
    }

    pub fn with_company(mut self, company_id: Uuid) -> Self {
        self.context.company_id = Some(company_id);
        self
    }

    pub fn with_session(mut self, session_id: String) -> Self {
        self.context.session_id = Some(session_id);
        self
    }

    pub fn build(self) -> AuthContext {
        self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_context_builder() {
        let user_id = Uuid::new_v4();
        let company_id = Uuid::new_v4();

        let context = AuthContextBuilder::for_user(user_id)
            .with_role(UserRole::CompanyOwner)
            .with_plan(Plan::Pro)
            .with_company(company_id)
            .with_session("sess-1".to_string())
            .build();

        assert_eq!(context.user_id, user_id);
        assert_eq!(context.company_id, Some(company_id));
        assert!(context.is_company_owner());
        assert!(!context.is_super_admin());
        assert_eq!(context.session_id.as_deref(), Some("sess-1"));
    }

    #[test]
    fn test_can_follows_plan() {
        let mut context = AuthContext::new(Uuid::new_v4(), UserRole::Member, Plan::Starter);
        assert!(context.can(Feature::ViewProjects));
        assert!(!context.can(Feature::ViewAnalytics));

        context.change_plan(Plan::Pro);
        assert!(context.can(Feature::ViewAnalytics));
        assert!(!context.can(Feature::ApiAccess));
    }

    #[test]
    fn test_super_admin_has_every_feature() {
        let context = AuthContext::new(Uuid::new_v4(), UserRole::SuperAdmin, Plan::Starter);
        assert_eq!(context.effective_features().len(), Feature::ALL.len());
        assert!(context.can(Feature::AdvancedReporting));
    }

    #[test]
    fn test_context_serializes_role_and_plan_names() {
        let context = AuthContext::new(Uuid::nil(), UserRole::CompanyOwner, Plan::Enterprise);
        let json = serde_json::to_value(&context).unwrap();
        assert_eq!(json["role"], "company_owner");
        assert_eq!(json["plan"], "enterprise");
    }
}
