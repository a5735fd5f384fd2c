//! Data models for plan-based access control

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RbacError;

/// Subscription plan, ordered from least to most capable
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    Starter,
    Pro,
    Enterprise,
}

impl Plan {
    /// All plans in tier order
    pub const ALL: [Plan; 3] = [Plan::Starter, Plan::Pro, Plan::Enterprise];

    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Starter => "starter",
            Plan::Pro => "pro",
            Plan::Enterprise => "enterprise",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Plan::Starter => "Starter",
            Plan::Pro => "Pro",
            Plan::Enterprise => "Enterprise",
        }
    }

    /// Position in the tier ordering
    pub(crate) fn index(&self) -> usize {
        match self {
            Plan::Starter => 0,
            Plan::Pro => 1,
            Plan::Enterprise => 2,
        }
    }

    /// Plans strictly below this one
    pub fn lower_tiers(&self) -> &'static [Plan] {
        &Plan::ALL[..self.index()]
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Plan {
    type Err = RbacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "starter" => Ok(Plan::Starter),
            "pro" => Ok(Plan::Pro),
            "enterprise" => Ok(Plan::Enterprise),
            _ => Err(RbacError::UnknownPlan {
                name: s.to_string(),
            }),
        }
    }
}

/// Role of a user within BuildLedger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Platform operator, unrestricted regardless of plan
    SuperAdmin,
    /// Owner of a company account
    CompanyOwner,
    /// Any other member of a company
    #[default]
    Member,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::SuperAdmin => "super_admin",
            UserRole::CompanyOwner => "company_owner",
            UserRole::Member => "member",
        }
    }

    pub fn has_full_access(&self) -> bool {
        matches!(self, UserRole::SuperAdmin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = RbacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "super_admin" | "superadmin" | "admin" => Ok(UserRole::SuperAdmin),
            "company_owner" | "owner" => Ok(UserRole::CompanyOwner),
            "member" | "user" => Ok(UserRole::Member),
            _ => Err(RbacError::UnknownRole {
                name: s.to_string(),
            }),
        }
    }
}

/// Capability gated by plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    ViewDashboard,
    ViewProjects,
    CreateEditProjects,
    ViewClients,
    CreateEditClients,
    ViewItems,
    CreateEditItems,
    CreateQuotes,
    CreateInvoices,
    ExportPdf,
    CustomBranding,
    ViewAnalytics,
    TeamManagement,
    ApiAccess,
    PrioritySupport,
    AdvancedReporting,
}

impl Feature {
    pub const ALL: [Feature; 16] = [
        Feature::ViewDashboard,
        Feature::ViewProjects,
        Feature::CreateEditProjects,
        Feature::ViewClients,
        Feature::CreateEditClients,
        Feature::ViewItems,
        Feature::CreateEditItems,
        Feature::CreateQuotes,
        Feature::CreateInvoices,
        Feature::ExportPdf,
        Feature::CustomBranding,
        Feature::ViewAnalytics,
        Feature::TeamManagement,
        Feature::ApiAccess,
        Feature::PrioritySupport,
        Feature::AdvancedReporting,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::ViewDashboard => "view_dashboard",
            Feature::ViewProjects => "view_projects",
            Feature::CreateEditProjects => "create_edit_projects",
            Feature::ViewClients => "view_clients",
            Feature::CreateEditClients => "create_edit_clients",
            Feature::ViewItems => "view_items",
            Feature::CreateEditItems => "create_edit_items",
            Feature::CreateQuotes => "create_quotes",
            Feature::CreateInvoices => "create_invoices",
            Feature::ExportPdf => "export_pdf",
            Feature::CustomBranding => "custom_branding",
            Feature::ViewAnalytics => "view_analytics",
            Feature::TeamManagement => "team_management",
            Feature::ApiAccess => "api_access",
            Feature::PrioritySupport => "priority_support",
            Feature::AdvancedReporting => "advanced_reporting",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feature {
    type Err = RbacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Feature::ALL
            .iter()
            .copied()
            .find(|feature| feature.as_str() == wanted)
            .ok_or_else(|| RbacError::UnknownFeature {
                name: s.to_string(),
            })
    }
}

/// Counted resource subject to a plan ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageCounter {
    Clients,
    Projects,
    Items,
    QuotesPerMonth,
    InvoicesPerMonth,
    TeamMembers,
}

impl UsageCounter {
    pub const ALL: [UsageCounter; 6] = [
        UsageCounter::Clients,
        UsageCounter::Projects,
        UsageCounter::Items,
        UsageCounter::QuotesPerMonth,
        UsageCounter::InvoicesPerMonth,
        UsageCounter::TeamMembers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UsageCounter::Clients => "clients",
            UsageCounter::Projects => "projects",
            UsageCounter::Items => "items",
            UsageCounter::QuotesPerMonth => "quotes_per_month",
            UsageCounter::InvoicesPerMonth => "invoices_per_month",
            UsageCounter::TeamMembers => "team_members",
        }
    }
}

impl fmt::Display for UsageCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UsageCounter {
    type Err = RbacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        UsageCounter::ALL
            .iter()
            .copied()
            .find(|counter| counter.as_str() == wanted)
            .ok_or_else(|| RbacError::UnknownCounter {
                name: s.to_string(),
            })
    }
}

/// Ceiling for a usage counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Limit {
    Limited(u64),
    Unlimited,
}

impl Limit {
    /// Whether `current` is still strictly below the ceiling
    pub fn allows(&self, current: u64) -> bool {
        match self {
            Limit::Limited(max) => current < *max,
            Limit::Unlimited => true,
        }
    }

    /// Ceiling value, `None` when unbounded
    pub fn ceiling(&self) -> Option<u64> {
        match self {
            Limit::Limited(max) => Some(*max),
            Limit::Unlimited => None,
        }
    }

    pub fn is_unlimited(&self) -> bool {
        matches!(self, Limit::Unlimited)
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::Limited(max) => write!(f, "{}", max),
            Limit::Unlimited => f.write_str("unlimited"),
        }
    }
}
