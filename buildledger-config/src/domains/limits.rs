//! Per-plan usage ceilings
//!
//! Enterprise is unbounded and has no entry here; only the Starter and Pro
//! ceilings can be tuned.

use crate::error::ConfigResult;
use crate::validation::{validate_not_below, Validatable};
use serde::{Deserialize, Serialize};

/// Usage limits configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    #[serde(default = "PlanLimits::starter")]
    pub starter: PlanLimits,

    #[serde(default = "PlanLimits::pro")]
    pub pro: PlanLimits,
}

/// Ceilings for a single plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanLimits {
    pub clients: u64,
    pub projects: u64,
    pub items: u64,
    pub quotes_per_month: u64,
    pub invoices_per_month: u64,
    pub team_members: u64,
}

impl PlanLimits {
    pub fn starter() -> Self {
        Self {
            clients: 25,
            projects: 10,
            items: 100,
            quotes_per_month: 20,
            invoices_per_month: 20,
            team_members: 1,
        }
    }

    pub fn pro() -> Self {
        Self {
            clients: 500,
            projects: 100,
            items: 2000,
            quotes_per_month: 500,
            invoices_per_month: 500,
            team_members: 10,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            starter: PlanLimits::starter(),
            pro: PlanLimits::pro(),
        }
    }
}

impl Validatable for LimitsConfig {
    fn validate(&self) -> ConfigResult<()> {
        let domain = self.domain_name();
        let (s, p) = (&self.starter, &self.pro);

        validate_not_below(p.clients, s.clients, "clients", domain)?;
        validate_not_below(p.projects, s.projects, "projects", domain)?;
        validate_not_below(p.items, s.items, "items", domain)?;
        validate_not_below(p.quotes_per_month, s.quotes_per_month, "quotes_per_month", domain)?;
        validate_not_below(
            p.invoices_per_month,
            s.invoices_per_month,
            "invoices_per_month",
            domain,
        )?;
        validate_not_below(p.team_members, s.team_members, "team_members", domain)?;

        if s.team_members == 0 {
            return Err(self.validation_error("starter.team_members must allow the owner"));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "limits"
    }
}
