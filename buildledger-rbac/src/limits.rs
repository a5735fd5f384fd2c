//! Usage ceilings per plan

use buildledger_config::{LimitsConfig, PlanLimits};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use tracing::warn;

use crate::models::{Limit, Plan, UsageCounter, UserRole};

/// Percentage at which a counter is reported as nearly exhausted
pub const DEFAULT_NEAR_LIMIT_PERCENT: f64 = 80.0;

static DEFAULT_LIMITS: Lazy<UsageLimits> = Lazy::new(UsageLimits::default);

/// Plan × counter ceilings, fixed once loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageLimits {
    starter: PlanLimits,
    pro: PlanLimits,
}

impl Default for UsageLimits {
    fn default() -> Self {
        Self::from_config(&LimitsConfig::default())
    }
}

impl UsageLimits {
    pub fn from_config(config: &LimitsConfig) -> Self {
        Self {
            starter: config.starter,
            pro: config.pro,
        }
    }

    pub fn limit_for(&self, plan: Plan, counter: UsageCounter) -> Limit {
        let limits = match plan {
            Plan::Starter => &self.starter,
            Plan::Pro => &self.pro,
            Plan::Enterprise => return Limit::Unlimited,
        };

        Limit::Limited(match counter {
            UsageCounter::Clients => limits.clients,
            UsageCounter::Projects => limits.projects,
            UsageCounter::Items => limits.items,
            UsageCounter::QuotesPerMonth => limits.quotes_per_month,
            UsageCounter::InvoicesPerMonth => limits.invoices_per_month,
            UsageCounter::TeamMembers => limits.team_members,
        })
    }

    /// `current` is strictly below the ceiling
    pub fn is_within_limit(&self, plan: Plan, counter: UsageCounter, current: u64) -> bool {
        self.limit_for(plan, counter).allows(current)
    }

    /// Share of the ceiling used, clamped to 100; `None` when unbounded
    pub fn usage_percentage(&self, plan: Plan, counter: UsageCounter, current: u64) -> Option<f64> {
        match self.limit_for(plan, counter) {
            Limit::Unlimited => None,
            Limit::Limited(0) => Some(100.0),
            Limit::Limited(max) => Some((current as f64 / max as f64 * 100.0).min(100.0)),
        }
    }

    /// Units left before the ceiling; `None` when unbounded
    pub fn remaining(&self, plan: Plan, counter: UsageCounter, current: u64) -> Option<u64> {
        self.limit_for(plan, counter)
            .ceiling()
            .map(|max| max.saturating_sub(current))
    }
}

/// Ceiling under the default limits
pub fn limit_for(plan: Plan, counter: UsageCounter) -> Limit {
    DEFAULT_LIMITS.limit_for(plan, counter)
}

/// Whether `current` is still within the default ceiling
pub fn is_within_limit(plan: Plan, counter: UsageCounter, current: u64) -> bool {
    DEFAULT_LIMITS.is_within_limit(plan, counter, current)
}

/// Percentage of the default ceiling in use
pub fn usage_percentage(plan: Plan, counter: UsageCounter, current: u64) -> Option<f64> {
    DEFAULT_LIMITS.usage_percentage(plan, counter, current)
}

/// Lenient ceiling lookup on raw names; unknown names give a ceiling of 0
pub fn limit_for_str(role: &str, counter: &str) -> Limit {
    if matches!(role.parse::<UserRole>(), Ok(r) if r.has_full_access()) {
        return Limit::Unlimited;
    }

    let plan = match role.parse::<Plan>() {
        Ok(plan) => plan,
        Err(e) => {
            warn!(counter, error = %e, "Unrecognised role in limit lookup");
            return Limit::Limited(0);
        }
    };

    if plan == Plan::Enterprise {
        return Limit::Unlimited;
    }

    match counter.parse::<UsageCounter>() {
        Ok(counter) => limit_for(plan, counter),
        Err(e) => {
            warn!(%plan, error = %e, "Unrecognised usage counter in limit lookup");
            Limit::Limited(0)
        }
    }
}

/// Lenient limit check on raw names
///
/// Enterprise (and super admins) are always within limits; otherwise an
/// unknown role or counter has a ceiling of 0 and is never within it.
pub fn is_within_limit_str(role: &str, counter: &str, current: u64) -> bool {
    limit_for_str(role, counter).allows(current)
}

/// Usage of a single counter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageEntry {
    pub counter: UsageCounter,
    pub used: u64,
    pub limit: Limit,
    pub percentage: Option<f64>,
    pub remaining: Option<u64>,
}

impl UsageEntry {
    pub fn at_limit(&self) -> bool {
        !self.limit.allows(self.used)
    }

    pub fn near_limit(&self, threshold_percent: f64) -> bool {
        self.percentage.is_some_and(|p| p >= threshold_percent)
    }
}

/// Usage snapshot of every counter for one plan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageReport {
    pub plan: Plan,
    pub entries: Vec<UsageEntry>,
}

impl UsageReport {
    /// Build a report; counters missing from `usage` count as 0
    pub fn build(limits: &UsageLimits, plan: Plan, usage: &HashMap<UsageCounter, u64>) -> Self {
        let entries = UsageCounter::ALL
            .iter()
            .map(|counter| {
                let used = usage.get(counter).copied().unwrap_or(0);
                UsageEntry {
                    counter: *counter,
                    used,
                    limit: limits.limit_for(plan, *counter),
                    percentage: limits.usage_percentage(plan, *counter, used),
                    remaining: limits.remaining(plan, *counter, used),
                }
            })
            .collect();

        Self { plan, entries }
    }

    pub fn entry(&self, counter: UsageCounter) -> Option<&UsageEntry> {
        self.entries.iter().find(|e| e.counter == counter)
    }

    /// Counters at or above `threshold_percent` of their ceiling
    pub fn near_limit(&self, threshold_percent: f64) -> Vec<&UsageEntry> {
        self.entries
            .iter()
            .filter(|e| e.near_limit(threshold_percent))
            .collect()
    }

    /// Counters that no longer accept another unit
    pub fn at_limit(&self) -> Vec<&UsageEntry> {
        self.entries.iter().filter(|e| e.at_limit()).collect()
    }
}
