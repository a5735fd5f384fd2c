//! `buildledger limits ...`

use anyhow::Result;
use buildledger_rbac::{Limit, Plan, UsageCounter, UsageLimits, UsageReport};
use colored::Colorize;
use std::collections::HashMap;
use std::fmt::Write;

use super::mark;
use crate::cli::LimitsCommands;

pub fn run(cmd: &LimitsCommands, limits: &UsageLimits) -> Result<()> {
    match cmd {
        LimitsCommands::Check {
            plan,
            counter,
            count,
        } => print!("{}", render_check(limits, *plan, *counter, *count)),
        LimitsCommands::Report {
            plan,
            usage,
            warn_at,
        } => {
            let usage: HashMap<UsageCounter, u64> = usage.iter().copied().collect();
            let report = UsageReport::build(limits, *plan, &usage);
            print!("{}", render_report(&report, *warn_at));
        }
    }
    Ok(())
}

fn render_check(limits: &UsageLimits, plan: Plan, counter: UsageCounter, count: u64) -> String {
    let limit = limits.limit_for(plan, counter);
    let within = limits.is_within_limit(plan, counter, count);

    let detail = match limits.remaining(plan, counter, count) {
        Some(remaining) => format!("{}/{} used, {} remaining", count, limit, remaining),
        None => format!("{} used, no limit", count),
    };

    if within {
        format!("{} {} can be added on the {} plan ({})\n", mark(true), counter, plan, detail)
    } else {
        format!("{} {} limit reached on the {} plan ({})\n", mark(false), counter, plan, detail)
    }
}

fn render_report(report: &UsageReport, warn_at: f64) -> String {
    let mut out = format!("{} plan usage:\n", report.plan.to_string().bold());

    for entry in &report.entries {
        let percent = entry
            .percentage
            .map(|p| format!("{:>5.1}%", p))
            .unwrap_or_else(|| "     -".to_string());

        let status = if entry.at_limit() {
            "at limit".red().to_string()
        } else if entry.near_limit(warn_at) {
            "near limit".yellow().to_string()
        } else {
            String::new()
        };

        let limit = match entry.limit {
            Limit::Unlimited => "∞".to_string(),
            Limit::Limited(max) => max.to_string(),
        };

        let _ = writeln!(
            out,
            "  {:<20} {:>8} / {:<8} {} {}",
            entry.counter.as_str(),
            entry.used,
            limit,
            percent,
            status
        );
    }
    out
}
