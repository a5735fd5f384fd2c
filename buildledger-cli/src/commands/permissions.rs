//! `buildledger permissions ...`

use anyhow::Result;
use buildledger_rbac::{
    features_for, minimum_plan_for, AuthContextBuilder, Feature, PermissionChecker, PermissionTable,
    Plan, UserRole,
};
use colored::Colorize;
use std::fmt::Write;
use tracing::info;
use uuid::Uuid;

use super::mark;
use crate::cli::PermissionsCommands;

pub fn run(cmd: &PermissionsCommands, checker: &PermissionChecker) -> Result<()> {
    match cmd {
        PermissionsCommands::Check {
            plan,
            feature,
            role,
        } => {
            info!("Checking {} for {} ({})", feature, plan, role);
            print!("{}", render_check(checker, *plan, *feature, *role));
        }
        PermissionsCommands::List { plan } => print!("{}", render_list(*plan)),
        PermissionsCommands::Matrix => print!("{}", render_matrix()),
    }
    Ok(())
}

fn render_check(checker: &PermissionChecker, plan: Plan, feature: Feature, role: UserRole) -> String {
    let context = AuthContextBuilder::for_user(Uuid::nil())
        .with_plan(plan)
        .with_role(role)
        .build();

    match checker.require_feature(&context, feature) {
        Ok(()) => format!("{} {} is available on the {} plan\n", mark(true), feature, plan),
        Err(e) => format!("{} {}\n", mark(false), e),
    }
}

fn render_list(plan: Plan) -> String {
    let mut out = format!("{} plan features:\n", plan.to_string().bold());
    for feature in features_for(plan) {
        let _ = writeln!(out, "  {}", feature);
    }
    out
}

fn render_matrix() -> String {
    let table = PermissionTable::global();
    let mut out = format!("{:<24}", "feature".bold());
    for plan in Plan::ALL {
        let _ = write!(out, " {:^12}", plan.to_string().bold());
    }
    out.push('\n');

    for (feature, row) in table.matrix() {
        let _ = write!(out, "{:<24}", feature.as_str());
        for allowed in row {
            let _ = write!(out, " {:^12}", mark(allowed));
        }
        let _ = writeln!(out, "  (from {})", minimum_plan_for(feature).as_str().dimmed());
    }
    out
}
