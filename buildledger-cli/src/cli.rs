//! CLI argument parsing definitions

use buildledger_onboarding::OnboardingStep;
use buildledger_rbac::{Feature, Plan, UsageCounter, UserRole};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Feature access per plan
    Permissions {
        #[command(subcommand)]
        permissions_cmd: PermissionsCommands,
    },

    /// Usage ceilings per plan
    Limits {
        #[command(subcommand)]
        limits_cmd: LimitsCommands,
    },

    /// Idle session behaviour and auth tokens
    Session {
        #[command(subcommand)]
        session_cmd: SessionCommands,
    },

    /// Onboarding checklist progress
    Onboarding {
        #[command(subcommand)]
        onboarding_cmd: OnboardingCommands,
    },

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        config_cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum PermissionsCommands {
    /// Check whether a plan includes a feature
    Check {
        #[arg(long, value_name = "PLAN")]
        plan: Plan,

        #[arg(long, value_name = "FEATURE")]
        feature: Feature,

        /// Role of the user (super_admin bypasses plan checks)
        #[arg(long, value_name = "ROLE", default_value = "member")]
        role: UserRole,
    },

    /// List the features a plan includes
    List {
        #[arg(long, value_name = "PLAN")]
        plan: Plan,
    },

    /// Print the feature × plan matrix
    Matrix,
}

#[derive(Subcommand)]
pub enum LimitsCommands {
    /// Check whether one more unit fits under a plan's ceiling
    Check {
        #[arg(long, value_name = "PLAN")]
        plan: Plan,

        #[arg(long, value_name = "COUNTER")]
        counter: UsageCounter,

        /// Units currently in use
        #[arg(long, value_name = "N")]
        count: u64,
    },

    /// Usage report for a plan
    Report {
        #[arg(long, value_name = "PLAN")]
        plan: Plan,

        /// Current usage as counter=n, repeatable (example: --usage clients=12)
        #[arg(long, value_name = "COUNTER=N", value_parser = parse_usage)]
        usage: Vec<(UsageCounter, u64)>,

        /// Percentage at which a counter is flagged as near its limit
        #[arg(long, value_name = "PERCENT", default_value_t = buildledger_rbac::limits::DEFAULT_NEAR_LIMIT_PERCENT)]
        warn_at: f64,
    },
}

#[derive(Subcommand)]
pub enum SessionCommands {
    /// Show the state of a session idle for the given time
    Simulate {
        /// Seconds since the last activity
        #[arg(long, value_name = "SECS")]
        idle: u64,
    },

    /// Ask the auth backend whether an access token is still accepted
    Check {
        #[arg(long, value_name = "TOKEN", env = "BUILDLEDGER_ACCESS_TOKEN")]
        access_token: String,
    },

    /// Exchange a refresh token for a new session
    Refresh {
        #[arg(long, value_name = "TOKEN", env = "BUILDLEDGER_REFRESH_TOKEN")]
        refresh_token: String,
    },
}

#[derive(Subcommand)]
pub enum OnboardingCommands {
    /// Show a user's checklist
    Show {
        #[arg(long, value_name = "USER")]
        user: String,
    },

    /// Mark a step as done
    Complete {
        #[arg(long, value_name = "USER")]
        user: String,

        #[arg(long, value_name = "STEP")]
        step: OnboardingStep,
    },

    /// Skip a step
    Skip {
        #[arg(long, value_name = "USER")]
        user: String,

        #[arg(long, value_name = "STEP")]
        step: OnboardingStep,
    },

    /// Hide the checklist
    Dismiss {
        #[arg(long, value_name = "USER")]
        user: String,
    },

    /// Start the checklist over
    Reset {
        #[arg(long, value_name = "USER")]
        user: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        #[arg(long, value_name = "PATH")]
        config_file: PathBuf,
    },

    /// Write a sample configuration file
    Generate {
        /// Output file path
        #[arg(long, value_name = "PATH")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },

    /// Show current configuration in use
    Show {
        /// Output format: yaml, json
        #[arg(long, value_name = "FORMAT", default_value = "yaml")]
        format: String,
    },
}

/// Parse `counter=n`
fn parse_usage(s: &str) -> Result<(UsageCounter, u64), String> {
    let (counter, count) = s
        .split_once('=')
        .ok_or_else(|| format!("expected COUNTER=N, got '{}'", s))?;
    let counter = counter.parse::<UsageCounter>().map_err(|e| e.to_string())?;
    let count = count
        .trim()
        .parse::<u64>()
        .map_err(|e| format!("invalid count '{}': {}", count, e))?;
    Ok((counter, count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_usage() {
        assert_eq!(parse_usage("clients=12").unwrap(), (UsageCounter::Clients, 12));
        assert!(parse_usage("clients").is_err());
        assert!(parse_usage("widgets=1").is_err());
        assert!(parse_usage("clients=-1").is_err());
    }

    #[test]
    fn test_permissions_check_args() {
        let cli = Cli::try_parse_from([
            "buildledger",
            "--log-level",
            "debug",
            "permissions",
            "check",
            "--plan",
            "pro",
            "--feature",
            "export_pdf",
        ])
        .unwrap();

        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        match cli.command {
            Commands::Permissions {
                permissions_cmd: PermissionsCommands::Check { plan, feature, role },
            } => {
                assert_eq!(plan, Plan::Pro);
                assert_eq!(feature, Feature::ExportPdf);
                assert_eq!(role, UserRole::Member);
            }
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn test_unknown_plan_is_rejected() {
        let result = Cli::try_parse_from([
            "buildledger",
            "permissions",
            "list",
            "--plan",
            "platinum",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_limits_report_args() {
        let cli = Cli::try_parse_from([
            "buildledger",
            "limits",
            "report",
            "--plan",
            "starter",
            "--usage",
            "clients=20",
            "--usage",
            "projects=2",
        ])
        .unwrap();

        match cli.command {
            Commands::Limits {
                limits_cmd: LimitsCommands::Report { plan, usage, warn_at },
            } => {
                assert_eq!(plan, Plan::Starter);
                assert_eq!(usage, vec![(UsageCounter::Clients, 20), (UsageCounter::Projects, 2)]);
                assert_eq!(warn_at, 80.0);
            }
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn test_onboarding_step_arg() {
        let cli = Cli::try_parse_from([
            "buildledger",
            "onboarding",
            "complete",
            "--user",
            "u1",
            "--step",
            "first-invoice",
        ])
        .unwrap();

        assert!(matches!(
            cli.command,
            Commands::Onboarding {
                onboarding_cmd: OnboardingCommands::Complete {
                    step: OnboardingStep::FirstInvoice,
                    ..
                }
            }
        ));
    }
}
