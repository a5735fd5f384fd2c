use anyhow::{Context, Result};
use buildledger_config::{BuildLedgerConfig, ConfigLoader, LogLevel};
use buildledger_onboarding::{FileProgressStore, OnboardingTracker};
use buildledger_rbac::{PermissionChecker, UsageLimits};
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info, warn};

mod cli;
mod commands;

use cli::{Cli, Commands};

/// Load configuration from file or environment
fn load_config(config_path: Option<&PathBuf>) -> Result<BuildLedgerConfig> {
    let loader = ConfigLoader::new();

    match config_path {
        Some(path) => {
            if path.exists() {
                info!("Loading configuration from: {:?}", path);
                loader
                    .from_file(path)
                    .context(format!("Failed to load configuration from {:?}", path))
            } else {
                warn!("Configuration file not found: {:?}. Using defaults.", path);
                loader
                    .from_env()
                    .context("Failed to load configuration from environment")
            }
        }
        None => {
            debug!("No configuration file specified. Loading from environment or defaults.");
            loader
                .from_env()
                .context("Failed to load configuration from environment")
        }
    }
}

/// Initialize logging from configuration with fallback to simple tracing
fn init_logging(config: &BuildLedgerConfig, log_level: Option<&String>) -> Result<()> {
    // CLI log level overrides the configured one
    let mut logging_config = config.logging.clone();
    if let Some(level_str) = log_level {
        match level_str.parse::<LogLevel>() {
            Ok(level) => logging_config.level = level,
            Err(e) => eprintln!("{}, keeping '{}'", e, logging_config.level),
        }
    }

    if let Err(e) = buildledger_logging::init_logging_from_config(&logging_config) {
        eprintln!(
            "Failed to initialize structured logging: {}, falling back to simple tracing",
            e
        );
        buildledger_logging::init_simple_tracing(&logging_config.level.to_string())?;
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_ref())?;
    init_logging(&config, cli.log_level.as_ref())?;

    debug!("BuildLedger CLI starting");

    match &cli.command {
        Commands::Permissions { permissions_cmd } => {
            let checker = PermissionChecker::new(UsageLimits::from_config(&config.limits));
            commands::permissions::run(permissions_cmd, &checker)
        }
        Commands::Limits { limits_cmd } => {
            commands::limits::run(limits_cmd, &UsageLimits::from_config(&config.limits))
        }
        Commands::Session { session_cmd } => commands::session::run(session_cmd, &config).await,
        Commands::Onboarding { onboarding_cmd } => {
            let tracker = OnboardingTracker::new(FileProgressStore::from_config(&config.onboarding));
            commands::onboarding::run(onboarding_cmd, &tracker).await
        }
        Commands::Config { config_cmd } => commands::config::run(config_cmd, &config),
    }
}
