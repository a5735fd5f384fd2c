//! `buildledger session ...`

use anyhow::{Context, Result};
use buildledger_config::BuildLedgerConfig;
use buildledger_session::{
    AuthBackend, SessionConfig, SessionMonitor, SessionState, SupabaseAuthClient,
};
use colored::Colorize;
use std::fmt::Write;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

use crate::cli::SessionCommands;

pub async fn run(cmd: &SessionCommands, config: &BuildLedgerConfig) -> Result<()> {
    match cmd {
        SessionCommands::Simulate { idle } => {
            print!("{}", render_simulation(&config.session, Duration::from_secs(*idle)));
        }
        SessionCommands::Check { access_token } => {
            let client = SupabaseAuthClient::new(&config.backend)
                .context("Failed to create auth client")?;
            match client.get_user(access_token).await? {
                Some(user) => println!(
                    "{} token accepted for {} ({})",
                    "✓".green(),
                    user.email.as_deref().unwrap_or("<no email>"),
                    user.id
                ),
                None => println!("{} token rejected, sign in again", "✗".red()),
            }
        }
        SessionCommands::Refresh { refresh_token } => {
            let client = SupabaseAuthClient::new(&config.backend)
                .context("Failed to create auth client")?;
            let session = client
                .refresh_session(refresh_token)
                .await
                .context("Failed to refresh session")?;
            info!(user_id = %session.user.id, "Session refreshed");
            println!(
                "{}",
                serde_json::to_string_pretty(&session).context("Failed to serialize session")?
            );
        }
    }
    Ok(())
}

fn render_simulation(config: &SessionConfig, idle: Duration) -> String {
    // Past the timeout every idle time evaluates the same
    let start = Instant::now();
    let now = start + idle.min(config.idle_timeout);
    let mut monitor = SessionMonitor::new(config, start);
    monitor.evaluate(now);

    let state = match monitor.state() {
        SessionState::Active => "active".green(),
        SessionState::Warning => "warning".yellow(),
        SessionState::Expired => "expired".red(),
    };

    let mut out = String::new();
    let _ = writeln!(out, "Idle for {}s: {}", idle.as_secs(), state.bold());
    let _ = writeln!(
        out,
        "  warning after {}s, sign-out after {}s",
        config.warning_after().as_secs(),
        config.idle_timeout.as_secs()
    );
    match monitor.state() {
        SessionState::Expired => {
            let _ = writeln!(out, "  session would be signed out");
        }
        _ => {
            let _ = writeln!(
                out,
                "  {}s until sign-out",
                monitor.time_until_expiry(now).as_secs()
            );
        }
    }
    out
}
