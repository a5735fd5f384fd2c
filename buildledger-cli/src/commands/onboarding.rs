//! `buildledger onboarding ...`

use anyhow::{Context, Result};
use buildledger_onboarding::{
    OnboardingAction, OnboardingProgress, OnboardingStep, OnboardingTracker, ProgressStore,
};
use colored::Colorize;
use std::fmt::Write;

use crate::cli::OnboardingCommands;

pub async fn run<S: ProgressStore>(cmd: &OnboardingCommands, tracker: &OnboardingTracker<S>) -> Result<()> {
    let progress = match cmd {
        OnboardingCommands::Show { user } => tracker.progress(user).await,
        OnboardingCommands::Complete { user, step } => {
            tracker.dispatch(user, OnboardingAction::CompleteStep(*step)).await
        }
        OnboardingCommands::Skip { user, step } => {
            tracker.dispatch(user, OnboardingAction::SkipStep(*step)).await
        }
        OnboardingCommands::Dismiss { user } => {
            tracker.dispatch(user, OnboardingAction::Dismiss).await
        }
        OnboardingCommands::Reset { user } => tracker.dispatch(user, OnboardingAction::Reset).await,
    }
    .context("Failed to update onboarding progress")?;

    print!("{}", render_progress(&progress));
    Ok(())
}

fn render_progress(progress: &OnboardingProgress) -> String {
    let mut out = format!(
        "Onboarding for {}: {}% complete{}\n",
        progress.user_id,
        progress.completion_percentage(),
        if progress.dismissed { " (dismissed)" } else { "" }
    );

    let next = progress.next_step();
    for step in OnboardingStep::ALL {
        let marker = if progress.is_completed(step) {
            "[x]".green()
        } else if progress.is_skipped(step) {
            "[-]".dimmed()
        } else {
            "[ ]".normal()
        };
        let pointer = if next == Some(step) { " <- next" } else { "" };
        let _ = writeln!(out, "  {} {:<16} {}{}", marker, step.as_str(), step.title(), pointer);
    }
    out
}
