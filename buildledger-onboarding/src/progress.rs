//! Checklist steps and the progress reducer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::OnboardingError;

/// Checklist steps, in the order they are suggested
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    CompanyProfile,
    Branding,
    FirstClient,
    FirstItem,
    FirstQuote,
    FirstInvoice,
}

impl OnboardingStep {
    pub const ALL: [OnboardingStep; 6] = [
        OnboardingStep::CompanyProfile,
        OnboardingStep::Branding,
        OnboardingStep::FirstClient,
        OnboardingStep::FirstItem,
        OnboardingStep::FirstQuote,
        OnboardingStep::FirstInvoice,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OnboardingStep::CompanyProfile => "company_profile",
            OnboardingStep::Branding => "branding",
            OnboardingStep::FirstClient => "first_client",
            OnboardingStep::FirstItem => "first_item",
            OnboardingStep::FirstQuote => "first_quote",
            OnboardingStep::FirstInvoice => "first_invoice",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            OnboardingStep::CompanyProfile => "Complete your company profile",
            OnboardingStep::Branding => "Upload your logo and brand colours",
            OnboardingStep::FirstClient => "Add your first client",
            OnboardingStep::FirstItem => "Add an item to your catalogue",
            OnboardingStep::FirstQuote => "Send your first quote",
            OnboardingStep::FirstInvoice => "Send your first invoice",
        }
    }
}

impl fmt::Display for OnboardingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OnboardingStep {
    type Err = OnboardingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .iter()
            .copied()
            .find(|step| step.as_str() == normalized)
            .ok_or_else(|| OnboardingError::UnknownStep(s.to_string()))
    }
}

/// Changes a user can make to their checklist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnboardingAction {
    CompleteStep(OnboardingStep),
    SkipStep(OnboardingStep),
    /// Hide the checklist without finishing it
    Dismiss,
    Reset,
}

/// Checklist state for one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingProgress {
    pub user_id: String,
    #[serde(default)]
    pub completed: BTreeSet<OnboardingStep>,
    #[serde(default)]
    pub skipped: BTreeSet<OnboardingStep>,
    #[serde(default)]
    pub dismissed: bool,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl OnboardingProgress {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            completed: BTreeSet::new(),
            skipped: BTreeSet::new(),
            dismissed: false,
            updated_at: None,
        }
    }

    /// Apply an action; returns whether anything changed
    pub fn apply(&mut self, action: OnboardingAction) -> bool {
        self.apply_at(action, Utc::now())
    }

    pub fn apply_at(&mut self, action: OnboardingAction, now: DateTime<Utc>) -> bool {
        let changed = match action {
            OnboardingAction::CompleteStep(step) => {
                let was_skipped = self.skipped.remove(&step);
                self.completed.insert(step) || was_skipped
            }
            // A completed step stays completed
            OnboardingAction::SkipStep(step) => {
                !self.completed.contains(&step) && self.skipped.insert(step)
            }
            OnboardingAction::Dismiss => !std::mem::replace(&mut self.dismissed, true),
            OnboardingAction::Reset => {
                let changed =
                    !self.completed.is_empty() || !self.skipped.is_empty() || self.dismissed;
                self.completed.clear();
                self.skipped.clear();
                self.dismissed = false;
                changed
            }
        };

        if changed {
            self.updated_at = Some(now);
        }
        changed
    }

    pub fn is_completed(&self, step: OnboardingStep) -> bool {
        self.completed.contains(&step)
    }

    pub fn is_skipped(&self, step: OnboardingStep) -> bool {
        self.skipped.contains(&step)
    }

    /// Completed steps as a whole percentage; skipped steps do not count
    pub fn completion_percentage(&self) -> u8 {
        (self.completed.len() * 100 / OnboardingStep::ALL.len()) as u8
    }

    /// First step neither completed nor skipped
    pub fn next_step(&self) -> Option<OnboardingStep> {
        OnboardingStep::ALL
            .iter()
            .copied()
            .find(|step| !self.completed.contains(step) && !self.skipped.contains(step))
    }

    /// Every step has been completed or skipped
    pub fn is_complete(&self) -> bool {
        self.next_step().is_none()
    }

    /// Whether the checklist should still be shown
    pub fn is_visible(&self) -> bool {
        !self.dismissed && !self.is_complete()
    }
}
