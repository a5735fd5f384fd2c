//! Onboarding checklist for new BuildLedger companies
//!
//! Progress is a small per-user document updated by a reducer
//! ([`OnboardingProgress::apply`]) and persisted through a [`ProgressStore`].

pub mod error;
pub mod progress;
pub mod store;

pub use error::{OnboardingError, OnboardingResult};
pub use progress::{OnboardingAction, OnboardingProgress, OnboardingStep};
pub use store::{FileProgressStore, MemoryProgressStore, OnboardingTracker, ProgressStore};
