//! Progress persistence

use async_trait::async_trait;
use buildledger_config::OnboardingConfig;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{OnboardingError, OnboardingResult};
use crate::progress::{OnboardingAction, OnboardingProgress};

/// Key-value persistence of onboarding progress
///
/// A missing entry loads as fresh progress. So does an unreadable one,
/// with a warning.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn load(&self, user_id: &str) -> OnboardingResult<OnboardingProgress>;

    async fn save(&self, progress: &OnboardingProgress) -> OnboardingResult<()>;

    async fn clear(&self, user_id: &str) -> OnboardingResult<()>;
}

fn check_user_id(user_id: &str) -> OnboardingResult<()> {
    if user_id.trim().is_empty()
        || user_id
            .chars()
            .any(|c| c == '/' || c == '\\' || c == '.' || c.is_control())
    {
        return Err(OnboardingError::InvalidUserId(user_id.to_string()));
    }
    Ok(())
}

fn decode(user_id: &str, raw: &str) -> OnboardingProgress {
    match serde_json::from_str::<OnboardingProgress>(raw) {
        Ok(progress) if progress.user_id == user_id => progress,
        Ok(progress) => {
            warn!(
                user_id,
                stored_user_id = %progress.user_id,
                "Stored onboarding progress belongs to another user, starting fresh"
            );
            OnboardingProgress::new(user_id)
        }
        Err(e) => {
            warn!(user_id, error = %e, "Corrupt onboarding progress, starting fresh");
            OnboardingProgress::new(user_id)
        }
    }
}

/// One JSON document per user under a directory
#[derive(Debug, Clone)]
pub struct FileProgressStore {
    dir: PathBuf,
    key_prefix: String,
}

impl FileProgressStore {
    pub fn new(dir: impl Into<PathBuf>, key_prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            key_prefix: key_prefix.into(),
        }
    }

    pub fn from_config(config: &OnboardingConfig) -> Self {
        Self::new(config.storage_dir.clone(), config.key_prefix.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, user_id: &str) -> PathBuf {
        self.dir.join(format!("{}{}.json", self.key_prefix, user_id))
    }
}

#[async_trait]
impl ProgressStore for FileProgressStore {
    async fn load(&self, user_id: &str) -> OnboardingResult<OnboardingProgress> {
        check_user_id(user_id)?;
        let path = self.path_for(user_id);

        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => Ok(decode(user_id, &raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No onboarding progress stored");
                Ok(OnboardingProgress::new(user_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, progress: &OnboardingProgress) -> OnboardingResult<()> {
        check_user_id(&progress.user_id)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(&progress.user_id);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(progress)?).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!(path = %path.display(), "Saved onboarding progress");
        Ok(())
    }

    async fn clear(&self, user_id: &str) -> OnboardingResult<()> {
        check_user_id(user_id)?;
        match tokio::fs::remove_file(self.path_for(user_id)).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// In-process store holding the serialized documents
#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw document as-is
    pub async fn insert_raw(&self, user_id: &str, raw: impl Into<String>) {
        self.entries
            .write()
            .await
            .insert(user_id.to_string(), raw.into());
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
    async fn load(&self, user_id: &str) -> OnboardingResult<OnboardingProgress> {
        check_user_id(user_id)?;
        Ok(match self.entries.read().await.get(user_id) {
            Some(raw) => decode(user_id, raw),
            None => OnboardingProgress::new(user_id),
        })
    }

    async fn save(&self, progress: &OnboardingProgress) -> OnboardingResult<()> {
        check_user_id(&progress.user_id)?;
        let raw = serde_json::to_string(progress)?;
        self.entries
            .write()
            .await
            .insert(progress.user_id.clone(), raw);
        Ok(())
    }

    async fn clear(&self, user_id: &str) -> OnboardingResult<()> {
        check_user_id(user_id)?;
        self.entries.write().await.remove(user_id);
        Ok(())
    }
}

/// Load, apply, save
pub struct OnboardingTracker<S: ProgressStore> {
    store: S,
}

impl<S: ProgressStore> OnboardingTracker<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn progress(&self, user_id: &str) -> OnboardingResult<OnboardingProgress> {
        self.store.load(user_id).await
    }

    /// Apply an action and persist the result if it changed anything
    pub async fn dispatch(
        &self,
        user_id: &str,
        action: OnboardingAction,
    ) -> OnboardingResult<OnboardingProgress> {
        let mut progress = self.store.load(user_id).await?;

        if progress.apply(action) {
            debug!(user_id, ?action, "Onboarding progress updated");
            self.store.save(&progress).await?;
        }

        Ok(progress)
    }

    /// Forget everything stored for the user
    pub async fn forget(&self, user_id: &str) -> OnboardingResult<()> {
        self.store.clear(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::OnboardingStep;

    #[test]
    fn test_user_id_rules() {
        assert!(check_user_id("7b1c9a52-3c1e-4a55-9a0c-2f1f7e1f2a10").is_ok());
        assert!(check_user_id("").is_err());
        assert!(check_user_id("   ").is_err());
        assert!(check_user_id("../etc").is_err());
        assert!(check_user_id("a/b").is_err());
    }

    #[tokio::test]
    async fn test_memory_store_missing_and_corrupt() {
        let store = MemoryProgressStore::new();
        assert_eq!(store.load("u1").await.unwrap(), OnboardingProgress::new("u1"));

        store.insert_raw("u1", "{not json").await;
        assert_eq!(store.load("u1").await.unwrap(), OnboardingProgress::new("u1"));

        // A document for a different user is ignored
        let other = serde_json::to_string(&OnboardingProgress::new("u2")).unwrap();
        store.insert_raw("u1", other).await;
        assert_eq!(store.load("u1").await.unwrap().user_id, "u1");
    }

    #[tokio::test]
    async fn test_tracker_with_memory_store() {
        let tracker = OnboardingTracker::new(MemoryProgressStore::new());

        let progress = tracker
            .dispatch("u1", OnboardingAction::CompleteStep(OnboardingStep::CompanyProfile))
            .await
            .unwrap();
        assert_eq!(progress.next_step(), Some(OnboardingStep::Branding));
        assert_eq!(tracker.store().len().await, 1);

        // No-op actions are not written
        tracker.forget("u1").await.unwrap();
        tracker.dispatch("u1", OnboardingAction::Reset).await.unwrap();
        assert!(tracker.store().is_empty().await);
    }
}
