use std::collections::HashMap;
use std::sync::Arc;

use phrase_core::Clock;
use phrase_core::model::{ListKey, ProgressState};
use storage::repository::{ProgressRecord, ProgressRepository};

use crate::error::ProgressError;

/// Write-through cache of per-list playback progress.
///
/// Everything is read once in [`load`](Self::load); afterwards reads come
/// from memory and every write is persisted before it returns.
pub struct ProgressTracker {
    repo: Arc<dyn ProgressRepository>,
    clock: Clock,
    cache: HashMap<ListKey, ProgressState>,
    current: Option<ListKey>,
}

impl ProgressTracker {
    /// Read all persisted progress.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if the repository cannot be read.
    pub async fn load(repo: Arc<dyn ProgressRepository>, clock: Clock) -> Result<Self, ProgressError> {
        let cache = repo
            .list_progress()
            .await?
            .into_iter()
            .map(|record| (record.list_key, record.state))
            .collect();
        let current = repo.current_list().await?;
        Ok(Self {
            repo,
            clock,
            cache,
            current,
        })
    }

    #[must_use]
    pub fn get_index(&self, key: &ListKey) -> usize {
        self.snapshot(key).index
    }

    #[must_use]
    pub fn get_repeat(&self, key: &ListKey) -> u32 {
        self.snapshot(key).current_repeat
    }

    /// Stored progress for `key`, or the start of the list.
    #[must_use]
    pub fn snapshot(&self, key: &ListKey) -> ProgressState {
        self.cache.get(key).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn current_key(&self) -> Option<&ListKey> {
        self.current.as_ref()
    }

    /// Update the cursor for `key` and persist it.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if the write fails. The in-memory value is
    /// updated regardless.
    pub async fn set_progress(
        &mut self,
        key: &ListKey,
        repeat: u32,
        index: usize,
    ) -> Result<(), ProgressError> {
        let state = ProgressState::new(index, repeat);
        self.cache.insert(key.clone(), state);
        self.repo
            .save_progress(&ProgressRecord {
                list_key: key.clone(),
                state,
                updated_at: self.clock.now(),
            })
            .await?;
        Ok(())
    }

    /// Record `key` as the current list. Returns true when it differs from
    /// the previous one. Progress of other lists is kept.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if the new key cannot be persisted.
    pub async fn invalidate_if_list_changed(&mut self, key: &ListKey) -> Result<bool, ProgressError> {
        if self.current.as_ref() == Some(key) {
            return Ok(false);
        }
        self.current = Some(key.clone());
        self.repo.set_current_list(key).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phrase_core::model::PlayOrder;
    use phrase_core::time::fixed_clock;
    use storage::repository::InMemoryRepository;

    fn key(count: usize) -> ListKey {
        ListKey::new("all", PlayOrder::Sequential, count)
    }

    #[tokio::test]
    async fn unknown_key_defaults_to_start() {
        let repo = Arc::new(InMemoryRepository::new());
        let tracker = ProgressTracker::load(repo, fixed_clock()).await.unwrap();
        assert_eq!(tracker.get_index(&key(3)), 0);
        assert_eq!(tracker.get_repeat(&key(3)), 0);
        assert!(tracker.current_key().is_none());
    }

    #[tokio::test]
    async fn set_progress_writes_through() {
        let repo = Arc::new(InMemoryRepository::new());
        let mut tracker = ProgressTracker::load(repo.clone(), fixed_clock())
            .await
            .unwrap();
        tracker.set_progress(&key(10), 2, 7).await.unwrap();
        assert_eq!(tracker.snapshot(&key(10)), ProgressState::new(7, 2));

        let stored = repo.get_progress(&key(10)).await.unwrap().unwrap();
        assert_eq!(stored.state, ProgressState::new(7, 2));
        assert_eq!(stored.updated_at, fixed_clock().now());

        let reloaded = ProgressTracker::load(repo, fixed_clock()).await.unwrap();
        assert_eq!(reloaded.get_index(&key(10)), 7);
    }

    #[tokio::test]
    async fn list_change_keeps_other_progress() {
        let repo = Arc::new(InMemoryRepository::new());
        let mut tracker = ProgressTracker::load(repo.clone(), fixed_clock())
            .await
            .unwrap();
        assert!(tracker.invalidate_if_list_changed(&key(10)).await.unwrap());
        tracker.set_progress(&key(10), 0, 4).await.unwrap();

        assert!(!tracker.invalidate_if_list_changed(&key(10)).await.unwrap());
        assert!(tracker.invalidate_if_list_changed(&key(11)).await.unwrap());
        assert_eq!(tracker.get_index(&key(10)), 4);
        assert_eq!(tracker.get_index(&key(11)), 0);
        assert_eq!(repo.current_list().await.unwrap(), Some(key(11)));
    }
}
