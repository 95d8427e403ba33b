use async_trait::async_trait;
use chrono::{DateTime, Utc};
use phrase_core::model::{ListKey, PlaybackSettings, ProgressState};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted cursor for one list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRecord {
    pub list_key: ListKey,
    pub state: ProgressState,
    pub updated_at: DateTime<Utc>,
}

/// Repository contract for per-list playback progress.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch progress for one list, if any was ever stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get_progress(&self, key: &ListKey) -> Result<Option<ProgressRecord>, StorageError>;

    /// Every stored progress record, ordered by list key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn list_progress(&self) -> Result<Vec<ProgressRecord>, StorageError>;

    /// Insert or overwrite progress for `record.list_key`. Last writer wins.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn save_progress(&self, record: &ProgressRecord) -> Result<(), StorageError>;

    /// Key of the list that was playing most recently.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn current_list(&self) -> Result<Option<ListKey>, StorageError>;

    /// Record `key` as the list currently playing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the key cannot be stored.
    async fn set_current_list(&self, key: &ListKey) -> Result<(), StorageError>;
}

/// Repository contract for the single playback-settings row.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Fetch stored settings, or `None` on first run.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read or the stored
    /// row no longer validates.
    async fn get_settings(&self) -> Result<Option<PlaybackSettings>, StorageError>;

    /// Persist settings as a whole.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the settings cannot be stored.
    async fn save_settings(&self, settings: &PlaybackSettings) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    settings: Arc<Mutex<Option<PlaybackSettings>>>,
    progress: Arc<Mutex<HashMap<ListKey, ProgressRecord>>>,
    current: Arc<Mutex<Option<ListKey>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn get_progress(&self, key: &ListKey) -> Result<Option<ProgressRecord>, StorageError> {
        let guard = self.progress.lock().map_err(poisoned)?;
        Ok(guard.get(key).cloned())
    }

    async fn list_progress(&self) -> Result<Vec<ProgressRecord>, StorageError> {
        let guard = self.progress.lock().map_err(poisoned)?;
        let mut records: Vec<ProgressRecord> = guard.values().cloned().collect();
        records.sort_by(|a, b| a.list_key.cmp(&b.list_key));
        Ok(records)
    }

    async fn save_progress(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        let mut guard = self.progress.lock().map_err(poisoned)?;
        guard.insert(record.list_key.clone(), record.clone());
        Ok(())
    }

    async fn current_list(&self) -> Result<Option<ListKey>, StorageError> {
        let guard = self.current.lock().map_err(poisoned)?;
        Ok(guard.clone())
    }

    async fn set_current_list(&self, key: &ListKey) -> Result<(), StorageError> {
        let mut guard = self.current.lock().map_err(poisoned)?;
        *guard = Some(key.clone());
        Ok(())
    }
}

#[async_trait]
impl SettingsRepository for InMemoryRepository {
    async fn get_settings(&self) -> Result<Option<PlaybackSettings>, StorageError> {
        let guard = self.settings.lock().map_err(poisoned)?;
        Ok(guard.clone())
    }

    async fn save_settings(&self, settings: &PlaybackSettings) -> Result<(), StorageError> {
        let mut guard = self.settings.lock().map_err(poisoned)?;
        *guard = Some(settings.clone());
        Ok(())
    }
}

/// Aggregates settings and progress repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub settings: Arc<dyn SettingsRepository>,
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let settings: Arc<dyn SettingsRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo);
        Self { settings, progress }
    }
}
