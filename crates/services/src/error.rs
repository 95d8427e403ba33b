//! Shared error types for the services crate.

use thiserror::Error;

use phrase_core::model::SettingsError;
use phrase_core::playback::PlaybackError;
use storage::repository::StorageError;

/// Errors emitted by `ProgressTracker`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `SettingsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SettingsServiceError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while loading phrase data.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PhraseSourceError {
    #[error("phrase source is not configured")]
    Disabled,
    #[error("invalid phrase data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to read phrase file: {0}")]
    Io(#[from] std::io::Error),
    #[error("phrase source request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors surfaced by the playback engine and its handle.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    #[error("phrase list is empty")]
    EmptyList,
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    SettingsService(#[from] SettingsServiceError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error("playback engine has shut down")]
    Closed,
}

impl From<PlaybackError> for EngineError {
    fn from(err: PlaybackError) -> Self {
        match err {
            PlaybackError::EmptyList => EngineError::EmptyList,
            // `PlaybackError` is `#[non_exhaustive]`; it has no other variants today.
            _ => unreachable!("unhandled PlaybackError variant: {err:?}"),
        }
    }
}
