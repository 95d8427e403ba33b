use std::sync::Arc;

use phrase_core::model::{PlaybackSettings, PlaybackSettingsDraft};
use storage::repository::SettingsRepository;

use crate::error::SettingsServiceError;

#[derive(Clone)]
pub struct SettingsService {
    repo: Arc<dyn SettingsRepository>,
}

impl SettingsService {
    #[must_use]
    pub fn new(repo: Arc<dyn SettingsRepository>) -> Self {
        Self { repo }
    }

    /// Load persisted settings (or defaults if missing).
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError` on storage failures.
    pub async fn load(&self) -> Result<PlaybackSettings, SettingsServiceError> {
        let settings = self.repo.get_settings().await?;
        Ok(settings.unwrap_or_default())
    }

    /// Validate and persist new settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError` if validation fails or persistence fails.
    pub async fn save(
        &self,
        draft: PlaybackSettingsDraft,
    ) -> Result<PlaybackSettings, SettingsServiceError> {
        let settings = draft.validate()?;
        self.store(&settings).await?;
        Ok(settings)
    }

    /// Persist settings that were already validated.
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError` if persistence fails.
    pub async fn store(&self, settings: &PlaybackSettings) -> Result<(), SettingsServiceError> {
        self.repo.save_settings(settings).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phrase_core::model::PlayOrder;
    use storage::repository::InMemoryRepository;

    #[tokio::test]
    async fn load_falls_back_to_defaults() {
        let service = SettingsService::new(Arc::new(InMemoryRepository::new()));
        assert_eq!(service.load().await.unwrap(), PlaybackSettings::default());
    }

    #[tokio::test]
    async fn save_validates_then_persists() {
        let service = SettingsService::new(Arc::new(InMemoryRepository::new()));

        let bad = PlaybackSettingsDraft {
            speed: 9.0,
            ..PlaybackSettingsDraft::default()
        };
        assert!(matches!(
            service.save(bad).await,
            Err(SettingsServiceError::Settings(_))
        ));
        assert_eq!(service.load().await.unwrap(), PlaybackSettings::default());

        let draft = PlaybackSettingsDraft {
            order: PlayOrder::Random,
            random_seed: Some(5),
            ..PlaybackSettingsDraft::default()
        };
        let saved = service.save(draft).await.unwrap();
        assert_eq!(service.load().await.unwrap(), saved);
    }
}
