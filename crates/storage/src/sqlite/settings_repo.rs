use async_trait::async_trait;
use chrono::Utc;
use phrase_core::model::PlaybackSettings;

use super::SqliteRepository;
use super::mapping::{conn, map_settings_row, seed_to_i64};
use crate::repository::{SettingsRepository, StorageError};

#[async_trait]
impl SettingsRepository for SqliteRepository {
    async fn get_settings(&self) -> Result<Option<PlaybackSettings>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT
                speed,
                pause_between_phrases,
                pause_between_languages,
                direction,
                play_order,
                repeat_length,
                repeat_count,
                voice,
                recognize,
                list_type,
                random_seed
            FROM playback_settings
            WHERE id = 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_settings_row).transpose()
    }

    async fn save_settings(&self, settings: &PlaybackSettings) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO playback_settings (
                id,
                speed,
                pause_between_phrases,
                pause_between_languages,
                direction,
                play_order,
                repeat_length,
                repeat_count,
                voice,
                recognize,
                list_type,
                random_seed,
                updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ON CONFLICT(id) DO UPDATE SET
                speed = excluded.speed,
                pause_between_phrases = excluded.pause_between_phrases,
                pause_between_languages = excluded.pause_between_languages,
                direction = excluded.direction,
                play_order = excluded.play_order,
                repeat_length = excluded.repeat_length,
                repeat_count = excluded.repeat_count,
                voice = excluded.voice,
                recognize = excluded.recognize,
                list_type = excluded.list_type,
                random_seed = excluded.random_seed,
                updated_at = excluded.updated_at
            ",
        )
        .bind(1_i64)
        .bind(f64::from(settings.speed()))
        .bind(f64::from(settings.pause_between_phrases()))
        .bind(f64::from(settings.pause_between_languages()))
        .bind(settings.direction().as_str())
        .bind(settings.order().as_str())
        .bind(i64::from(settings.repeat_length()))
        .bind(i64::from(settings.repeat_count()))
        .bind(settings.voice().as_str())
        .bind(settings.recognize())
        .bind(settings.list_type())
        .bind(settings.random_seed().map(seed_to_i64))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }
}
