use async_trait::async_trait;
use phrase_core::model::ListKey;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, index_to_i64, map_progress_row, ser};
use crate::repository::{ProgressRecord, ProgressRepository, StorageError};

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn get_progress(&self, key: &ListKey) -> Result<Option<ProgressRecord>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT list_key, phrase_index, current_repeat, updated_at
            FROM list_progress
            WHERE list_key = ?1
            ",
        )
        .bind(key.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_progress_row).transpose()
    }

    async fn list_progress(&self) -> Result<Vec<ProgressRecord>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT list_key, phrase_index, current_repeat, updated_at
            FROM list_progress
            ORDER BY list_key
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_progress_row).collect()
    }

    async fn save_progress(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO list_progress (list_key, phrase_index, current_repeat, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(list_key) DO UPDATE SET
                phrase_index = excluded.phrase_index,
                current_repeat = excluded.current_repeat,
                updated_at = excluded.updated_at
            ",
        )
        .bind(record.list_key.to_string())
        .bind(index_to_i64(record.state.index)?)
        .bind(i64::from(record.state.current_repeat))
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn current_list(&self) -> Result<Option<ListKey>, StorageError> {
        let row = sqlx::query("SELECT list_key FROM progress_cursor WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let raw: String = row.try_get("list_key").map_err(ser)?;
        raw.parse::<ListKey>().map(Some).map_err(ser)
    }

    async fn set_current_list(&self, key: &ListKey) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO progress_cursor (id, list_key)
            VALUES (1, ?1)
            ON CONFLICT(id) DO UPDATE SET list_key = excluded.list_key
            ",
        )
        .bind(key.to_string())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }
}
