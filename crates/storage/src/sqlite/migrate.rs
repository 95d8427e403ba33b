use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs the versioned schema migrations.
///
/// Version 1 creates the settings row, per-list progress and the
/// current-list cursor.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS playback_settings (
                    id INTEGER PRIMARY KEY CHECK (id = 1),
                    speed REAL NOT NULL CHECK (speed BETWEEN 0.5 AND 2.0),
                    pause_between_phrases REAL NOT NULL CHECK (pause_between_phrases BETWEEN 0 AND 30),
                    pause_between_languages REAL NOT NULL CHECK (pause_between_languages BETWEEN 0 AND 30),
                    direction TEXT NOT NULL,
                    play_order TEXT NOT NULL,
                    repeat_length INTEGER NOT NULL CHECK (repeat_length >= 1),
                    repeat_count INTEGER NOT NULL CHECK (repeat_count >= 0),
                    voice TEXT NOT NULL,
                    recognize INTEGER NOT NULL CHECK (recognize IN (0, 1)),
                    list_type TEXT NOT NULL,
                    random_seed INTEGER,
                    updated_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS list_progress (
                    list_key TEXT PRIMARY KEY,
                    phrase_index INTEGER NOT NULL CHECK (phrase_index >= 0),
                    current_repeat INTEGER NOT NULL CHECK (current_repeat >= 0),
                    updated_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS progress_cursor (
                    id INTEGER PRIMARY KEY CHECK (id = 1),
                    list_key TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
    }

    Ok(())
}
