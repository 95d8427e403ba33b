use phrase_core::model::{ListKey, PlaybackSettings, PlaybackSettingsDraft, ProgressState};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::{ProgressRecord, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

// SQLite integers are signed; seeds keep their bit pattern.
pub(crate) fn seed_to_i64(seed: u64) -> i64 {
    i64::from_ne_bytes(seed.to_ne_bytes())
}

pub(crate) fn seed_from_i64(raw: i64) -> u64 {
    u64::from_ne_bytes(raw.to_ne_bytes())
}

pub(crate) fn index_to_i64(index: usize) -> Result<i64, StorageError> {
    i64::try_from(index).map_err(|_| StorageError::Serialization("phrase_index overflow".into()))
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn map_settings_row(row: &SqliteRow) -> Result<PlaybackSettings, StorageError> {
    let speed: f64 = row.try_get("speed").map_err(ser)?;
    let pause_between_phrases: f64 = row.try_get("pause_between_phrases").map_err(ser)?;
    let pause_between_languages: f64 = row.try_get("pause_between_languages").map_err(ser)?;
    let direction: String = row.try_get("direction").map_err(ser)?;
    let order: String = row.try_get("play_order").map_err(ser)?;
    let voice: String = row.try_get("voice").map_err(ser)?;
    let recognize: bool = row.try_get("recognize").map_err(ser)?;
    let random_seed: Option<i64> = row.try_get("random_seed").map_err(ser)?;

    #[allow(clippy::cast_possible_truncation)]
    let draft = PlaybackSettingsDraft {
        speed: speed as f32,
        pause_between_phrases: pause_between_phrases as f32,
        pause_between_languages: pause_between_languages as f32,
        direction: direction.parse().map_err(ser)?,
        order: order.parse().map_err(ser)?,
        repeat_length: u32_from_i64("repeat_length", row.try_get("repeat_length").map_err(ser)?)?,
        repeat_count: u32_from_i64("repeat_count", row.try_get("repeat_count").map_err(ser)?)?,
        voice: voice.parse().map_err(ser)?,
        recognize,
        list_type: row.try_get("list_type").map_err(ser)?,
        random_seed: random_seed.map(seed_from_i64),
    };
    draft.validate().map_err(ser)
}

pub(crate) fn map_progress_row(row: &SqliteRow) -> Result<ProgressRecord, StorageError> {
    let raw_key: String = row.try_get("list_key").map_err(ser)?;
    let index: i64 = row.try_get("phrase_index").map_err(ser)?;
    let current_repeat: i64 = row.try_get("current_repeat").map_err(ser)?;

    Ok(ProgressRecord {
        list_key: raw_key.parse::<ListKey>().map_err(ser)?,
        state: ProgressState::new(
            usize::try_from(index)
                .map_err(|_| StorageError::Serialization(format!("invalid phrase_index: {index}")))?,
            u32_from_i64("current_repeat", current_repeat)?,
        ),
        updated_at: row.try_get("updated_at").map_err(ser)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_survives_signed_storage() {
        for seed in [0, 1, u64::MAX, 1 << 63, 42] {
            assert_eq!(seed_from_i64(seed_to_i64(seed)), seed);
        }
    }
}
