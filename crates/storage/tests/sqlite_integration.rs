use chrono::Duration;
use phrase_core::model::{
    ListKey, PlayOrder, PlaybackDirection, PlaybackSettingsDraft, ProgressState, VoiceGender,
};
use phrase_core::time::fixed_clock;
use storage::repository::{ProgressRecord, ProgressRepository, SettingsRepository, Storage};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn settings_round_trip_through_sqlite() {
    let repo = connect("memdb_settings").await;
    assert!(repo.get_settings().await.unwrap().is_none());

    let settings = PlaybackSettingsDraft {
        speed: 1.5,
        pause_between_phrases: 3.0,
        pause_between_languages: 0.5,
        direction: PlaybackDirection::TargetNativeBoth,
        order: PlayOrder::Random,
        repeat_length: 4,
        repeat_count: 2,
        voice: VoiceGender::Female,
        recognize: true,
        list_type: "present_simple".into(),
        random_seed: Some(u64::MAX - 7),
    }
    .validate()
    .unwrap();
    repo.save_settings(&settings).await.unwrap();
    assert_eq!(repo.get_settings().await.unwrap(), Some(settings.clone()));

    let updated = PlaybackSettingsDraft {
        recognize: false,
        random_seed: None,
        ..settings.to_draft()
    }
    .validate()
    .unwrap();
    repo.save_settings(&updated).await.unwrap();
    assert_eq!(repo.get_settings().await.unwrap(), Some(updated));
}

#[tokio::test]
async fn progress_is_upserted_per_list_key() {
    let repo = connect("memdb_progress").await;
    let now = fixed_clock().now();
    let seq = ListKey::new("present_simple", PlayOrder::Sequential, 12);
    let all = ListKey::new("all", PlayOrder::Random, 40);

    repo.save_progress(&ProgressRecord {
        list_key: seq.clone(),
        state: ProgressState::new(3, 0),
        updated_at: now,
    })
    .await
    .unwrap();
    repo.save_progress(&ProgressRecord {
        list_key: all.clone(),
        state: ProgressState::new(17, 2),
        updated_at: now,
    })
    .await
    .unwrap();
    repo.save_progress(&ProgressRecord {
        list_key: seq.clone(),
        state: ProgressState::new(4, 1),
        updated_at: now + Duration::seconds(5),
    })
    .await
    .unwrap();

    let stored = repo.get_progress(&seq).await.unwrap().unwrap();
    assert_eq!(stored.state, ProgressState::new(4, 1));
    assert_eq!(stored.updated_at, now + Duration::seconds(5));

    let records = repo.list_progress().await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].list_key, all);
    assert_eq!(records[0].state, ProgressState::new(17, 2));

    let missing = ListKey::new("present_simple", PlayOrder::Sequential, 13);
    assert!(repo.get_progress(&missing).await.unwrap().is_none());
}

#[tokio::test]
async fn current_list_cursor_is_overwritten() {
    let repo = connect("memdb_cursor").await;
    assert!(repo.current_list().await.unwrap().is_none());

    let first = ListKey::new("all", PlayOrder::Sequential, 10);
    let second = ListKey::new("past_simple", PlayOrder::Random, 4);
    repo.set_current_list(&first).await.unwrap();
    repo.set_current_list(&second).await.unwrap();
    assert_eq!(repo.current_list().await.unwrap(), Some(second));
}

#[tokio::test]
async fn storage_sqlite_wires_both_repositories() {
    let storage = Storage::sqlite("sqlite:file:memdb_storage?mode=memory&cache=shared")
        .await
        .expect("storage");
    let settings = PlaybackSettingsDraft::default().validate().unwrap();
    storage.settings.save_settings(&settings).await.unwrap();
    assert_eq!(storage.settings.get_settings().await.unwrap(), Some(settings));

    let key = ListKey::new("all", PlayOrder::Sequential, 2);
    storage.progress.set_current_list(&key).await.unwrap();
    assert_eq!(storage.progress.current_list().await.unwrap(), Some(key));
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = connect("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");
}
