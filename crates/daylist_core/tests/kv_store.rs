use chrono::{TimeZone, Utc};
use daylist_core::{
    sorted, InMemoryKeyValueStore, KeyValueStore, KvError, PersistenceError, Reminder,
    SqliteKeyValueStore, Task, TaskId, TaskRepository,
};
use proptest::prelude::*;

#[tokio::test]
async fn sqlite_store_gets_absent_key_as_none() {
    let kv = SqliteKeyValueStore::open_in_memory().unwrap();
    assert_eq!(kv.get("tasks").await.unwrap(), None);
}

#[tokio::test]
async fn sqlite_store_overwrites_value() {
    let kv = SqliteKeyValueStore::open_in_memory().unwrap();
    kv.set("tasks", "[1]").await.unwrap();
    kv.set("tasks", "[2]").await.unwrap();
    kv.set("other", "x").await.unwrap();

    assert_eq!(kv.get("tasks").await.unwrap().as_deref(), Some("[2]"));
    assert_eq!(kv.get("other").await.unwrap().as_deref(), Some("x"));
}

#[tokio::test]
async fn sqlite_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("daylist.db");

    let mut task = Task::with_id(TaskId::from("1"), "Survive restart").unwrap();
    task.reminder = Reminder::At(Utc.with_ymd_and_hms(2026, 10, 16, 18, 30, 0).unwrap());
    {
        let repo = TaskRepository::new(SqliteKeyValueStore::open(&path).unwrap());
        repo.save(std::slice::from_ref(&task)).await.unwrap();
    }

    let repo = TaskRepository::new(SqliteKeyValueStore::open(&path).unwrap());
    assert_eq!(repo.load().await.unwrap(), Some(vec![task]));
}

#[tokio::test]
async fn repository_uses_configured_key() {
    let kv = InMemoryKeyValueStore::new();
    let repo = TaskRepository::with_key(kv.clone(), "today");
    repo.save(&[Task::with_id(TaskId::from("1"), "a").unwrap()])
        .await
        .unwrap();

    assert_eq!(repo.key(), "today");
    assert!(kv.peek("today").is_some());
    assert!(kv.peek("tasks").is_none());
}

#[tokio::test]
async fn repository_maps_backend_failures() {
    let kv = InMemoryKeyValueStore::new();
    let repo = TaskRepository::new(kv.clone());

    kv.fail_writes(true);
    let err = repo.save(&[]).await.unwrap_err();
    assert!(matches!(err, PersistenceError::Write(KvError::Unavailable(_))));

    kv.fail_reads(true);
    let err = repo.load().await.unwrap_err();
    assert!(matches!(err, PersistenceError::Read(KvError::Unavailable(_))));
}

#[tokio::test]
async fn serialized_records_use_wire_field_names() {
    let kv = InMemoryKeyValueStore::new();
    let mut task = Task::with_id(TaskId::from("42"), "Water plants").unwrap();
    task.completed = true;
    TaskRepository::new(kv.clone()).save(&[task]).await.unwrap();

    let json: serde_json::Value = serde_json::from_str(&kv.peek("tasks").unwrap()).unwrap();
    assert_eq!(
        json,
        serde_json::json!([{
            "id": "42",
            "text": "Water plants",
            "completed": true,
            "notificationSet": false,
            "reminderTime": null
        }])
    );
}

fn arb_collection() -> impl Strategy<Value = Vec<Task>> {
    prop::collection::vec((any::<bool>(), prop::option::of(0i64..100_000)), 0..20).prop_map(
        |specs| {
            specs
                .into_iter()
                .enumerate()
                .map(|(index, (completed, offset))| {
                    let mut task =
                        Task::with_id(TaskId::from(format!("{index}")), &format!("task {index}"))
                            .unwrap();
                    task.completed = completed;
                    task.reminder = offset.map_or(Reminder::Unset, |secs| {
                        Reminder::At(Utc.timestamp_opt(1_790_000_000 + secs, 0).unwrap())
                    });
                    task
                })
                .collect()
        },
    )
}

proptest! {
    #[test]
    fn save_then_load_yields_sorted_collection(tasks in arb_collection()) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let loaded = runtime.block_on(async {
            let repo = TaskRepository::new(InMemoryKeyValueStore::new());
            repo.save(&tasks).await.unwrap();
            repo.load().await.unwrap().unwrap()
        });
        prop_assert_eq!(sorted(loaded), sorted(tasks));
    }
}
