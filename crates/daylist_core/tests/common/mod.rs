#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use daylist_core::{
    InMemoryKeyValueStore, ManualClock, NotificationError, NotificationPayload, Notifier, Task,
    TaskId, TaskRepository, TaskStore,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub type TestStore = TaskStore<InMemoryKeyValueStore, Arc<RecordingNotifier>>;

/// Notifier that records requests and can be told to reject them.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    requests: Mutex<Vec<(u64, NotificationPayload)>>,
    reject: AtomicBool,
}

impl RecordingNotifier {
    pub fn reject(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<(u64, NotificationPayload)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn schedule_one_shot(
        &self,
        delay_seconds: u64,
        payload: &NotificationPayload,
    ) -> Result<(), NotificationError> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(NotificationError::Rejected("permission denied".to_string()));
        }
        self.requests
            .lock()
            .unwrap()
            .push((delay_seconds, payload.clone()));
        Ok(())
    }
}

pub struct Harness {
    pub store: TestStore,
    pub kv: InMemoryKeyValueStore,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_kv(InMemoryKeyValueStore::new())
    }

    /// Builds a store over `kv`; sharing `kv` between harnesses simulates a restart.
    pub fn with_kv(kv: InMemoryKeyValueStore) -> Self {
        let notifier = Arc::new(RecordingNotifier::default());
        let clock = Arc::new(ManualClock::new(noon()));
        let store = TaskStore::new(TaskRepository::new(kv.clone()), notifier.clone())
            .with_clock(clock.clone());
        Self {
            store,
            kv,
            notifier,
            clock,
        }
    }
}

/// 2026-10-16 12:00:00 UTC.
pub fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
}

pub fn texts(tasks: &[Task]) -> Vec<&str> {
    tasks.iter().map(|task| task.text.as_str()).collect()
}

pub fn id_of(tasks: &[Task], text: &str) -> TaskId {
    tasks
        .iter()
        .find(|task| task.text == text)
        .map(|task| task.id.clone())
        .unwrap()
}
