//! Core domain logic for daylist.
//! This crate is the single source of truth for task, reminder and reset
//! invariants; presentation layers only call into it.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CoreConfig;
pub use logging::{
    default_log_level, init_logging, init_logging_from_config, logging_status, LoggingError,
};
pub use model::ordering::{compare_tasks, sort_tasks, sorted};
pub use model::task::{Reminder, ReminderTime, Task, TaskId, TaskValidationError};
pub use notify::{
    ChannelNotifier, LogNotifier, NotificationError, NotificationPayload, Notifier,
};
pub use repo::kv_store::{
    InMemoryKeyValueStore, KeyValueStore, KvError, KvResult, SqliteKeyValueStore,
};
pub use repo::task_repo::{PersistenceError, TaskRepository, DEFAULT_STORAGE_KEY};
pub use service::daily_reset::{next_local_midnight, DailyResetTimer, ResetEvent};
pub use service::reminder::{delay_until, is_past_due, ReminderTimeError};
pub use service::task_store::{SharedTaskStore, StoreError, StoreResult, TaskStore};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
