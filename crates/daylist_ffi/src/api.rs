//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the task store commands, reminder scheduling and the daily reset
//!   to Dart via FRB.
//! - Own the process-wide runtime and the single shared store instance.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every command goes through the shared store mutex, so commands and the
//!   daily reset never interleave.
//! - List responses always carry the current ordered collection, including
//!   after a failed save.

use crate::outbox::{OutboxNotifier, PendingNotification};
use chrono::{TimeZone, Utc};
use daylist_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, is_past_due,
    ping as ping_inner, CoreConfig, DailyResetTimer, ReminderTime, SharedTaskStore,
    SqliteKeyValueStore, StoreResult, SystemClock, Task, TaskId, TaskRepository, TaskStore,
};
use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::runtime::Runtime;

type FfiStore = TaskStore<SqliteKeyValueStore, Arc<OutboxNotifier>>;

static SESSION: OnceLock<Session> = OnceLock::new();

struct Session {
    runtime: Runtime,
    store: SharedTaskStore<SqliteKeyValueStore, Arc<OutboxNotifier>>,
    outbox: Arc<OutboxNotifier>,
    reset_started: AtomicBool,
}

impl Session {
    fn open() -> Result<Self, String> {
        let config = CoreConfig::from_env();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("daylist-core")
            .enable_all()
            .build()
            .map_err(|err| format!("runtime init failed: {err}"))?;
        let kv = SqliteKeyValueStore::open(&config.db_path)
            .map_err(|err| format!("task DB open failed: {err}"))?;

        let outbox = Arc::new(OutboxNotifier::default());
        let store = TaskStore::new(TaskRepository::with_key(kv, config.storage_key), outbox.clone())
            .into_shared();

        runtime.block_on(async {
            if let Err(err) = store.lock().await.load().await {
                warn!("event=session_open module=ffi status=degraded error={err}");
            }
        });

        Ok(Self {
            runtime,
            store,
            outbox,
            reset_started: AtomicBool::new(false),
        })
    }
}

fn session() -> Result<&'static Session, String> {
    if let Some(session) = SESSION.get() {
        return Ok(session);
    }
    let opened = Session::open()?;
    Ok(SESSION.get_or_init(|| opened))
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// One task as rendered by the list view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub id: String,
    pub text: String,
    pub completed: bool,
    pub notification_set: bool,
    /// Reminder instant in epoch milliseconds.
    pub reminder_epoch_ms: Option<i64>,
    /// Precomputed for styling; reminder elapsed at response time.
    pub past_due: bool,
}

/// Envelope returned by every store command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskActionResponse {
    /// Whether the command succeeded (including its save).
    pub ok: bool,
    /// Current ordered collection.
    pub tasks: Vec<TaskItem>,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
}

enum StoreCommand {
    Load,
    Add(String),
    Delete(TaskId),
    Edit(TaskId, String),
    ToggleComplete(TaskId),
    Clear,
    Remind(TaskId, ReminderTime),
}

impl StoreCommand {
    fn label(&self) -> &'static str {
        match self {
            Self::Load => "tasks_load",
            Self::Add(_) => "task_add",
            Self::Delete(_) => "task_delete",
            Self::Edit(..) => "task_edit",
            Self::ToggleComplete(_) => "task_toggle_complete",
            Self::Clear => "tasks_clear",
            Self::Remind(..) => "task_schedule_reminder",
        }
    }

    async fn apply(self, store: &mut FfiStore) -> StoreResult<()> {
        match self {
            Self::Load => store.load().await?,
            Self::Add(text) => store.add(&text).await?,
            Self::Delete(id) => store.delete(&id).await?,
            Self::Edit(id, text) => store.edit(&id, &text).await?,
            Self::ToggleComplete(id) => store.toggle_complete(&id).await?,
            Self::Clear => store.clear_all().await?,
            Self::Remind(id, at) => store.schedule_reminder(&id, at).await?,
        };
        Ok(())
    }
}

/// Reloads the collection from storage.
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_load() -> TaskActionResponse {
    run_command(StoreCommand::Load)
}

/// Returns the current collection without touching storage.
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_list() -> TaskActionResponse {
    match session() {
        Ok(session) => session.runtime.block_on(async {
            let store = session.store.lock().await;
            TaskActionResponse {
                ok: true,
                tasks: to_items(store.tasks()),
                message: String::new(),
            }
        }),
        Err(err) => failure_without_tasks(format!("tasks_list failed: {err}")),
    }
}

/// Adds a task; blank text is rejected.
#[flutter_rust_bridge::frb(sync)]
pub fn task_add(text: String) -> TaskActionResponse {
    run_command(StoreCommand::Add(text))
}

#[flutter_rust_bridge::frb(sync)]
pub fn task_delete(id: String) -> TaskActionResponse {
    run_command(StoreCommand::Delete(TaskId::from(id)))
}

/// Replaces a task's text; blank text is rejected.
#[flutter_rust_bridge::frb(sync)]
pub fn task_edit(id: String, text: String) -> TaskActionResponse {
    run_command(StoreCommand::Edit(TaskId::from(id), text))
}

#[flutter_rust_bridge::frb(sync)]
pub fn task_toggle_complete(id: String) -> TaskActionResponse {
    run_command(StoreCommand::ToggleComplete(TaskId::from(id)))
}

#[flutter_rust_bridge::frb(sync)]
pub fn tasks_clear() -> TaskActionResponse {
    run_command(StoreCommand::Clear)
}

/// Schedules a one-shot reminder at `epoch_ms`.
///
/// # FFI contract
/// - Rejects times that are not strictly in the future.
/// - On success a request is queued for `notification_drain`.
#[flutter_rust_bridge::frb(sync)]
pub fn task_schedule_reminder(id: String, epoch_ms: i64) -> TaskActionResponse {
    match Utc.timestamp_millis_opt(epoch_ms).single() {
        Some(at) => run_command(StoreCommand::Remind(TaskId::from(id), at)),
        None => failure_without_tasks(format!(
            "task_schedule_reminder failed: invalid timestamp {epoch_ms}"
        )),
    }
}

/// Whether a reminder at `reminder_epoch_ms` has already elapsed.
#[flutter_rust_bridge::frb(sync)]
pub fn task_is_past_due(reminder_epoch_ms: Option<i64>) -> bool {
    let reminder = reminder_epoch_ms.and_then(|ms| Utc.timestamp_millis_opt(ms).single());
    is_past_due(reminder, Utc::now())
}

/// Starts the local-midnight reset timer; later calls are no-ops.
///
/// Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn daily_reset_start() -> String {
    let session = match session() {
        Ok(session) => session,
        Err(err) => return format!("daily_reset_start failed: {err}"),
    };
    if session.reset_started.swap(true, Ordering::SeqCst) {
        return String::new();
    }

    let timer = DailyResetTimer::local(Arc::new(SystemClock));
    session.runtime.spawn(timer.run(session.store.clone()));
    info!("event=daily_reset_start module=ffi status=ok");
    String::new()
}

/// Takes reminder requests queued since the last call.
#[flutter_rust_bridge::frb(sync)]
pub fn notification_drain() -> Vec<PendingNotification> {
    session()
        .map(|session| session.outbox.drain())
        .unwrap_or_default()
}

fn run_command(command: StoreCommand) -> TaskActionResponse {
    let label = command.label();
    let session = match session() {
        Ok(session) => session,
        Err(err) => return failure_without_tasks(format!("{label} failed: {err}")),
    };

    session.runtime.block_on(async {
        let mut store = session.store.lock().await;
        let result = command.apply(&mut store).await;
        let tasks = to_items(store.tasks());
        match result {
            Ok(()) => TaskActionResponse {
                ok: true,
                tasks,
                message: String::new(),
            },
            Err(err) => TaskActionResponse {
                ok: false,
                tasks,
                message: format!("{label} failed: {err}"),
            },
        }
    })
}

fn to_items(tasks: &[Task]) -> Vec<TaskItem> {
    let now = Utc::now();
    tasks
        .iter()
        .map(|task| TaskItem {
            id: task.id.to_string(),
            text: task.text.clone(),
            completed: task.completed,
            notification_set: task.notification_set(),
            reminder_epoch_ms: task.reminder_time().map(|at| at.timestamp_millis()),
            past_due: is_past_due(task.reminder_time(), now),
        })
        .collect()
}

fn failure_without_tasks(message: String) -> TaskActionResponse {
    TaskActionResponse {
        ok: false,
        tasks: Vec::new(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, init_logging, notification_drain, ping, task_add, task_delete, task_edit,
        task_is_past_due, task_schedule_reminder, task_toggle_complete, tasks_list,
    };
    use chrono::{Duration, Utc};
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "/tmp/logs".to_string());
        assert!(error.contains("unsupported log level"));
    }

    #[test]
    fn past_due_handles_missing_and_elapsed_reminders() {
        assert!(!task_is_past_due(None));
        let past = (Utc::now() - Duration::minutes(1)).timestamp_millis();
        let future = (Utc::now() + Duration::minutes(1)).timestamp_millis();
        assert!(task_is_past_due(Some(past)));
        assert!(!task_is_past_due(Some(future)));
    }

    #[test]
    fn task_lifecycle_through_ffi() {
        let token = unique_token("ffi-task");
        let added = task_add(format!("  {token}  "));
        assert!(added.ok, "{}", added.message);
        let item = added
            .tasks
            .iter()
            .find(|item| item.text == token)
            .cloned()
            .expect("added task should be listed");
        assert!(!item.completed);

        let edited = task_edit(item.id.clone(), format!("{token}-edited"));
        assert!(edited.ok, "{}", edited.message);

        let toggled = task_toggle_complete(item.id.clone());
        assert!(toggled.ok, "{}", toggled.message);
        assert!(toggled
            .tasks
            .iter()
            .any(|task| task.id == item.id && task.completed));

        let deleted = task_delete(item.id.clone());
        assert!(deleted.ok, "{}", deleted.message);
        assert!(!tasks_list().tasks.iter().any(|task| task.id == item.id));
    }

    #[test]
    fn blank_task_is_rejected() {
        let response = task_add("   ".to_string());
        assert!(!response.ok);
        assert!(response.message.contains("must not be empty"));
    }

    #[test]
    fn reminder_is_queued_for_flutter() {
        let token = unique_token("ffi-reminder");
        let added = task_add(token.clone());
        let id = added
            .tasks
            .iter()
            .find(|item| item.text == token)
            .map(|item| item.id.clone())
            .expect("added task should be listed");

        let at = (Utc::now() + Duration::hours(1)).timestamp_millis();
        let response = task_schedule_reminder(id.clone(), at);
        assert!(response.ok, "{}", response.message);
        assert!(response
            .tasks
            .iter()
            .any(|task| task.id == id && task.reminder_epoch_ms == Some(at)));
        assert!(notification_drain().iter().any(|pending| pending.body == token));

        let rejected = task_schedule_reminder(id.clone(), 0);
        assert!(!rejected.ok);
        assert!(rejected.message.contains("must be in the future"));

        task_delete(id);
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
