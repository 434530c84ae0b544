//! Task store use-case service.
//!
//! # Responsibility
//! - Be the only owner and mutator of the in-memory task collection.
//! - Re-sort and persist after every mutation.
//! - Request one-shot notifications when reminders are scheduled.
//!
//! # Invariants
//! - Every collection handed out is in `ordering::sort_tasks` order.
//! - Every successful mutation issues exactly one persistence write.
//! - Rejected input (blank text, non-future reminder) writes nothing.
//! - A failed save does not roll back the in-memory mutation.
//! - Operations on an absent id are no-ops that still re-sort and re-persist.
//!
//! Callers must serialize access; see [`SharedTaskStore`].

use crate::clock::{Clock, SystemClock};
use crate::model::ordering::{sort_tasks, sorted};
use crate::model::task::{normalize_text, Reminder, ReminderTime, Task, TaskId, TaskValidationError};
use crate::notify::{NotificationError, NotificationPayload, Notifier};
use crate::repo::kv_store::KeyValueStore;
use crate::repo::task_repo::{PersistenceError, TaskRepository};
use crate::service::reminder::{self, ReminderTimeError};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store handle shared between user commands and the daily reset timer.
///
/// The mutex is the serializing boundary: one operation runs to completion
/// (including its persistence write) before the next one starts.
pub type SharedTaskStore<K, N> = Arc<Mutex<TaskStore<K, N>>>;

/// Caller-facing store error.
#[derive(Debug)]
pub enum StoreError {
    /// Task text is blank.
    Validation(TaskValidationError),
    /// Reminder target is not strictly in the future.
    InvalidReminderTime(ReminderTimeError),
    /// Load or save failed. On save, the in-memory change is kept.
    Persistence(PersistenceError),
    /// Notification collaborator rejected the request, passed through as-is.
    Notification(NotificationError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidReminderTime(err) => write!(f, "{err}"),
            Self::Persistence(err) => write!(f, "{err}"),
            Self::Notification(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::InvalidReminderTime(err) => Some(err),
            Self::Persistence(err) => Some(err),
            Self::Notification(err) => Some(err),
        }
    }
}

impl From<TaskValidationError> for StoreError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<ReminderTimeError> for StoreError {
    fn from(value: ReminderTimeError) -> Self {
        Self::InvalidReminderTime(value)
    }
}

impl From<PersistenceError> for StoreError {
    fn from(value: PersistenceError) -> Self {
        Self::Persistence(value)
    }
}

impl From<NotificationError> for StoreError {
    fn from(value: NotificationError) -> Self {
        Self::Notification(value)
    }
}

/// Single source of truth for the task collection.
pub struct TaskStore<K: KeyValueStore, N: Notifier> {
    repo: TaskRepository<K>,
    notifier: N,
    clock: Arc<dyn Clock>,
    tasks: Vec<Task>,
}

impl<K: KeyValueStore, N: Notifier> TaskStore<K, N> {
    /// Creates an empty store reading time from the system clock.
    ///
    /// Call [`TaskStore::load`] to pick up the persisted collection.
    pub fn new(repo: TaskRepository<K>, notifier: N) -> Self {
        Self {
            repo,
            notifier,
            clock: Arc::new(SystemClock),
            tasks: Vec::new(),
        }
    }

    /// Replaces the clock used for reminder validation and past-due checks.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Wraps the store in its shared, serialized handle.
    pub fn into_shared(self) -> SharedTaskStore<K, N> {
        Arc::new(Mutex::new(self))
    }

    /// Current collection in display order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Looks up one task by id.
    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == id)
    }

    /// Whether `task`'s reminder has elapsed according to the store clock.
    pub fn is_past_due(&self, task: &Task) -> bool {
        reminder::is_past_due(task.reminder_time(), self.clock.now())
    }

    /// Replaces the in-memory collection with the persisted one.
    ///
    /// Missing data yields an empty collection. Unreadable or malformed data
    /// also yields an empty collection, and the error is returned so callers
    /// can tell the user.
    pub async fn load(&mut self) -> StoreResult<&[Task]> {
        let started_at = Instant::now();
        match self.repo.load().await {
            Ok(stored) => {
                self.tasks = sorted(stored.unwrap_or_default());
                info!(
                    "event=tasks_load module=service status=ok count={} duration_ms={}",
                    self.tasks.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(&self.tasks)
            }
            Err(err) => {
                self.tasks.clear();
                error!(
                    "event=tasks_load module=service status=error fallback=empty error={err}"
                );
                Err(err.into())
            }
        }
    }

    /// Adds a new incomplete task ahead of the existing ones.
    ///
    /// # Errors
    /// - `Validation` when `text` is blank; nothing is written.
    /// - `Persistence` when the save fails; the task stays in memory.
    pub async fn add(&mut self, text: &str) -> StoreResult<&[Task]> {
        let task = Task::new(text)?;
        self.tasks.insert(0, task);
        self.commit("task_add").await
    }

    /// Removes the task with `id`, if present.
    pub async fn delete(&mut self, id: &TaskId) -> StoreResult<&[Task]> {
        self.tasks.retain(|task| &task.id != id);
        self.commit("task_delete").await
    }

    /// Replaces the text of the task with `id`.
    ///
    /// # Errors
    /// - `Validation` when `new_text` is blank, even if `id` is absent.
    pub async fn edit(&mut self, id: &TaskId, new_text: &str) -> StoreResult<&[Task]> {
        let text = normalize_text(new_text)?;
        if let Some(task) = self.find_mut(id) {
            task.text = text;
        }
        self.commit("task_edit").await
    }

    /// Flips the completion flag of the task with `id`.
    pub async fn toggle_complete(&mut self, id: &TaskId) -> StoreResult<&[Task]> {
        if let Some(task) = self.find_mut(id) {
            task.completed = !task.completed;
        }
        self.commit("task_toggle").await
    }

    /// Empties the collection and persists the empty collection.
    pub async fn clear_all(&mut self) -> StoreResult<&[Task]> {
        self.tasks.clear();
        self.commit("tasks_clear").await
    }

    /// Schedules a one-shot reminder for the task with `id` at `target`.
    ///
    /// On success the task moves to `Reminder::At(target)`, replacing any
    /// earlier reminder. The previous OS request is not cancelled.
    ///
    /// # Errors
    /// - `InvalidReminderTime` when `target` is not strictly in the future.
    /// - `Notification` when the collaborator rejects the request; the task
    ///   keeps its previous reminder state and nothing is written.
    /// - `Persistence` when the save fails after the reminder was accepted.
    pub async fn schedule_reminder(
        &mut self,
        id: &TaskId,
        target: ReminderTime,
    ) -> StoreResult<&[Task]> {
        let delay_seconds = reminder::delay_until(target, self.clock.now())?;

        let Some(index) = self.tasks.iter().position(|task| &task.id == id) else {
            return self.commit("task_remind").await;
        };

        let payload = NotificationPayload::reminder(&self.tasks[index].text);
        if let Err(err) = self.notifier.schedule_one_shot(delay_seconds, &payload).await {
            warn!("event=task_remind module=service status=error stage=notify error={err}");
            return Err(err.into());
        }

        self.tasks[index].reminder = Reminder::At(target);
        self.commit("task_remind").await
    }

    fn find_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| &task.id == id)
    }

    async fn commit(&mut self, event: &'static str) -> StoreResult<&[Task]> {
        sort_tasks(&mut self.tasks);
        if let Err(err) = self.repo.save(&self.tasks).await {
            error!("event={event} module=service status=error stage=save error={err}");
            return Err(err.into());
        }
        info!(
            "event={event} module=service status=ok count={}",
            self.tasks.len()
        );
        Ok(&self.tasks)
    }
}
