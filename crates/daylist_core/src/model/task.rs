//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical record for one user-entered task.
//! - Own the reminder state so that a flag without a time (or a time without
//!   a flag) cannot be represented in memory.
//! - Map the in-memory shape to the persisted wire shape.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - Tasks created through `Task::new`/`Task::with_id` have non-empty trimmed text.
//! - `notificationSet == reminderTime.is_some()` holds for every serialized task.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Absolute point in time a reminder is set for.
pub type ReminderTime = DateTime<Utc>;

/// Stable identifier for a task.
///
/// Kept as an opaque string: ids written by earlier clients were epoch
/// millisecond strings and must keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Generates a fresh time-ordered identifier (UUID v7).
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Reminder state of a task.
///
/// The only transition is `Unset -> At(t)` or `At(t) -> At(t')`; nothing in
/// core moves a task back to `Unset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reminder {
    /// No reminder has been accepted for this task.
    #[default]
    Unset,
    /// A one-shot reminder was accepted for this instant.
    At(ReminderTime),
}

impl Reminder {
    /// Returns the reminder instant, if any.
    pub fn time(&self) -> Option<ReminderTime> {
        match self {
            Self::Unset => None,
            Self::At(at) => Some(*at),
        }
    }

    /// Mirrors the persisted `notificationSet` flag.
    pub fn is_set(&self) -> bool {
        matches!(self, Self::At(_))
    }
}

/// Validation errors for task text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Text is empty after trimming.
    EmptyText,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyText => write!(f, "task text must not be empty"),
        }
    }
}

impl Error for TaskValidationError {}

/// Trims task text and rejects empty input.
pub fn normalize_text(text: &str) -> Result<String, TaskValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(TaskValidationError::EmptyText);
    }
    Ok(trimmed.to_string())
}

/// Canonical task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TaskRecord", into = "TaskRecord")]
pub struct Task {
    /// Stable ID, generated once at creation.
    pub id: TaskId,
    /// User text, trimmed at creation and edit.
    pub text: String,
    /// Completion flag toggled by the owner.
    pub completed: bool,
    /// Reminder state; see [`Reminder`].
    pub reminder: Reminder,
}

impl Task {
    /// Creates an incomplete task with a generated ID and no reminder.
    pub fn new(text: &str) -> Result<Self, TaskValidationError> {
        Self::with_id(TaskId::generate(), text)
    }

    /// Creates an incomplete task with a caller-provided ID.
    ///
    /// Used by tests and import paths where identity already exists.
    pub fn with_id(id: TaskId, text: &str) -> Result<Self, TaskValidationError> {
        Ok(Self {
            id,
            text: normalize_text(text)?,
            completed: false,
            reminder: Reminder::Unset,
        })
    }

    /// Mirrors the persisted `notificationSet` flag.
    pub fn notification_set(&self) -> bool {
        self.reminder.is_set()
    }

    /// Mirrors the persisted `reminderTime` field.
    pub fn reminder_time(&self) -> Option<ReminderTime> {
        self.reminder.time()
    }
}

/// Persisted shape of one task.
///
/// Field names follow the stored blob (`camelCase`). `task` is accepted as a
/// legacy name for `text`; missing flags default to `false`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskRecord {
    id: TaskId,
    #[serde(alias = "task")]
    text: String,
    #[serde(default)]
    completed: bool,
    #[serde(default)]
    notification_set: bool,
    #[serde(default)]
    reminder_time: Option<ReminderTime>,
}

impl From<TaskRecord> for Task {
    fn from(record: TaskRecord) -> Self {
        let reminder = match (record.notification_set, record.reminder_time) {
            (true, Some(at)) => Reminder::At(at),
            _ => Reminder::Unset,
        };
        Self {
            id: record.id,
            text: record.text,
            completed: record.completed,
            reminder,
        }
    }
}

impl From<Task> for TaskRecord {
    fn from(task: Task) -> Self {
        Self {
            notification_set: task.reminder.is_set(),
            reminder_time: task.reminder.time(),
            id: task.id,
            text: task.text,
            completed: task.completed,
        }
    }
}
