//! Ordering policy for task collections.
//!
//! Precedence, highest first:
//! 1. Tasks with a reminder come before tasks without one.
//! 2. Between two reminders, the earlier instant comes first.
//! 3. Between two tasks without reminders, incomplete comes before completed.
//!
//! Sorting is stable: tasks with equal keys keep their relative order, which
//! is how newest-first insertion survives the sort.

use crate::model::task::Task;
use std::cmp::Ordering;

/// Compares two tasks by the three-tier precedence above.
pub fn compare_tasks(a: &Task, b: &Task) -> Ordering {
    match (a.reminder_time(), b.reminder_time()) {
        (Some(left), Some(right)) => left.cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.completed.cmp(&b.completed),
    }
}

/// Sorts tasks in place. Stable.
pub fn sort_tasks(tasks: &mut [Task]) {
    tasks.sort_by(compare_tasks);
}

/// Returns the collection in policy order.
pub fn sorted(mut tasks: Vec<Task>) -> Vec<Task> {
    sort_tasks(&mut tasks);
    tasks
}
