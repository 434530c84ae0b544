use chrono::{DateTime, Duration, TimeZone, Utc};
use daylist_core::{sorted, Reminder, Task, TaskId};
use proptest::prelude::*;

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 16, 0, 0, 0).unwrap()
}

fn task(text: &str, completed: bool, reminder: Reminder) -> Task {
    let mut task = Task::with_id(TaskId::from(text), text).unwrap();
    task.completed = completed;
    task.reminder = reminder;
    task
}

fn position(task: &Task) -> usize {
    task.id.as_str()[1..].parse().unwrap()
}

/// Tasks `t0..tn` in insertion order with random completion and reminders.
fn arb_tasks() -> impl Strategy<Value = Vec<Task>> {
    prop::collection::vec((any::<bool>(), prop::option::of(0i64..500)), 0..40).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(index, (completed, offset))| {
                let reminder = offset.map_or(Reminder::Unset, |minutes| {
                    Reminder::At(base() + Duration::minutes(minutes))
                });
                let mut record = task(&format!("t{index}"), completed, reminder);
                record.text = format!("task {index}");
                record
            })
            .collect()
    })
}

#[test]
fn reminder_then_incomplete_then_completed() {
    let tasks = vec![
        task("A", true, Reminder::Unset),
        task("B", false, Reminder::Unset),
        task("C", false, Reminder::At(base())),
    ];

    let ordered: Vec<String> = sorted(tasks).into_iter().map(|t| t.text).collect();
    assert_eq!(ordered, vec!["C", "B", "A"]);
}

#[test]
fn reminders_sort_by_time_regardless_of_completion() {
    let tasks = vec![
        task("late", false, Reminder::At(base() + Duration::hours(2))),
        task("early-done", true, Reminder::At(base() + Duration::hours(1))),
        task("plain", false, Reminder::Unset),
    ];

    let ordered: Vec<String> = sorted(tasks).into_iter().map(|t| t.text).collect();
    assert_eq!(ordered, vec!["early-done", "late", "plain"]);
}

#[test]
fn equal_keys_keep_insertion_order() {
    let tasks = vec![
        task("newest", false, Reminder::Unset),
        task("done", true, Reminder::Unset),
        task("older", false, Reminder::Unset),
        task("oldest", false, Reminder::Unset),
    ];

    let ordered: Vec<String> = sorted(tasks).into_iter().map(|t| t.text).collect();
    assert_eq!(ordered, vec!["newest", "older", "oldest", "done"]);
}

#[test]
fn empty_collection_stays_empty() {
    assert!(sorted(Vec::new()).is_empty());
}

proptest! {
    #[test]
    fn sort_is_idempotent(tasks in arb_tasks()) {
        let once = sorted(tasks);
        let twice = sorted(once.clone());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn sort_is_a_permutation(tasks in arb_tasks()) {
        let mut before: Vec<usize> = tasks.iter().map(position).collect();
        let mut after: Vec<usize> = sorted(tasks).iter().map(position).collect();
        before.sort_unstable();
        after.sort_unstable();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn reminders_come_first(tasks in arb_tasks()) {
        let ordered = sorted(tasks);
        if let Some(first_plain) = ordered.iter().position(|t| !t.notification_set()) {
            prop_assert!(ordered[first_plain..].iter().all(|t| !t.notification_set()));
        }
    }

    #[test]
    fn reminders_ascend(tasks in arb_tasks()) {
        let times: Vec<_> = sorted(tasks).iter().filter_map(Task::reminder_time).collect();
        prop_assert!(times.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn plain_tasks_are_incomplete_first_and_stable(tasks in arb_tasks()) {
        let ordered = sorted(tasks);
        let plain: Vec<&Task> = ordered.iter().filter(|t| !t.notification_set()).collect();

        prop_assert!(plain.windows(2).all(|pair| pair[0].completed <= pair[1].completed));
        prop_assert!(plain
            .windows(2)
            .filter(|pair| pair[0].completed == pair[1].completed)
            .all(|pair| position(pair[0]) < position(pair[1])));
    }

    #[test]
    fn equal_reminder_times_are_stable(tasks in arb_tasks()) {
        let ordered = sorted(tasks);
        let dated: Vec<&Task> = ordered.iter().filter(|t| t.notification_set()).collect();
        prop_assert!(dated
            .windows(2)
            .filter(|pair| pair[0].reminder_time() == pair[1].reminder_time())
            .all(|pair| position(pair[0]) < position(pair[1])));
    }
}
