//! Daily reset timer.
//!
//! # Responsibility
//! - Clear the task collection at every local midnight for the lifetime of
//!   the process.
//!
//! # Invariants
//! - The next trigger is always recomputed from the current wall clock, so a
//!   restart never needs a stored schedule.
//! - A failed clear is not retried; the timer re-arms for the next midnight.
//! - The timer only touches the store through `SharedTaskStore`, so it never
//!   interleaves with an in-flight user command.
//! - A wall-clock jump past midnight (suspend/resume) is noticed within
//!   `MAX_SLEEP_SLICE` of runtime time.

use crate::clock::Clock;
use crate::notify::Notifier;
use crate::repo::kv_store::KeyValueStore;
use crate::service::task_store::SharedTaskStore;
use chrono::{DateTime, Days, Local, TimeZone, Utc};
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Longest single sleep before the wall clock is consulted again.
pub const MAX_SLEEP_SLICE: Duration = Duration::from_secs(60);

/// Returns the first local midnight strictly after `now` in `tz`.
///
/// When midnight falls into a DST gap, the first existing hour of that day
/// is used instead. Returns `None` only at the end of the supported calendar.
pub fn next_local_midnight<Tz: TimeZone>(now: DateTime<Utc>, tz: &Tz) -> Option<DateTime<Utc>> {
    let tomorrow = now
        .with_timezone(tz)
        .date_naive()
        .checked_add_days(Days::new(1))?;

    (0..24)
        .find_map(|hour| {
            let naive = tomorrow.and_hms_opt(hour, 0, 0)?;
            tz.from_local_datetime(&naive).earliest()
        })
        .map(|local| local.with_timezone(&Utc))
}

/// Outcome of one timer firing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetEvent {
    /// Wall-clock instant the clear ran.
    pub fired_at: DateTime<Utc>,
    /// Number of tasks removed from memory.
    pub cleared: usize,
    /// Next scheduled firing.
    pub next_at: Option<DateTime<Utc>>,
    /// Persistence error message, when the save of the empty collection failed.
    pub error: Option<String>,
}

/// Self-rescheduling midnight timer.
pub struct DailyResetTimer<Tz: TimeZone> {
    clock: Arc<dyn Clock>,
    tz: Tz,
    events: Option<mpsc::UnboundedSender<ResetEvent>>,
}

impl DailyResetTimer<Local> {
    /// Timer firing at the machine's local midnight.
    pub fn local(clock: Arc<dyn Clock>) -> Self {
        Self::new(clock, Local)
    }
}

impl<Tz> DailyResetTimer<Tz>
where
    Tz: TimeZone + Send + Sync + 'static,
    Tz::Offset: Send + Sync,
{
    pub fn new(clock: Arc<dyn Clock>, tz: Tz) -> Self {
        Self {
            clock,
            tz,
            events: None,
        }
    }

    /// Reports every firing on `sender`.
    pub fn with_events(mut self, sender: mpsc::UnboundedSender<ResetEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Starts the timer loop on the current tokio runtime.
    ///
    /// Aborting the returned handle (or shutting down the runtime) is the only
    /// way to stop it.
    pub fn spawn<K, N>(self, store: SharedTaskStore<K, N>) -> JoinHandle<()>
    where
        K: KeyValueStore + 'static,
        N: Notifier + 'static,
    {
        tokio::spawn(self.run(store))
    }

    /// Runs the timer loop until the calendar runs out.
    pub async fn run<K, N>(self, store: SharedTaskStore<K, N>)
    where
        K: KeyValueStore + 'static,
        N: Notifier + 'static,
    {
        let mut next_at = next_local_midnight(self.clock.now(), &self.tz);
        if let Some(at) = next_at {
            info!("event=daily_reset_arm module=service status=ok next_at={}", at.to_rfc3339());
        }

        while let Some(target) = next_at {
            self.sleep_until(target).await;

            let fired_at = self.clock.now();
            let (cleared, error) = {
                let mut store = store.lock().await;
                let cleared = store.tasks().len();
                match store.clear_all().await {
                    Ok(_) => (cleared, None),
                    Err(err) => (cleared, Some(err.to_string())),
                }
            };
            next_at = next_local_midnight(fired_at, &self.tz);

            let next_label = next_at.map_or_else(|| "none".to_string(), |at| at.to_rfc3339());
            match &error {
                None => info!(
                    "event=daily_reset module=service status=ok cleared={cleared} next_at={next_label}"
                ),
                Some(err) => warn!(
                    "event=daily_reset module=service status=error cleared={cleared} next_at={next_label} error={err}"
                ),
            }

            if let Some(events) = &self.events {
                let _ = events.send(ResetEvent {
                    fired_at,
                    cleared,
                    next_at,
                    error,
                });
            }
        }

        error!("event=daily_reset module=service status=error reason=no_next_midnight");
    }

    // The runtime timer stops while the device is suspended, so sleep in
    // bounded slices and re-read the wall clock after each one.
    async fn sleep_until(&self, target: DateTime<Utc>) {
        loop {
            let now = self.clock.now();
            if now >= target {
                return;
            }
            let remaining = (target - now).to_std().unwrap_or(Duration::ZERO);
            tokio::time::sleep(remaining.min(MAX_SLEEP_SLICE)).await;
        }
    }
}
