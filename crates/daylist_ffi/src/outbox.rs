//! Notification outbox drained by the Flutter side.
//!
//! The OS notification plugin lives in Dart, so core's one-shot requests are
//! queued here and handed over through `notification_drain`.

use async_trait::async_trait;
use daylist_core::{NotificationError, NotificationPayload, Notifier};
use log::info;
use std::sync::Mutex;

/// One queued "fire `body` after `delay_seconds`" request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingNotification {
    pub delay_seconds: u64,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Default)]
pub struct OutboxNotifier {
    pending: Mutex<Vec<PendingNotification>>,
}

impl OutboxNotifier {
    /// Takes every queued request, oldest first.
    pub fn drain(&self) -> Vec<PendingNotification> {
        match self.pending.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(_) => Vec::new(),
        }
    }
}

#[async_trait]
impl Notifier for OutboxNotifier {
    async fn schedule_one_shot(
        &self,
        delay_seconds: u64,
        payload: &NotificationPayload,
    ) -> Result<(), NotificationError> {
        let mut pending = self
            .pending
            .lock()
            .map_err(|_| NotificationError::Unavailable)?;
        pending.push(PendingNotification {
            delay_seconds,
            title: payload.title.clone(),
            body: payload.body.clone(),
        });
        info!(
            "event=notification_schedule module=ffi status=ok backend=outbox delay_secs={delay_seconds} queued={}",
            pending.len()
        );
        Ok(())
    }
}
