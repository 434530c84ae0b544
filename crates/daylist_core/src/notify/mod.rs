//! One-shot notification collaborator.
//!
//! # Responsibility
//! - Define the request core makes to the OS: "fire `payload` after N seconds".
//! - Provide in-process implementations for headless and terminal use.
//!
//! # Invariants
//! - Core only learns whether a request was accepted, never whether it was
//!   delivered.
//! - Accepted requests are not cancellable through this interface.

use async_trait::async_trait;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Title used for every reminder notification.
pub const REMINDER_TITLE: &str = "Reminder";

/// Content handed to the notification collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
}

impl NotificationPayload {
    /// Builds the reminder payload for a task's text.
    pub fn reminder(task_text: &str) -> Self {
        Self {
            title: REMINDER_TITLE.to_string(),
            body: task_text.to_string(),
        }
    }
}

/// Scheduling request rejected by the notification collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationError {
    /// Collaborator refused the request (permissions, quota, ...).
    Rejected(String),
    /// No delivery channel is available.
    Unavailable,
}

impl Display for NotificationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected(reason) => write!(f, "notification request rejected: {reason}"),
            Self::Unavailable => write!(f, "notification delivery is unavailable"),
        }
    }
}

impl Error for NotificationError {}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Requests a single notification `delay_seconds` from now.
    async fn schedule_one_shot(
        &self,
        delay_seconds: u64,
        payload: &NotificationPayload,
    ) -> Result<(), NotificationError>;
}

#[async_trait]
impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    async fn schedule_one_shot(
        &self,
        delay_seconds: u64,
        payload: &NotificationPayload,
    ) -> Result<(), NotificationError> {
        (**self).schedule_one_shot(delay_seconds, payload).await
    }
}

/// Accepts every request and only records it in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn schedule_one_shot(
        &self,
        delay_seconds: u64,
        _payload: &NotificationPayload,
    ) -> Result<(), NotificationError> {
        info!("event=notification_schedule module=notify status=ok backend=log delay_secs={delay_seconds}");
        Ok(())
    }
}

/// Delivers payloads on a channel once their delay has elapsed.
///
/// Each accepted request spawns a timer on the current tokio runtime.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<NotificationPayload>,
}

impl ChannelNotifier {
    pub fn new(sender: mpsc::UnboundedSender<NotificationPayload>) -> Self {
        Self { sender }
    }

    /// Creates a notifier together with the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<NotificationPayload>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn schedule_one_shot(
        &self,
        delay_seconds: u64,
        payload: &NotificationPayload,
    ) -> Result<(), NotificationError> {
        if self.sender.is_closed() {
            return Err(NotificationError::Unavailable);
        }
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| NotificationError::Unavailable)?;

        let sender = self.sender.clone();
        let payload = payload.clone();
        runtime.spawn(async move {
            tokio::time::sleep(Duration::from_secs(delay_seconds)).await;
            if sender.send(payload).is_ok() {
                info!("event=notification_fire module=notify status=ok backend=channel");
            }
        });
        info!("event=notification_schedule module=notify status=ok backend=channel delay_secs={delay_seconds}");
        Ok(())
    }
}
