//! Reminder rules.
//!
//! # Responsibility
//! - Validate reminder target times against "now".
//! - Compute the whole-second delay handed to the notification collaborator.
//! - Answer past-due queries for display.
//!
//! # Invariants
//! - A target equal to "now" is rejected; only strictly future times pass.
//! - Delays are truncated to whole seconds.

use crate::model::task::ReminderTime;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Reminder target is not strictly in the future.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderTimeError {
    pub target: ReminderTime,
    pub now: ReminderTime,
}

impl Display for ReminderTimeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "selected time must be in the future")
    }
}

impl Error for ReminderTimeError {}

/// Returns the delay in whole seconds until `target`.
///
/// # Errors
/// - `ReminderTimeError` when `target <= now`.
pub fn delay_until(target: ReminderTime, now: ReminderTime) -> Result<u64, ReminderTimeError> {
    if target <= now {
        return Err(ReminderTimeError { target, now });
    }
    let seconds = (target - now).num_seconds();
    Ok(u64::try_from(seconds).unwrap_or(0))
}

/// Whether a reminder time has already elapsed.
///
/// `None` is never past due.
pub fn is_past_due(reminder_time: Option<ReminderTime>, now: ReminderTime) -> bool {
    matches!(reminder_time, Some(at) if at < now)
}

#[cfg(test)]
mod tests {
    use super::{delay_until, is_past_due, ReminderTimeError};
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn delay_truncates_sub_second_precision() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        let target = now + Duration::milliseconds(61_999);
        assert_eq!(delay_until(target, now).unwrap(), 61);
    }

    #[test]
    fn delay_rejects_now_and_past() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        assert_eq!(
            delay_until(now, now).unwrap_err(),
            ReminderTimeError { target: now, now }
        );
        assert!(delay_until(now - Duration::seconds(1), now).is_err());
    }

    #[test]
    fn sub_second_future_target_has_zero_delay() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        let target = now + Duration::milliseconds(400);
        assert_eq!(delay_until(target, now).unwrap(), 0);
    }

    #[test]
    fn past_due_is_strict() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        assert!(!is_past_due(None, now));
        assert!(!is_past_due(Some(now), now));
        assert!(!is_past_due(Some(now + Duration::seconds(1)), now));
        assert!(is_past_due(Some(now - Duration::seconds(1)), now));
    }

    #[test]
    fn error_message_matches_user_facing_text() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        let err = delay_until(now, now).unwrap_err();
        assert_eq!(err.to_string(), "selected time must be in the future");
    }
}
