//! Cancellation window policy.
//!
//! Configured independently of the booking advance notice.

use chrono::{DateTime, Duration, Utc};

use crate::validator::{Rejection, ValidationResult};

/// True iff `appointment_start >= now + min_hours_before`.
///
/// A window reaching past the representable date range never allows
/// cancellation.
pub fn can_cancel(
    appointment_start: DateTime<Utc>,
    min_hours_before: u32,
    now: DateTime<Utc>,
) -> bool {
    now.checked_add_signed(Duration::hours(i64::from(min_hours_before)))
        .is_some_and(|deadline| appointment_start >= deadline)
}

/// [`can_cancel`] as a verdict carrying `CancellationWindowViolation`.
pub fn check_cancellation(
    appointment_start: DateTime<Utc>,
    min_hours_before: u32,
    now: DateTime<Utc>,
) -> ValidationResult {
    if can_cancel(appointment_start, min_hours_before, now) {
        ValidationResult::ok()
    } else {
        ValidationResult::rejected(Rejection::CancellationWindowViolation)
    }
}
