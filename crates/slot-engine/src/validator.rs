//! Booking-time validation of a proposed appointment.
//!
//! Checks run in a fixed order and stop at the first failure, so the single
//! rejection surfaced to the user is deterministic:
//!
//! 1. advance notice
//! 2. duration bounds
//! 3. within availability
//! 4. no conflict
//!
//! A valid verdict only holds for the snapshot of bookings and blocks it was
//! computed against. Writers must re-validate under a per-provider lock (see
//! [`crate::gate`]).

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::civil;
use crate::conflict::ConflictIndex;
use crate::model::RecurrenceRule;
use crate::policy::SchedulingPolicy;
use crate::recurrence;
use crate::time::{TimeInterval, MINUTES_PER_DAY};

/// A business-rule rejection. Never an error: it is the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    AdvanceNoticeViolation,
    DurationOutOfRange,
    OutsideAvailability,
    SlotConflict,
    CancellationWindowViolation,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Rejection::AdvanceNoticeViolation => "appointment starts too soon",
            Rejection::DurationOutOfRange => "appointment duration is out of range",
            Rejection::OutsideAvailability => "appointment is outside the provider's availability",
            Rejection::SlotConflict => "appointment conflicts with an existing commitment",
            Rejection::CancellationWindowViolation => "cancellation window has closed",
        };
        f.write_str(text)
    }
}

/// Pass/fail verdict with the reason for failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub error: Option<Rejection>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn rejected(reason: Rejection) -> Self {
        Self {
            valid: false,
            error: Some(reason),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn into_result(self) -> Result<(), Rejection> {
        match self.error {
            Some(reason) => Err(reason),
            None => Ok(()),
        }
    }

    fn check(passed: bool, reason: Rejection) -> Self {
        if passed {
            Self::ok()
        } else {
            Self::rejected(reason)
        }
    }
}

/// `start >= now + min_advance_minutes`.
pub fn check_advance_notice(
    start: DateTime<Utc>,
    now: DateTime<Utc>,
    min_advance_minutes: u32,
) -> ValidationResult {
    let earliest = now + Duration::minutes(i64::from(min_advance_minutes));
    ValidationResult::check(start >= earliest, Rejection::AdvanceNoticeViolation)
}

/// `min <= duration <= max`, in minutes.
pub fn check_duration(
    proposed: &TimeInterval,
    min_minutes: u32,
    max_minutes: u32,
) -> ValidationResult {
    let minutes = proposed.duration_minutes();
    let within = minutes >= i64::from(min_minutes) && minutes <= i64::from(max_minutes);
    ValidationResult::check(within, Rejection::DurationOutOfRange)
}

/// Start and end clock times, read in `tz`, must both fall inside one active
/// rule's window on the start's civil date. An end of exactly midnight the
/// following day counts as 24:00; any later end is outside.
pub fn check_within_availability(
    proposed: &TimeInterval,
    rules: &[RecurrenceRule],
    tz: Tz,
) -> ValidationResult {
    let (date, start_minute) = civil::to_civil(proposed.start(), tz);
    let (end_date, end_minute) = civil::to_civil(proposed.end(), tz);

    let end_minute = if end_date == date {
        Some(end_minute)
    } else if end_minute == 0 && date.succ_opt() == Some(end_date) {
        Some(MINUTES_PER_DAY)
    } else {
        None
    };

    let inside = end_minute.is_some_and(|end_minute| {
        recurrence::active_rules_for(date, rules)
            .iter()
            .any(|rule| rule.covers(start_minute, end_minute))
    });
    ValidationResult::check(inside, Rejection::OutsideAvailability)
}

/// The proposal must not overlap any busy interval.
pub fn check_no_conflict(proposed: &TimeInterval, busy: &ConflictIndex) -> ValidationResult {
    ValidationResult::check(!busy.conflicts_with(proposed), Rejection::SlotConflict)
}

/// Runs the ordered checks against one provider's snapshot.
#[derive(Debug, Clone)]
pub struct AppointmentValidator<'a> {
    tz: Tz,
    rules: &'a [RecurrenceRule],
    busy: &'a ConflictIndex,
    policy: &'a SchedulingPolicy,
}

impl<'a> AppointmentValidator<'a> {
    pub fn new(
        tz: Tz,
        rules: &'a [RecurrenceRule],
        busy: &'a ConflictIndex,
        policy: &'a SchedulingPolicy,
    ) -> Self {
        Self {
            tz,
            rules,
            busy,
            policy,
        }
    }

    /// Validate `proposed` as of `now`. First failing check wins.
    pub fn validate(&self, proposed: &TimeInterval, now: DateTime<Utc>) -> ValidationResult {
        let verdict = self.run_checks(proposed, now);
        tracing::debug!(
            start = %proposed.start(),
            end = %proposed.end(),
            valid = verdict.valid,
            reason = ?verdict.error,
            "validated appointment"
        );
        verdict
    }

    fn run_checks(&self, proposed: &TimeInterval, now: DateTime<Utc>) -> ValidationResult {
        let policy = self.policy;

        let advance = check_advance_notice(proposed.start(), now, policy.min_advance_minutes);
        if !advance.valid {
            return advance;
        }

        let duration = check_duration(
            proposed,
            policy.min_duration_minutes,
            policy.max_duration_minutes,
        );
        if !duration.valid {
            return duration;
        }

        let availability = check_within_availability(proposed, self.rules, self.tz);
        if !availability.valid {
            return availability;
        }

        check_no_conflict(proposed, self.busy)
    }
}
