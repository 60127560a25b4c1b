//! Civil (wall-clock) time resolution against IANA timezones.
//!
//! A slot is defined by a calendar date and a clock time in the provider's zone.
//! Turning that into an absolute instant always goes through
//! `TimeZone::from_local_datetime`, never through a fixed UTC offset added to an
//! instant, so DST transitions and provider/server zone mismatches resolve
//! correctly.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchedulingError};
use crate::time::MINUTES_PER_DAY;

/// Longest DST gap searched when shifting forward out of a nonexistent time.
const MAX_GAP_MINUTES: i64 = 3 * 60;

/// Policy for civil times that fall inside DST transitions.
///
/// Ambiguous times (the repeated hour when clocks fall back) resolve to the
/// earliest instant under every policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DstPolicy {
    /// Drop times that fall in the DST gap (e.g., 2:30 AM during spring forward).
    Skip,
    /// Move gap times to the first valid wall-clock time after the gap.
    ShiftForward,
    /// Read gap times with the offset in force before the transition, keeping
    /// elapsed time (02:30 in a one-hour gap becomes 03:30).
    #[default]
    WallClock,
}

/// Parse an IANA timezone name.
///
/// # Errors
/// Returns `SchedulingError::InvalidTimezone` for unknown names.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse()
        .map_err(|_| SchedulingError::InvalidTimezone(name.to_string()))
}

/// Compose `date` and a minute-of-day into a civil datetime.
///
/// Minute 1440 rolls over to midnight of the following day.
pub fn civil_datetime(date: NaiveDate, minute_of_day: u32) -> Option<NaiveDateTime> {
    let midnight = date.and_time(NaiveTime::MIN);
    if minute_of_day > MINUTES_PER_DAY {
        return None;
    }
    midnight.checked_add_signed(Duration::minutes(i64::from(minute_of_day)))
}

/// Resolve a civil datetime in `tz` to an absolute instant.
///
/// Returns `None` only under [`DstPolicy::Skip`] for times inside a DST gap, or
/// if no valid time exists within [`MAX_GAP_MINUTES`] of `civil`.
pub fn resolve(civil: NaiveDateTime, tz: Tz, policy: DstPolicy) -> Option<DateTime<Utc>> {
    if let Some(earliest) = tz.from_local_datetime(&civil).earliest() {
        return Some(earliest.with_timezone(&Utc));
    }

    match policy {
        DstPolicy::Skip => None,
        DstPolicy::ShiftForward => first_valid_after(civil, tz),
        DstPolicy::WallClock => {
            // Offset in force before the transition, found by resolving a civil
            // time safely ahead of the gap.
            let before = tz
                .from_local_datetime(&(civil - Duration::minutes(MAX_GAP_MINUTES)))
                .earliest()?;
            let offset_seconds = before.offset().fix().local_minus_utc();
            let utc = civil - Duration::seconds(i64::from(offset_seconds));
            Some(utc.and_utc())
        }
    }
}

/// Resolve a date plus minute-of-day in `tz`.
pub fn resolve_on(
    date: NaiveDate,
    minute_of_day: u32,
    tz: Tz,
    policy: DstPolicy,
) -> Option<DateTime<Utc>> {
    resolve(civil_datetime(date, minute_of_day)?, tz, policy)
}

/// Express an instant as a civil date and minute-of-day in `tz`.
pub fn to_civil(instant: DateTime<Utc>, tz: Tz) -> (NaiveDate, u32) {
    let local = instant.with_timezone(&tz).naive_local();
    let minute = local.time().signed_duration_since(NaiveTime::MIN).num_minutes() as u32;
    (local.date(), minute)
}

/// The civil date of `instant` in `tz`.
pub fn civil_date(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

fn first_valid_after(civil: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    (1..=MAX_GAP_MINUTES)
        .map(|step| civil + Duration::minutes(step))
        .find_map(|candidate| tz.from_local_datetime(&candidate).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}
