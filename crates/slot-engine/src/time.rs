//! Minute-of-day arithmetic and half-open time intervals.
//!
//! Clock times are handled as minutes since midnight (`0..=1440`). Intervals are
//! half-open: an interval that ends exactly when another starts does not overlap
//! it, which is what lets back-to-back slots both be bookable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchedulingError};

/// Minutes in a civil day. `24:00` parses to this value and marks end-of-day.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// An absolute `[start, end)` time range. `start < end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawInterval")]
pub struct TimeInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<RawInterval> for TimeInterval {
    type Error = SchedulingError;

    fn try_from(raw: RawInterval) -> Result<Self> {
        TimeInterval::new(raw.start, raw.end)
    }
}

impl TimeInterval {
    /// Build an interval, rejecting empty or reversed ranges.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start >= end {
            return Err(SchedulingError::InvalidInterval {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }
        Ok(Self { start, end })
    }

    /// Caller guarantees `start < end`.
    pub(crate) fn new_unchecked(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        debug_assert!(start < end);
        Self { start, end }
    }

    /// Build an interval of `minutes` length starting at `start`.
    pub fn starting_at(start: DateTime<Utc>, minutes: u32) -> Result<Self> {
        Self::new(start, start + chrono::Duration::minutes(i64::from(minutes)))
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Half-open overlap test: `self.start < other.end && self.end > other.start`.
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        overlaps(self, other)
    }

    pub fn duration_minutes(&self) -> i64 {
        duration_minutes(self)
    }
}

/// Parse `"HH:MM"` or `"HH:MM:SS"` into minutes since midnight.
///
/// Seconds are validated and then truncated. `"24:00"` is accepted as the end
/// of the day (1440) so availability windows can run to midnight.
///
/// # Errors
/// Returns `SchedulingError::InvalidTime` for anything else.
pub fn to_minutes(time: &str) -> Result<u32> {
    let invalid = || SchedulingError::InvalidTime(time.to_string());

    let parts: Vec<&str> = time.trim().split(':').collect();
    if parts.len() != 2 && parts.len() != 3 {
        return Err(invalid());
    }

    let mut fields = [0u32; 3];
    for (slot, part) in fields.iter_mut().zip(&parts) {
        if part.is_empty() || part.len() > 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        *slot = part.parse().map_err(|_| invalid())?;
    }
    let [hours, minutes, seconds] = fields;

    if minutes > 59 || seconds > 59 {
        return Err(invalid());
    }
    match hours {
        0..=23 => Ok(hours * 60 + minutes),
        24 if minutes == 0 && seconds == 0 => Ok(MINUTES_PER_DAY),
        _ => Err(invalid()),
    }
}

/// Render minutes since midnight as `"HH:MM"`.
pub fn format_minutes(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// True iff `a.start < b.end && a.end > b.start`. Touching intervals do not overlap.
pub fn overlaps(a: &TimeInterval, b: &TimeInterval) -> bool {
    a.start < b.end && a.end > b.start
}

/// Length of the interval in whole minutes.
pub fn duration_minutes(interval: &TimeInterval) -> i64 {
    (interval.end - interval.start).num_minutes()
}

/// Minutes shared by both intervals, zero when they do not overlap.
pub fn overlap_minutes(a: &TimeInterval, b: &TimeInterval) -> i64 {
    if !overlaps(a, b) {
        return 0;
    }
    let start = a.start.max(b.start);
    let end = a.end.min(b.end);
    (end - start).num_minutes()
}
