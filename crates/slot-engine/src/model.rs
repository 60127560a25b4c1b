//! Closed, validated input types: recurrence rules, blocks and bookings.
//!
//! Rows arriving as JSON pass through a raw record and a `TryFrom` conversion, so
//! a malformed rule never reaches slot generation.

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchedulingError};
use crate::time::{self, TimeInterval, MINUTES_PER_DAY};

/// Opaque provider identifier supplied by the caller.
pub type ProviderId = String;

/// Map a `0..=6` day index (0 = Sunday) to a chrono weekday.
pub fn weekday_from_index(day: u8) -> Option<Weekday> {
    match day {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

/// One weekly recurring availability window for one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRule", into = "RawRule")]
pub struct RecurrenceRule {
    pub provider_id: ProviderId,
    pub weekday: Weekday,
    /// Window start, minutes since midnight.
    pub start_minute: u32,
    /// Window end, minutes since midnight. Always greater than `start_minute`.
    pub end_minute: u32,
    pub active: bool,
    pub valid_from: NaiveDate,
    pub valid_until: Option<NaiveDate>,
    pub slot_duration_minutes: u32,
}

/// Wire shape of a recurrence rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawRule {
    provider_id: ProviderId,
    day_of_week: u8,
    start_time: String,
    end_time: String,
    #[serde(default = "default_active")]
    active: bool,
    valid_from: NaiveDate,
    #[serde(default)]
    valid_until: Option<NaiveDate>,
    slot_duration_minutes: u32,
}

fn default_active() -> bool {
    true
}

impl TryFrom<RawRule> for RecurrenceRule {
    type Error = SchedulingError;

    fn try_from(raw: RawRule) -> Result<Self> {
        let weekday = weekday_from_index(raw.day_of_week).ok_or_else(|| {
            SchedulingError::InvalidRule(format!("day_of_week {} out of range 0..=6", raw.day_of_week))
        })?;
        RecurrenceRule::new(
            raw.provider_id,
            weekday,
            &raw.start_time,
            &raw.end_time,
            raw.valid_from,
            raw.valid_until,
            raw.slot_duration_minutes,
        )
        .map(|rule| RecurrenceRule {
            active: raw.active,
            ..rule
        })
    }
}

impl From<RecurrenceRule> for RawRule {
    fn from(rule: RecurrenceRule) -> Self {
        RawRule {
            provider_id: rule.provider_id,
            day_of_week: rule.weekday.num_days_from_sunday() as u8,
            start_time: time::format_minutes(rule.start_minute),
            end_time: time::format_minutes(rule.end_minute),
            active: rule.active,
            valid_from: rule.valid_from,
            valid_until: rule.valid_until,
            slot_duration_minutes: rule.slot_duration_minutes,
        }
    }
}

impl RecurrenceRule {
    /// Build an active rule from `"HH:MM"` window bounds.
    ///
    /// # Errors
    /// `InvalidTime` for malformed clock times; `InvalidRule` when the window is
    /// empty, the slot duration is zero or longer than a day, or `valid_until` precedes `valid_from`.
    pub fn new(
        provider_id: impl Into<ProviderId>,
        weekday: Weekday,
        start_time: &str,
        end_time: &str,
        valid_from: NaiveDate,
        valid_until: Option<NaiveDate>,
        slot_duration_minutes: u32,
    ) -> Result<Self> {
        let start_minute = time::to_minutes(start_time)?;
        let end_minute = time::to_minutes(end_time)?;

        if start_minute >= end_minute {
            return Err(SchedulingError::InvalidRule(format!(
                "window {}-{} is empty",
                start_time, end_time
            )));
        }
        if slot_duration_minutes == 0 || slot_duration_minutes > MINUTES_PER_DAY {
            return Err(SchedulingError::InvalidRule(format!(
                "slot_duration_minutes {} outside 1..={}",
                slot_duration_minutes, MINUTES_PER_DAY
            )));
        }
        if let Some(until) = valid_until {
            if until < valid_from {
                return Err(SchedulingError::InvalidRule(format!(
                    "valid_until {} precedes valid_from {}",
                    until, valid_from
                )));
            }
        }

        Ok(Self {
            provider_id: provider_id.into(),
            weekday,
            start_minute,
            end_minute,
            active: true,
            valid_from,
            valid_until,
            slot_duration_minutes,
        })
    }

    /// Same rule with `active` cleared.
    pub fn deactivated(self) -> Self {
        Self {
            active: false,
            ..self
        }
    }

    /// Whether the validity window includes `date` (inclusive on both ends).
    pub fn is_valid_on(&self, date: NaiveDate) -> bool {
        self.valid_from <= date && self.valid_until.map_or(true, |until| until >= date)
    }

    /// Whether the clock range `[start, end]` lies inside this rule's window.
    pub fn covers(&self, start_minute: u32, end_minute: u32) -> bool {
        start_minute >= self.start_minute && end_minute <= self.end_minute
    }
}

/// Explicit unavailability. A `None` provider blocks every provider in the tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub provider_id: Option<ProviderId>,
    #[serde(flatten)]
    pub interval: TimeInterval,
}

impl Block {
    pub fn applies_to(&self, provider_id: &str) -> bool {
        self.provider_id.as_deref().map_or(true, |id| id == provider_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

/// A committed appointment snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub provider_id: ProviderId,
    pub consumer_id: String,
    #[serde(flatten)]
    pub interval: TimeInterval,
    pub status: BookingStatus,
}

impl Booking {
    /// Cancelled bookings free their time; every other status holds it.
    pub fn is_busy(&self) -> bool {
        self.status != BookingStatus::Cancelled
    }
}
