//! Bookable slot generation for one calendar day.
//!
//! Each active rule's clock window is partitioned back-to-back into slots of the
//! slot duration. Every candidate is resolved to an absolute instant in the
//! provider's timezone, then dropped if it starts before `now + advance notice`
//! or overlaps a busy interval. Output is sorted by start with duplicate start
//! times collapsed, and depends only on the inputs.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::civil::{self, DstPolicy};
use crate::conflict::ConflictIndex;
use crate::model::RecurrenceRule;
use crate::policy::SchedulingPolicy;
use crate::recurrence;
use crate::time::TimeInterval;

/// A bookable start time and the duration it was generated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub start: DateTime<Utc>,
    pub duration_minutes: u32,
}

impl Slot {
    pub fn end(&self) -> DateTime<Utc> {
        self.start + Duration::minutes(i64::from(self.duration_minutes))
    }

    pub fn interval(&self) -> TimeInterval {
        TimeInterval::new_unchecked(self.start, self.end())
    }
}

/// Back-to-back minute offsets `start, start + step, ...` whose slot still fits
/// before `end`.
#[derive(Debug, Clone)]
struct WindowSteps {
    next: u32,
    end: u32,
    step: u32,
}

impl Iterator for WindowSteps {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        let slot_end = self.next.checked_add(self.step)?;
        if self.step == 0 || slot_end > self.end {
            return None;
        }
        let current = self.next;
        self.next = slot_end;
        Some(current)
    }
}

/// Slot generator bound to one provider's timezone, busy set and "now".
#[derive(Debug, Clone)]
pub struct SlotGenerator<'a> {
    tz: Tz,
    busy: &'a ConflictIndex,
    now: DateTime<Utc>,
    min_advance_minutes: u32,
    slot_duration: Option<u32>,
    dst_policy: DstPolicy,
}

impl<'a> SlotGenerator<'a> {
    pub fn new(tz: Tz, busy: &'a ConflictIndex, now: DateTime<Utc>) -> Self {
        Self {
            tz,
            busy,
            now,
            min_advance_minutes: 0,
            slot_duration: None,
            dst_policy: DstPolicy::default(),
        }
    }

    /// Generator configured from a [`SchedulingPolicy`].
    pub fn with_policy(
        tz: Tz,
        busy: &'a ConflictIndex,
        now: DateTime<Utc>,
        policy: &SchedulingPolicy,
    ) -> Self {
        Self::new(tz, busy, now)
            .min_advance_minutes(policy.min_advance_minutes)
            .slot_duration(policy.slot_duration_override)
            .dst_policy(policy.dst_policy)
    }

    pub fn min_advance_minutes(mut self, minutes: u32) -> Self {
        self.min_advance_minutes = minutes;
        self
    }

    /// Fixed slot duration for every rule. `None` uses each rule's own duration.
    pub fn slot_duration(mut self, minutes: Option<u32>) -> Self {
        self.slot_duration = minutes.filter(|m| *m > 0);
        self
    }

    pub fn dst_policy(mut self, policy: DstPolicy) -> Self {
        self.dst_policy = policy;
        self
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Earliest bookable start: `now + min_advance_minutes`.
    pub fn earliest_start(&self) -> DateTime<Utc> {
        self.now + Duration::minutes(i64::from(self.min_advance_minutes))
    }

    /// Slot duration used for `rule`.
    pub fn duration_for(&self, rule: &RecurrenceRule) -> u32 {
        self.slot_duration.unwrap_or(rule.slot_duration_minutes)
    }

    /// Lazily yield the surviving slots of one rule on `date`, in window order.
    ///
    /// Consecutive raw candidates are exactly one slot duration apart, so slots
    /// from a single rule never overlap each other.
    pub fn rule_slots<'r>(
        &'r self,
        date: NaiveDate,
        rule: &RecurrenceRule,
    ) -> impl Iterator<Item = Slot> + 'r {
        let duration = self.duration_for(rule);
        let earliest = self.earliest_start();
        let (tz, dst_policy) = (self.tz, self.dst_policy);
        let busy: &'r ConflictIndex = self.busy;
        let steps = WindowSteps {
            next: rule.start_minute,
            end: rule.end_minute,
            step: duration,
        };

        steps
            .filter_map(move |minute| civil::resolve_on(date, minute, tz, dst_policy))
            .filter(move |start| *start >= earliest)
            .map(move |start| Slot {
                start,
                duration_minutes: duration,
            })
            .filter(move |slot| !busy.conflicts_with(&slot.interval()))
    }

    /// Slots on `date` for rules already known to be active on it.
    pub fn slots_for_rules(&self, date: NaiveDate, active: &[&RecurrenceRule]) -> Vec<Slot> {
        let mut slots: Vec<Slot> = active
            .iter()
            .flat_map(|rule| self.rule_slots(date, *rule))
            .collect();

        slots.sort_by_key(|slot| slot.start);
        slots.dedup_by_key(|slot| slot.start);

        tracing::trace!(
            %date,
            rules = active.len(),
            slots = slots.len(),
            "generated day slots"
        );
        slots
    }

    /// Slots on `date`, resolving which of `rules` are active first.
    pub fn slots_on(&self, date: NaiveDate, rules: &[RecurrenceRule]) -> Vec<Slot> {
        let active = recurrence::active_rules_for(date, rules);
        self.slots_for_rules(date, &active)
    }
}

/// Convenience wrapper: bookable slots for `date` under `policy`.
pub fn generate_slots(
    date: NaiveDate,
    rules: &[RecurrenceRule],
    busy: &ConflictIndex,
    tz: Tz,
    now: DateTime<Utc>,
    policy: &SchedulingPolicy,
) -> Vec<Slot> {
    SlotGenerator::with_policy(tz, busy, now, policy).slots_on(date, rules)
}
