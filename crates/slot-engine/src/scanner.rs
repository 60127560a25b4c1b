//! "Next available" scanning across days and providers.
//!
//! The scanner walks forward one civil day at a time from today (in the
//! provider's timezone), generating slots for days with active rules, until it
//! has collected the requested number of slots or reached the day ceiling.
//! Busy intervals are supplied once for the whole scan window.

use chrono::{DateTime, Days, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::civil;
use crate::conflict::ConflictIndex;
use crate::model::{ProviderId, RecurrenceRule};
use crate::policy::SchedulingPolicy;
use crate::recurrence;
use crate::slots::{Slot, SlotGenerator};

/// Everything the scanner needs about one provider.
#[derive(Debug, Clone)]
pub struct ProviderSchedule {
    pub provider_id: ProviderId,
    pub timezone: Tz,
    pub rules: Vec<RecurrenceRule>,
    pub busy: ConflictIndex,
}

/// Upcoming slots found for one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderPreview {
    pub provider_id: ProviderId,
    pub slots: Vec<Slot>,
}

impl ProviderPreview {
    pub fn earliest(&self) -> Option<DateTime<Utc>> {
        self.slots.first().map(|slot| slot.start)
    }
}

/// Day-by-day availability scanner.
#[derive(Debug, Clone)]
pub struct AvailabilityScanner<'p> {
    policy: &'p SchedulingPolicy,
    now: DateTime<Utc>,
}

impl<'p> AvailabilityScanner<'p> {
    pub fn new(policy: &'p SchedulingPolicy, now: DateTime<Utc>) -> Self {
        Self { policy, now }
    }

    /// Up to `count` upcoming slots, scanning at most `policy.max_scan_days`
    /// days starting today. An empty result means no availability in range.
    pub fn next_slots(
        &self,
        tz: Tz,
        rules: &[RecurrenceRule],
        busy: &ConflictIndex,
        count: usize,
    ) -> Vec<Slot> {
        let mut found = Vec::new();
        if count == 0 {
            return found;
        }

        let generator = SlotGenerator::with_policy(tz, busy, self.now, self.policy);
        let today = civil::civil_date(self.now, tz);

        for date in days_from(today).take(self.policy.max_scan_days as usize) {
            let active = recurrence::active_rules_for(date, rules);
            if active.is_empty() {
                continue;
            }

            let needed = count - found.len();
            found.extend(
                generator
                    .slots_for_rules(date, &active)
                    .into_iter()
                    .take(needed),
            );
            if found.len() >= count {
                break;
            }
        }

        tracing::debug!(
            requested = count,
            found = found.len(),
            max_days = self.policy.max_scan_days,
            "availability scan finished"
        );
        found
    }

    /// Scan one provider.
    pub fn preview(&self, schedule: &ProviderSchedule, count: usize) -> ProviderPreview {
        ProviderPreview {
            provider_id: schedule.provider_id.clone(),
            slots: self.next_slots(schedule.timezone, &schedule.rules, &schedule.busy, count),
        }
    }

    /// Scan every provider and order them by earliest available slot.
    ///
    /// Providers with no slots in range sort last; ties keep input order.
    pub fn rank(&self, schedules: &[ProviderSchedule], count: usize) -> Vec<ProviderPreview> {
        let mut previews: Vec<ProviderPreview> = schedules
            .iter()
            .map(|schedule| self.preview(schedule, count))
            .collect();
        previews.sort_by_key(|p| (p.earliest().is_none(), p.earliest()));
        previews
    }
}

/// Convenience wrapper around [`AvailabilityScanner::next_slots`].
pub fn next_available(
    rules: &[RecurrenceRule],
    busy: &ConflictIndex,
    tz: Tz,
    now: DateTime<Utc>,
    count: usize,
    policy: &SchedulingPolicy,
) -> Vec<Slot> {
    AvailabilityScanner::new(policy, now).next_slots(tz, rules, busy, count)
}

fn days_from(start: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    (0u64..).map_while(move |offset| start.checked_add_days(Days::new(offset)))
}
