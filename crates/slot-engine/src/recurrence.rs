//! Resolve which weekly recurrence rules apply on a calendar date.

use chrono::{Datelike, NaiveDate};

use crate::model::RecurrenceRule;

/// Rules active on `date`: matching weekday, `active`, and `date` inside the
/// inclusive `[valid_from, valid_until]` window (open-ended when `valid_until`
/// is absent).
///
/// Input order is preserved and implies no priority. Rules whose clock windows
/// overlap are all returned.
pub fn active_rules_for<'a>(date: NaiveDate, rules: &'a [RecurrenceRule]) -> Vec<&'a RecurrenceRule> {
    let weekday = date.weekday();
    rules
        .iter()
        .filter(|rule| rule.active && rule.weekday == weekday && rule.is_valid_on(date))
        .collect()
}
