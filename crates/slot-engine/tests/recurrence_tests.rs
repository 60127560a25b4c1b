//! Tests for recurrence rule construction, wire parsing and date resolution.

use chrono::{NaiveDate, Weekday};
use slot_engine::error::SchedulingError;
use slot_engine::model::RecurrenceRule;
use slot_engine::recurrence::active_rules_for;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn monday_rule(start: &str, end: &str) -> RecurrenceRule {
    RecurrenceRule::new("tutor-1", Weekday::Mon, start, end, date(2026, 1, 1), None, 30).unwrap()
}

// ── Construction ────────────────────────────────────────────────────────────

#[test]
fn rule_window_is_stored_in_minutes() {
    let rule = monday_rule("09:00", "11:30");
    assert_eq!(rule.start_minute, 540);
    assert_eq!(rule.end_minute, 690);
    assert!(rule.active);
}

#[test]
fn empty_window_is_rejected() {
    let err = RecurrenceRule::new("t", Weekday::Mon, "11:00", "09:00", date(2026, 1, 1), None, 30)
        .unwrap_err();
    assert!(matches!(err, SchedulingError::InvalidRule(_)));
}

#[test]
fn zero_slot_duration_is_rejected() {
    let err = RecurrenceRule::new("t", Weekday::Mon, "09:00", "10:00", date(2026, 1, 1), None, 0)
        .unwrap_err();
    assert!(matches!(err, SchedulingError::InvalidRule(_)));
}

#[test]
fn slot_duration_longer_than_a_day_is_rejected() {
    let err = RecurrenceRule::new("t", Weekday::Mon, "09:00", "11:00", date(2026, 1, 1), None, u32::MAX - 100)
        .unwrap_err();
    assert!(matches!(err, SchedulingError::InvalidRule(_)));
    assert!(RecurrenceRule::new("t", Weekday::Mon, "00:00", "24:00", date(2026, 1, 1), None, 1440).is_ok());
}

#[test]
fn valid_until_before_valid_from_is_rejected() {
    let err = RecurrenceRule::new(
        "t",
        Weekday::Mon,
        "09:00",
        "10:00",
        date(2026, 3, 1),
        Some(date(2026, 2, 1)),
        30,
    )
    .unwrap_err();
    assert!(matches!(err, SchedulingError::InvalidRule(_)));
}

#[test]
fn malformed_clock_time_is_a_format_error() {
    let err = RecurrenceRule::new("t", Weekday::Mon, "9h", "10:00", date(2026, 1, 1), None, 30)
        .unwrap_err();
    assert_eq!(err, SchedulingError::InvalidTime("9h".to_string()));
}

// ── Wire format ─────────────────────────────────────────────────────────────

#[test]
fn rule_parses_from_json_with_sunday_as_zero() {
    let json = r#"{
        "provider_id": "tutor-1",
        "day_of_week": 0,
        "start_time": "18:00",
        "end_time": "20:00:00",
        "valid_from": "2026-01-01",
        "valid_until": "2026-06-30",
        "slot_duration_minutes": 60
    }"#;
    let rule: RecurrenceRule = serde_json::from_str(json).unwrap();
    assert_eq!(rule.weekday, Weekday::Sun);
    assert_eq!(rule.start_minute, 1080);
    assert_eq!(rule.end_minute, 1200);
    assert_eq!(rule.valid_until, Some(date(2026, 6, 30)));
    assert!(rule.active, "active defaults to true");
}

#[test]
fn rule_json_rejects_out_of_range_weekday() {
    let json = r#"{"provider_id":"t","day_of_week":7,"start_time":"09:00","end_time":"10:00",
                   "valid_from":"2026-01-01","slot_duration_minutes":30}"#;
    assert!(serde_json::from_str::<RecurrenceRule>(json).is_err());
}

#[test]
fn rule_json_rejects_malformed_time() {
    let json = r#"{"provider_id":"t","day_of_week":1,"start_time":"9am","end_time":"10:00",
                   "valid_from":"2026-01-01","slot_duration_minutes":30}"#;
    assert!(serde_json::from_str::<RecurrenceRule>(json).is_err());
}

#[test]
fn rule_serializes_back_to_wire_shape() {
    let rule = monday_rule("09:00", "11:00").deactivated();
    let value = serde_json::to_value(&rule).unwrap();
    assert_eq!(value["day_of_week"], 1);
    assert_eq!(value["start_time"], "09:00");
    assert_eq!(value["end_time"], "11:00");
    assert_eq!(value["active"], false);
}

// ── active_rules_for ────────────────────────────────────────────────────────

#[test]
fn only_rules_for_the_weekday_are_active() {
    let tuesday =
        RecurrenceRule::new("t", Weekday::Tue, "09:00", "10:00", date(2026, 1, 1), None, 30).unwrap();
    let rules = vec![monday_rule("09:00", "10:00"), tuesday];

    let active = active_rules_for(date(2026, 3, 16), &rules); // Monday
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].weekday, Weekday::Mon);

    assert!(active_rules_for(date(2026, 3, 18), &rules).is_empty()); // Wednesday
}

#[test]
fn inactive_rules_are_ignored() {
    let rules = vec![monday_rule("09:00", "10:00").deactivated()];
    assert!(active_rules_for(date(2026, 3, 16), &rules).is_empty());
}

#[test]
fn validity_window_is_inclusive_on_both_ends() {
    let rule = RecurrenceRule::new(
        "t",
        Weekday::Mon,
        "09:00",
        "10:00",
        date(2026, 3, 16),
        Some(date(2026, 3, 30)),
        30,
    )
    .unwrap();
    let rules = vec![rule];

    assert!(active_rules_for(date(2026, 3, 9), &rules).is_empty(), "before valid_from");
    assert_eq!(active_rules_for(date(2026, 3, 16), &rules).len(), 1, "on valid_from");
    assert_eq!(active_rules_for(date(2026, 3, 23), &rules).len(), 1, "inside");
    assert_eq!(active_rules_for(date(2026, 3, 30), &rules).len(), 1, "on valid_until");
    assert!(active_rules_for(date(2026, 4, 6), &rules).is_empty(), "after valid_until");
}

#[test]
fn open_ended_rule_stays_active() {
    let rules = vec![monday_rule("09:00", "10:00")];
    assert_eq!(active_rules_for(date(2030, 3, 18), &rules).len(), 1);
}

#[test]
fn split_day_rules_are_all_returned_in_input_order() {
    let evening = monday_rule("18:00", "20:00");
    let morning = monday_rule("09:00", "11:00");
    let rules = vec![evening.clone(), morning.clone()];

    let active = active_rules_for(date(2026, 3, 16), &rules);
    assert_eq!(active, vec![&evening, &morning]);
}
