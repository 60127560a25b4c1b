//! Tests for day-by-day "next available" scanning and provider ranking.

use chrono::{DateTime, NaiveDate, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use slot_engine::conflict::ConflictIndex;
use slot_engine::model::RecurrenceRule;
use slot_engine::policy::SchedulingPolicy;
use slot_engine::scanner::{next_available, AvailabilityScanner, ProviderSchedule};
use slot_engine::time::TimeInterval;

// ── Helpers ─────────────────────────────────────────────────────────────────

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

fn rule(provider: &str, weekday: Weekday, start: &str, end: &str) -> RecurrenceRule {
    RecurrenceRule::new(provider, weekday, start, end, date(2026, 1, 1), None, 60).unwrap()
}

fn schedule(provider: &str, rules: Vec<RecurrenceRule>) -> ProviderSchedule {
    ProviderSchedule {
        provider_id: provider.to_string(),
        timezone: Tz::UTC,
        rules,
        busy: ConflictIndex::default(),
    }
}

// ── next_slots ──────────────────────────────────────────────────────────────

#[test]
fn collects_across_days_until_count_reached() {
    // Mon 09-11 and Wed 09-11, 60-minute slots. Now = Monday 2026-03-16 10:30.
    let rules = vec![
        rule("t", Weekday::Mon, "09:00", "11:00"),
        rule("t", Weekday::Wed, "09:00", "11:00"),
    ];
    let policy = SchedulingPolicy::default();
    let slots = next_available(&rules, &ConflictIndex::default(), Tz::UTC, utc(2026, 3, 16, 10, 30), 3, &policy);

    let starts: Vec<_> = slots.iter().map(|s| s.start).collect();
    assert_eq!(
        starts,
        vec![utc(2026, 3, 18, 9, 0), utc(2026, 3, 18, 10, 0), utc(2026, 3, 23, 9, 0)]
    );
}

#[test]
fn result_is_capped_mid_day() {
    let rules = vec![rule("t", Weekday::Mon, "09:00", "17:00")];
    let policy = SchedulingPolicy::default();
    let slots = next_available(&rules, &ConflictIndex::default(), Tz::UTC, utc(2026, 3, 16, 0, 0), 2, &policy);
    assert_eq!(slots.len(), 2);
    assert_eq!(slots[1].start, utc(2026, 3, 16, 10, 0));
}

#[test]
fn zero_count_returns_nothing() {
    let rules = vec![rule("t", Weekday::Mon, "09:00", "17:00")];
    let policy = SchedulingPolicy::default();
    assert!(next_available(&rules, &ConflictIndex::default(), Tz::UTC, utc(2026, 3, 16, 0, 0), 0, &policy).is_empty());
}

#[test]
fn no_rules_is_an_empty_non_error_result() {
    let policy = SchedulingPolicy::default();
    assert!(next_available(&[], &ConflictIndex::default(), Tz::UTC, utc(2026, 3, 16, 0, 0), 5, &policy).is_empty());
}

#[test]
fn day_ceiling_bounds_the_scan() {
    // Only Mondays; now is Tuesday. A 6-day ceiling (Tue..Sun) finds nothing, 7 finds Monday.
    let rules = vec![rule("t", Weekday::Mon, "09:00", "10:00")];
    let now = utc(2026, 3, 17, 0, 0);

    let short = SchedulingPolicy { max_scan_days: 6, ..SchedulingPolicy::default() };
    assert!(next_available(&rules, &ConflictIndex::default(), Tz::UTC, now, 1, &short).is_empty());

    let week = SchedulingPolicy { max_scan_days: 7, ..SchedulingPolicy::default() };
    let slots = next_available(&rules, &ConflictIndex::default(), Tz::UTC, now, 1, &week);
    assert_eq!(slots[0].start, utc(2026, 3, 23, 9, 0));
}

#[test]
fn busy_intervals_span_the_whole_scan() {
    // Two weeks of Mondays; the first Monday is fully booked.
    let rules = vec![rule("t", Weekday::Mon, "09:00", "10:00")];
    let busy = ConflictIndex::new(vec![
        TimeInterval::new(utc(2026, 3, 16, 9, 0), utc(2026, 3, 16, 10, 0)).unwrap(),
    ]);
    let policy = SchedulingPolicy::default();
    let slots = next_available(&rules, &busy, Tz::UTC, utc(2026, 3, 15, 0, 0), 1, &policy);
    assert_eq!(slots[0].start, utc(2026, 3, 23, 9, 0));
}

#[test]
fn today_is_the_civil_date_in_provider_timezone() {
    // 2026-03-15 20:00 UTC is already Monday 2026-03-16 05:00 in Tokyo.
    let rules = vec![rule("t", Weekday::Mon, "09:00", "10:00")];
    let policy = SchedulingPolicy { max_scan_days: 1, ..SchedulingPolicy::default() };
    let slots = next_available(
        &rules,
        &ConflictIndex::default(),
        chrono_tz::Asia::Tokyo,
        utc(2026, 3, 15, 20, 0),
        1,
        &policy,
    );
    // 09:00 JST Monday = 00:00 UTC Monday.
    assert_eq!(slots[0].start, utc(2026, 3, 16, 0, 0));
}

// ── rank ────────────────────────────────────────────────────────────────────

#[test]
fn providers_rank_by_earliest_slot_with_empty_last() {
    let policy = SchedulingPolicy::default();
    let scanner = AvailabilityScanner::new(&policy, utc(2026, 3, 16, 0, 0));

    let schedules = vec![
        schedule("nobody", vec![]),
        schedule("wednesday", vec![rule("wednesday", Weekday::Wed, "09:00", "10:00")]),
        schedule("monday", vec![rule("monday", Weekday::Mon, "12:00", "13:00")]),
        schedule("also-nobody", vec![]),
    ];

    let ranked = scanner.rank(&schedules, 2);
    let order: Vec<&str> = ranked.iter().map(|p| p.provider_id.as_str()).collect();
    assert_eq!(order, vec!["monday", "wednesday", "nobody", "also-nobody"]);
    assert_eq!(ranked[0].earliest(), Some(utc(2026, 3, 16, 12, 0)));
    assert_eq!(ranked[2].earliest(), None);
}

#[test]
fn preview_respects_provider_busy_set() {
    let policy = SchedulingPolicy::default();
    let scanner = AvailabilityScanner::new(&policy, utc(2026, 3, 16, 0, 0));
    let mut s = schedule("t", vec![rule("t", Weekday::Mon, "09:00", "11:00")]);
    s.busy = ConflictIndex::new(vec![
        TimeInterval::new(utc(2026, 3, 16, 9, 0), utc(2026, 3, 16, 10, 0)).unwrap(),
    ]);

    let preview = scanner.preview(&s, 1);
    assert_eq!(preview.slots[0].start, utc(2026, 3, 16, 10, 0));
}
