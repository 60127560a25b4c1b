use chrono::{Duration, NaiveDate, TimeZone, Utc, Weekday};
use criterion::{criterion_group, criterion_main, Criterion};
use slot_engine::conflict::ConflictIndex;
use slot_engine::model::RecurrenceRule;
use slot_engine::policy::SchedulingPolicy;
use slot_engine::scanner::next_available;
use slot_engine::time::TimeInterval;
use std::hint::black_box;

fn weekday_rules() -> Vec<RecurrenceRule> {
    let from = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri]
        .into_iter()
        .flat_map(|day| {
            [("08:00", "12:00"), ("13:00", "18:00")]
                .into_iter()
                .map(move |(start, end)| {
                    RecurrenceRule::new("tutor-1", day, start, end, from, None, 30).unwrap()
                })
        })
        .collect()
}

/// Every other half hour booked for two weeks.
fn busy_fortnight() -> ConflictIndex {
    let base = Utc.with_ymd_and_hms(2026, 3, 16, 0, 0, 0).unwrap();
    (0..14 * 24)
        .map(|half_hour_pair| {
            let start = base + Duration::minutes(half_hour_pair * 60);
            TimeInterval::new(start, start + Duration::minutes(30)).unwrap()
        })
        .collect()
}

fn bench_scanner(c: &mut Criterion) {
    let rules = weekday_rules();
    let busy = busy_fortnight();
    let policy = SchedulingPolicy::default();
    let now = Utc.with_ymd_and_hms(2026, 3, 16, 7, 0, 0).unwrap();
    let tz = chrono_tz::Europe::Berlin;

    c.bench_function("next_available/10_slots", |b| {
        b.iter(|| next_available(black_box(&rules), &busy, tz, now, 10, &policy))
    });

    c.bench_function("next_available/exhaust_14_days", |b| {
        b.iter(|| next_available(black_box(&rules), &busy, tz, now, 10_000, &policy))
    });
}

criterion_group!(benches, bench_scanner);
criterion_main!(benches);
