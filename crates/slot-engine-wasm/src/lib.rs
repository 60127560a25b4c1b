//! WASM bindings for slot-engine.
//!
//! Exposes slot generation, next-available scans, booking validation and the
//! cancellation check to JavaScript via `wasm-bindgen`. All complex types are
//! passed as JSON strings. "now" is always an explicit argument, so results are
//! reproducible on the JavaScript side.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p slot-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target nodejs --out-dir packages/slot-engine-js/wasm/ \
//!   target/wasm32-unknown-unknown/release/slot_engine_wasm.wasm
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use slot_engine::civil::{self, DstPolicy};
use slot_engine::{
    AppointmentValidator, AvailabilityScanner, ScheduleDocument, SchedulingPolicy, Slot,
    SlotGenerator, TimeInterval,
};
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Serde-friendly DTOs for crossing the WASM boundary as JSON
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct SlotDto {
    start: String,
    end: String,
    duration_minutes: u32,
}

impl From<&Slot> for SlotDto {
    fn from(slot: &Slot) -> Self {
        Self {
            start: slot.start.to_rfc3339(),
            end: slot.end().to_rfc3339(),
            duration_minutes: slot.duration_minutes,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse an ISO 8601 datetime string into `DateTime<Utc>`.
///
/// Accepts RFC 3339 (with offset) and naive datetimes, which are read as UTC.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .map(|ndt| ndt.and_utc())
        .map_err(|e| format!("Invalid datetime '{}': {}", s, e))
}

/// Parse an RFC 3339 instant, or a naive `YYYY-MM-DDTHH:MM[:SS]` civil time
/// read in the provider's timezone `tz`. Naive times inside a DST gap are
/// rejected.
fn parse_local_datetime(s: &str, tz: Tz) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .map_err(|e| format!("Invalid datetime '{}': {}", s, e))?;
    civil::resolve(naive, tz, DstPolicy::Skip)
        .ok_or_else(|| format!("'{}' does not exist in {}", s, tz.name()))
}

fn parse_policy(policy_json: Option<&str>) -> Result<SchedulingPolicy, String> {
    match policy_json {
        Some(json) => SchedulingPolicy::from_json(json).map_err(|e| e.to_string()),
        None => Ok(SchedulingPolicy::default()),
    }
}

fn parse_schedule(schedule_json: &str) -> Result<ScheduleDocument, String> {
    ScheduleDocument::from_json(schedule_json).map_err(|e| e.to_string())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Serialization error: {}", e))
}

fn slots_json(slots: &[Slot]) -> Result<String, String> {
    let dtos: Vec<SlotDto> = slots.iter().map(SlotDto::from).collect();
    to_json(&dtos)
}

fn generate_slots_impl(
    schedule_json: &str,
    date: &str,
    now: &str,
    policy_json: Option<&str>,
) -> Result<String, String> {
    let doc = parse_schedule(schedule_json)?;
    let policy = parse_policy(policy_json)?;
    let date: NaiveDate = date
        .parse()
        .map_err(|e| format!("Invalid date '{}': {}", date, e))?;
    let now = parse_datetime(now)?;

    let rules = doc.provider_rules();
    let busy = doc.conflict_index();
    let slots = SlotGenerator::with_policy(doc.timezone, &busy, now, &policy).slots_on(date, &rules);
    slots_json(&slots)
}

fn next_available_impl(
    schedule_json: &str,
    now: &str,
    count: u32,
    policy_json: Option<&str>,
) -> Result<String, String> {
    let schedule = parse_schedule(schedule_json)?.into_provider_schedule();
    let policy = parse_policy(policy_json)?;
    let now = parse_datetime(now)?;

    let preview = AvailabilityScanner::new(&policy, now).preview(&schedule, count as usize);
    slots_json(&preview.slots)
}

fn validate_impl(
    schedule_json: &str,
    start: &str,
    end: &str,
    now: &str,
    policy_json: Option<&str>,
) -> Result<String, String> {
    let doc = parse_schedule(schedule_json)?;
    let policy = parse_policy(policy_json)?;
    let proposed = TimeInterval::new(
        parse_local_datetime(start, doc.timezone)?,
        parse_local_datetime(end, doc.timezone)?,
    )
    .map_err(|e| e.to_string())?;
    let now = parse_datetime(now)?;

    let rules = doc.provider_rules();
    let busy = doc.conflict_index();
    let verdict =
        AppointmentValidator::new(doc.timezone, &rules, &busy, &policy).validate(&proposed, now);
    to_json(&verdict)
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Bookable slots for one date.
///
/// Returns a JSON array of `{start, end, duration_minutes}` objects with RFC
/// 3339 datetime strings.
///
/// # Arguments
/// - `schedule_json` -- schedule document (`provider_id`, `timezone`, `rules`, `blocks`, `bookings`)
/// - `date` -- calendar date in the provider's timezone (e.g., "2026-03-16")
/// - `now` -- current instant (ISO 8601)
/// - `policy_json` -- optional scheduling policy; defaults apply when omitted
#[wasm_bindgen(js_name = "generateSlots")]
pub fn generate_slots(
    schedule_json: &str,
    date: &str,
    now: &str,
    policy_json: Option<String>,
) -> Result<String, JsValue> {
    generate_slots_impl(schedule_json, date, now, policy_json.as_deref())
        .map_err(|e| JsValue::from_str(&e))
}

/// The next `count` bookable slots starting today, within the policy's day ceiling.
#[wasm_bindgen(js_name = "nextAvailable")]
pub fn next_available(
    schedule_json: &str,
    now: &str,
    count: u32,
    policy_json: Option<String>,
) -> Result<String, JsValue> {
    next_available_impl(schedule_json, now, count, policy_json.as_deref())
        .map_err(|e| JsValue::from_str(&e))
}

/// Validate a proposed appointment. Returns `{valid, error}` as JSON, where
/// `error` is null or one of the snake_case rejection names.
///
/// `start` and `end` without an offset are read in the schedule's timezone.
#[wasm_bindgen(js_name = "validateAppointment")]
pub fn validate_appointment(
    schedule_json: &str,
    start: &str,
    end: &str,
    now: &str,
    policy_json: Option<String>,
) -> Result<String, JsValue> {
    validate_impl(schedule_json, start, end, now, policy_json.as_deref())
        .map_err(|e| JsValue::from_str(&e))
}

/// Whether an appointment starting at `start` may still be cancelled.
#[wasm_bindgen(js_name = "canCancel")]
pub fn can_cancel(start: &str, now: &str, min_hours_before: u32) -> Result<bool, JsValue> {
    let start = parse_datetime(start).map_err(|e| JsValue::from_str(&e))?;
    let now = parse_datetime(now).map_err(|e| JsValue::from_str(&e))?;
    Ok(slot_engine::can_cancel(start, min_hours_before, now))
}
