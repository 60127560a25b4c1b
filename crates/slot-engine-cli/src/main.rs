//! `slots` CLI - availability, next-slot scans and booking verdicts from the
//! command line.
//!
//! ## Usage
//!
//! ```sh
//! # Bookable slots for one day (schedule document on stdin)
//! slots day --date 2026-03-16 < tutor.json
//!
//! # Next 5 slots, pinned clock, custom policy
//! slots --now 2026-03-16T08:00:00Z --policy policy.json next -i tutor.json -n 5
//!
//! # Rank several providers (JSON array of schedule documents)
//! slots rank -i tutors.json -n 3
//!
//! # Validate a proposal; naive times are read in the provider's timezone
//! slots validate -i tutor.json --start 2026-03-16T10:00 --end 2026-03-16T11:00
//!
//! # Is cancellation still allowed?
//! slots cancel --start 2026-03-17T10:00:00Z
//! ```
//!
//! Business rejections are reported in the JSON output with exit code 0.
//! Malformed input exits non-zero. Set `RUST_LOG=debug` for engine diagnostics
//! on stderr.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use serde::Serialize;
use slot_engine::civil::{self, DstPolicy};
use slot_engine::{
    check_cancellation, AppointmentValidator, AvailabilityScanner, Clock, FixedClock,
    ScheduleDocument, SchedulingPolicy, Slot, SlotGenerator, SystemClock, TimeInterval,
    ValidationResult,
};
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "slots",
    version,
    about = "Provider availability and booking validation"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Scheduling policy JSON file (defaults apply when omitted)
    #[arg(long, global = true)]
    policy: Option<String>,

    /// Pin "now" to an RFC 3339 instant instead of the system clock
    #[arg(long, global = true)]
    now: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List bookable slots for one date
    Day {
        /// Schedule document (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Calendar date in the provider's timezone (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
    },
    /// Find the next available slots, scanning forward from today
    Next {
        /// Schedule document (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Number of slots to collect
        #[arg(short = 'n', long, default_value_t = 5)]
        count: usize,
    },
    /// Rank providers by their earliest available slot
    Rank {
        /// JSON array of schedule documents (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Number of slots to preview per provider
        #[arg(short = 'n', long, default_value_t = 3)]
        count: usize,
    },
    /// Validate a proposed appointment
    Validate {
        /// Schedule document (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Proposed start (RFC 3339, or naive local time in the provider's zone)
        #[arg(long)]
        start: String,
        /// Proposed end (RFC 3339, or naive local time in the provider's zone)
        #[arg(long)]
        end: String,
    },
    /// Check whether an appointment may still be cancelled
    Cancel {
        /// Appointment start (RFC 3339)
        #[arg(long)]
        start: String,
    },
}

#[derive(Serialize)]
struct SlotView {
    start: String,
    end: String,
    local_start: String,
    duration_minutes: u32,
}

impl SlotView {
    fn new(slot: &Slot, tz: Tz) -> Self {
        Self {
            start: slot.start.to_rfc3339(),
            end: slot.end().to_rfc3339(),
            local_start: slot.start.with_timezone(&tz).to_rfc3339(),
            duration_minutes: slot.duration_minutes,
        }
    }
}

#[derive(Serialize)]
struct SlotList {
    provider_id: String,
    timezone: String,
    slots: Vec<SlotView>,
}

#[derive(Serialize)]
struct Verdict {
    valid: bool,
    error: Option<slot_engine::Rejection>,
    message: Option<String>,
}

impl From<ValidationResult> for Verdict {
    fn from(result: ValidationResult) -> Self {
        Self {
            valid: result.valid,
            error: result.error,
            message: result.error.map(|reason| reason.to_string()),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let policy = load_policy(cli.policy.as_deref())?;
    let clock = build_clock(cli.now.as_deref())?;
    let now = clock.now();
    tracing::debug!(%now, "resolved clock");

    match cli.command {
        Commands::Day { input, date } => {
            let doc = read_document(input.as_deref())?;
            let rules = doc.provider_rules();
            let busy = doc.conflict_index();
            let slots = SlotGenerator::with_policy(doc.timezone, &busy, now, &policy)
                .slots_on(date, &rules);
            emit(&slot_list(&doc.provider_id, doc.timezone, &slots))?;
        }
        Commands::Next { input, count } => {
            let doc = read_document(input.as_deref())?;
            let (provider_id, tz) = (doc.provider_id.clone(), doc.timezone);
            let schedule = doc.into_provider_schedule();
            let preview = AvailabilityScanner::new(&policy, now).preview(&schedule, count);
            emit(&slot_list(&provider_id, tz, &preview.slots))?;
        }
        Commands::Rank { input, count } => {
            let json = read_input(input.as_deref())?;
            let docs = ScheduleDocument::many_from_json(&json)
                .context("Failed to parse schedule documents")?;
            let zones: Vec<(String, Tz)> = docs
                .iter()
                .map(|d| (d.provider_id.clone(), d.timezone))
                .collect();
            let schedules: Vec<_> = docs
                .into_iter()
                .map(ScheduleDocument::into_provider_schedule)
                .collect();

            let ranked: Vec<SlotList> = AvailabilityScanner::new(&policy, now)
                .rank(&schedules, count)
                .iter()
                .map(|preview| {
                    let tz = zones
                        .iter()
                        .find(|(id, _)| *id == preview.provider_id)
                        .map_or(Tz::UTC, |(_, tz)| *tz);
                    slot_list(&preview.provider_id, tz, &preview.slots)
                })
                .collect();
            emit(&ranked)?;
        }
        Commands::Validate { input, start, end } => {
            let doc = read_document(input.as_deref())?;
            let start = parse_instant(&start, doc.timezone)?;
            let end = parse_instant(&end, doc.timezone)?;
            let proposed = TimeInterval::new(start, end).context("Invalid proposal")?;

            let rules = doc.provider_rules();
            let busy = doc.conflict_index();
            let verdict = AppointmentValidator::new(doc.timezone, &rules, &busy, &policy)
                .validate(&proposed, now);
            emit(&Verdict::from(verdict))?;
        }
        Commands::Cancel { start } => {
            let start = parse_instant(&start, Tz::UTC)?;
            let verdict = check_cancellation(start, policy.min_cancellation_hours, now);
            emit(&Verdict::from(verdict))?;
        }
    }

    Ok(())
}

fn slot_list(provider_id: &str, tz: Tz, slots: &[Slot]) -> SlotList {
    SlotList {
        provider_id: provider_id.to_string(),
        timezone: tz.name().to_string(),
        slots: slots.iter().map(|slot| SlotView::new(slot, tz)).collect(),
    }
}

fn load_policy(path: Option<&str>) -> Result<SchedulingPolicy> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read policy file: {}", path))?;
            SchedulingPolicy::from_json(&json)
                .with_context(|| format!("Invalid policy file: {}", path))
        }
        None => Ok(SchedulingPolicy::default()),
    }
}

fn build_clock(now: Option<&str>) -> Result<Box<dyn Clock>> {
    match now {
        Some(raw) => {
            let at = DateTime::parse_from_rfc3339(raw)
                .with_context(|| format!("Invalid --now instant: {}", raw))?;
            Ok(Box::new(FixedClock(at.with_timezone(&Utc))))
        }
        None => Ok(Box::new(SystemClock)),
    }
}

/// Parse an RFC 3339 instant, or a naive `YYYY-MM-DDTHH:MM[:SS]` civil time
/// resolved in `tz`.
fn parse_instant(raw: &str, tz: Tz) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .with_context(|| format!("Invalid datetime: {}", raw))?;
    civil::resolve(naive, tz, DstPolicy::Skip)
        .with_context(|| format!("{} does not exist in {}", raw, tz.name()))
}

fn read_document(path: Option<&str>) -> Result<ScheduleDocument> {
    let json = read_input(path)?;
    ScheduleDocument::from_json(&json).context("Failed to parse schedule document")
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn emit<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
