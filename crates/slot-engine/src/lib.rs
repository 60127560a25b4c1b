//! # slot-engine
//!
//! Availability and booking decisions for provider calendars.
//!
//! Given a provider's weekly recurrence rules, explicit blocks and existing
//! bookings, the engine computes which slot start times are bookable on a day,
//! scans forward for the next available slots, and validates a proposed
//! appointment or cancellation with a single, deterministic verdict. Every
//! function is a pure transformation of its explicit inputs, including "now".
//!
//! Wall-clock slot times are resolved against the provider's IANA timezone via
//! `chrono-tz`, so results do not depend on the server's local timezone and
//! stay correct across DST transitions.
//!
//! ## Modules
//!
//! - [`time`]: minute-of-day parsing, half-open intervals, overlap tests
//! - [`model`]: recurrence rules, blocks, bookings
//! - [`recurrence`]: rules active on a date
//! - [`conflict`]: busy intervals from bookings and blocks
//! - [`civil`]: civil time → instant resolution and DST policies
//! - [`slots`]: bookable slots for one day
//! - [`scanner`]: next available slots across days and providers
//! - [`validator`]: booking-time verdicts
//! - [`cancellation`]: cancellation window check
//! - [`gate`]: per-provider serialized validate-then-insert
//! - [`clock`], [`policy`], [`schedule`], [`error`]

pub mod cancellation;
pub mod civil;
pub mod clock;
pub mod conflict;
pub mod error;
pub mod gate;
pub mod model;
pub mod policy;
pub mod recurrence;
pub mod scanner;
pub mod schedule;
pub mod slots;
pub mod time;
pub mod validator;

pub use cancellation::{can_cancel, check_cancellation};
pub use civil::DstPolicy;
pub use clock::{Clock, FixedClock, SystemClock};
pub use conflict::{busy_intervals_for, ConflictIndex};
pub use error::SchedulingError;
pub use gate::{BookingGate, BookingOutcome, BookingRequest, BookingStore};
pub use model::{Block, Booking, BookingStatus, RecurrenceRule};
pub use policy::SchedulingPolicy;
pub use recurrence::active_rules_for;
pub use scanner::{next_available, AvailabilityScanner, ProviderPreview, ProviderSchedule};
pub use schedule::ScheduleDocument;
pub use slots::{generate_slots, Slot, SlotGenerator};
pub use time::{overlaps, to_minutes, TimeInterval};
pub use validator::{AppointmentValidator, Rejection, ValidationResult};
