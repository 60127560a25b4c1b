//! JSON schedule documents: the per-provider input bundle handed over by the
//! rule/block/booking store.
//!
//! ```json
//! {
//!   "provider_id": "tutor-1",
//!   "timezone": "Europe/Berlin",
//!   "rules": [{"provider_id": "tutor-1", "day_of_week": 1, "start_time": "09:00",
//!              "end_time": "11:00", "valid_from": "2026-01-01", "slot_duration_minutes": 30}],
//!   "blocks": [{"provider_id": null, "start": "2026-12-24T00:00:00Z", "end": "2026-12-27T00:00:00Z"}],
//!   "bookings": [{"provider_id": "tutor-1", "consumer_id": "s-9", "status": "confirmed",
//!                 "start": "2026-03-16T08:30:00Z", "end": "2026-03-16T09:00:00Z"}]
//! }
//! ```

use chrono_tz::Tz;
use serde::Deserialize;

use crate::civil;
use crate::conflict::ConflictIndex;
use crate::error::{Result, SchedulingError};
use crate::model::{Block, Booking, ProviderId, RecurrenceRule};
use crate::scanner::ProviderSchedule;

/// Rules, blocks and bookings for one provider, already tenant-filtered.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleDocument {
    pub provider_id: ProviderId,
    pub timezone: Tz,
    pub rules: Vec<RecurrenceRule>,
    pub blocks: Vec<Block>,
    pub bookings: Vec<Booking>,
}

#[derive(Deserialize)]
struct RawDocument {
    provider_id: ProviderId,
    timezone: String,
    #[serde(default)]
    rules: Vec<RecurrenceRule>,
    #[serde(default)]
    blocks: Vec<Block>,
    #[serde(default)]
    bookings: Vec<Booking>,
}

impl TryFrom<RawDocument> for ScheduleDocument {
    type Error = SchedulingError;

    fn try_from(raw: RawDocument) -> Result<Self> {
        Ok(Self {
            timezone: civil::parse_timezone(&raw.timezone)?,
            provider_id: raw.provider_id,
            rules: raw.rules,
            blocks: raw.blocks,
            bookings: raw.bookings,
        })
    }
}

impl ScheduleDocument {
    /// Parse and validate a single-provider document.
    ///
    /// # Errors
    /// `InvalidDocument` for malformed JSON or invalid rows (the row error is
    /// included in the message); `InvalidTimezone` for unknown zone names.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawDocument = serde_json::from_str(json)
            .map_err(|e| SchedulingError::InvalidDocument(e.to_string()))?;
        Self::try_from(raw)
    }

    /// Parse a JSON array of documents.
    pub fn many_from_json(json: &str) -> Result<Vec<Self>> {
        let raws: Vec<RawDocument> = serde_json::from_str(json)
            .map_err(|e| SchedulingError::InvalidDocument(e.to_string()))?;
        raws.into_iter().map(Self::try_from).collect()
    }

    /// This provider's rules. Rows for other providers are ignored.
    pub fn provider_rules(&self) -> Vec<RecurrenceRule> {
        self.rules
            .iter()
            .filter(|rule| rule.provider_id == self.provider_id)
            .cloned()
            .collect()
    }

    pub fn conflict_index(&self) -> ConflictIndex {
        ConflictIndex::for_provider(&self.provider_id, &self.bookings, &self.blocks)
    }

    pub fn into_provider_schedule(self) -> ProviderSchedule {
        ProviderSchedule {
            rules: self.provider_rules(),
            busy: self.conflict_index(),
            provider_id: self.provider_id,
            timezone: self.timezone,
        }
    }
}
