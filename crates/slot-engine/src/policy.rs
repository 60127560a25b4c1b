//! Tunable scheduling policy values.

use serde::{Deserialize, Serialize};

use crate::civil::DstPolicy;
use crate::error::{Result, SchedulingError};
use crate::time::MINUTES_PER_DAY;

/// Policy knobs shared by the generator, scanner, validator and cancellation
/// check. Every field has a default, so a partial JSON document is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingPolicy {
    /// Minimum lead time between "now" and a bookable start.
    pub min_advance_minutes: u32,
    /// Shortest appointment accepted by the validator.
    pub min_duration_minutes: u32,
    /// Longest appointment accepted by the validator.
    pub max_duration_minutes: u32,
    /// Minimum lead time before an appointment for it to be cancelled.
    pub min_cancellation_hours: u32,
    /// Day ceiling for "next available" scans.
    pub max_scan_days: u32,
    /// Overrides every rule's own slot duration when set.
    pub slot_duration_override: Option<u32>,
    pub dst_policy: DstPolicy,
}

impl Default for SchedulingPolicy {
    fn default() -> Self {
        Self {
            min_advance_minutes: 0,
            min_duration_minutes: 15,
            max_duration_minutes: 120,
            min_cancellation_hours: 24,
            max_scan_days: 14,
            slot_duration_override: None,
            dst_policy: DstPolicy::WallClock,
        }
    }
}

impl SchedulingPolicy {
    /// Parse a policy from JSON, filling omitted fields with defaults.
    ///
    /// # Errors
    /// `InvalidDocument` for malformed JSON, or when the duration bounds are
    /// reversed or the slot override is zero or longer than a day.
    pub fn from_json(json: &str) -> Result<Self> {
        let policy: SchedulingPolicy = serde_json::from_str(json)
            .map_err(|e| SchedulingError::InvalidDocument(format!("policy: {}", e)))?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_duration_minutes > self.max_duration_minutes {
            return Err(SchedulingError::InvalidDocument(format!(
                "min_duration_minutes {} exceeds max_duration_minutes {}",
                self.min_duration_minutes, self.max_duration_minutes
            )));
        }
        if let Some(minutes) = self.slot_duration_override {
            if minutes == 0 || minutes > MINUTES_PER_DAY {
                return Err(SchedulingError::InvalidDocument(format!(
                    "slot_duration_override {} outside 1..={}",
                    minutes, MINUTES_PER_DAY
                )));
            }
        }
        Ok(())
    }
}
