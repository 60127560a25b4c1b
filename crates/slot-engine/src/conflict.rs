//! Aggregate bookings and blocks into a provider's busy intervals.
//!
//! The index is a membership set for overlap testing: intervals are kept in the
//! order they were collected and never coalesced. Adjacent intervals (one ends
//! exactly when another starts) are NOT conflicts.

use chrono::{DateTime, Utc};

use crate::model::{Block, Booking};
use crate::time::{self, TimeInterval};

/// Busy intervals for one provider: non-cancelled bookings plus the blocks that
/// apply to it (its own and tenant-wide ones).
pub fn busy_intervals_for(
    provider_id: &str,
    bookings: &[Booking],
    blocks: &[Block],
) -> Vec<TimeInterval> {
    let booked = bookings
        .iter()
        .filter(|b| b.provider_id == provider_id && b.is_busy())
        .map(|b| b.interval);
    let blocked = blocks
        .iter()
        .filter(|b| b.applies_to(provider_id))
        .map(|b| b.interval);

    booked.chain(blocked).collect()
}

/// An opaque set of busy intervals answering "does this overlap anything?".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictIndex {
    busy: Vec<TimeInterval>,
}

impl ConflictIndex {
    pub fn new(busy: Vec<TimeInterval>) -> Self {
        Self { busy }
    }

    /// Build the index for `provider_id` from raw bookings and blocks.
    pub fn for_provider(provider_id: &str, bookings: &[Booking], blocks: &[Block]) -> Self {
        Self::new(busy_intervals_for(provider_id, bookings, blocks))
    }

    pub fn intervals(&self) -> &[TimeInterval] {
        &self.busy
    }

    pub fn len(&self) -> usize {
        self.busy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.busy.is_empty()
    }

    /// True when `candidate` overlaps at least one busy interval.
    pub fn conflicts_with(&self, candidate: &TimeInterval) -> bool {
        self.busy.iter().any(|busy| time::overlaps(candidate, busy))
    }

    /// Every busy interval overlapping `candidate`, with the overlap in minutes.
    pub fn conflicting<'a>(
        &'a self,
        candidate: &'a TimeInterval,
    ) -> impl Iterator<Item = (&'a TimeInterval, i64)> + 'a {
        self.busy
            .iter()
            .filter(move |busy| time::overlaps(candidate, busy))
            .map(move |busy| (busy, time::overlap_minutes(candidate, busy)))
    }

    /// Sorted, coalesced busy timeline clipped to `[window_start, window_end)`.
    ///
    /// Overlapping and adjacent intervals are merged. Used for display; the
    /// booking decisions only need [`conflicts_with`](Self::conflicts_with).
    pub fn merged_within(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Vec<TimeInterval> {
        let mut clipped: Vec<(DateTime<Utc>, DateTime<Utc>)> = self
            .busy
            .iter()
            .filter(|i| i.start() < window_end && i.end() > window_start)
            .map(|i| (i.start().max(window_start), i.end().min(window_end)))
            .collect();

        clipped.sort_by_key(|&(start, end)| (start, end));

        let mut merged: Vec<(DateTime<Utc>, DateTime<Utc>)> = Vec::new();
        for (start, end) in clipped {
            if let Some(last) = merged.last_mut() {
                if start <= last.1 {
                    last.1 = last.1.max(end);
                    continue;
                }
            }
            merged.push((start, end));
        }

        // Clipping to a non-empty window keeps start < end for every entry.
        merged
            .into_iter()
            .filter_map(|(start, end)| TimeInterval::new(start, end).ok())
            .collect()
    }
}

impl From<Vec<TimeInterval>> for ConflictIndex {
    fn from(busy: Vec<TimeInterval>) -> Self {
        Self::new(busy)
    }
}

impl FromIterator<TimeInterval> for ConflictIndex {
    fn from_iter<I: IntoIterator<Item = TimeInterval>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
