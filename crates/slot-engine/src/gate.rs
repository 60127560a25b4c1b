//! Race-free booking writes.
//!
//! Two requests validated against the same snapshot can both pass and then both
//! persist. [`BookingGate`] closes that window: it serializes writers per
//! provider, re-reads a fresh snapshot inside the critical section, re-runs the
//! full validator against it and inserts only on a valid verdict.
//!
//! The lock table is process-local. Deployments with several writer processes
//! need the store itself to provide the same guarantee (a transaction with an
//! overlap constraint or an advisory lock keyed by provider).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono_tz::Tz;
use thiserror::Error;

use crate::clock::Clock;
use crate::conflict::ConflictIndex;
use crate::model::{Block, Booking, BookingStatus, ProviderId, RecurrenceRule};
use crate::policy::SchedulingPolicy;
use crate::schedule::ScheduleDocument;
use crate::time::TimeInterval;
use crate::validator::{AppointmentValidator, Rejection};

/// Everything the validator needs about one provider at one instant.
#[derive(Debug, Clone)]
pub struct ProviderSnapshot {
    pub timezone: Tz,
    pub rules: Vec<RecurrenceRule>,
    pub blocks: Vec<Block>,
    pub bookings: Vec<Booking>,
}

/// Persistence collaborator behind the gate.
pub trait BookingStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Current rules, blocks and bookings for `provider_id`.
    fn snapshot(&self, provider_id: &str) -> Result<ProviderSnapshot, Self::Error>;

    fn insert(&self, booking: Booking) -> Result<(), Self::Error>;
}

/// A consumer's request for one interval with one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    pub provider_id: ProviderId,
    pub consumer_id: String,
    pub interval: TimeInterval,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingOutcome {
    Booked(Booking),
    Rejected(Rejection),
}

/// Serializes validate-then-insert per provider.
#[derive(Debug, Default)]
pub struct BookingGate {
    policy: SchedulingPolicy,
    locks: Mutex<HashMap<ProviderId, Arc<Mutex<()>>>>,
}

impl BookingGate {
    pub fn new(policy: SchedulingPolicy) -> Self {
        Self {
            policy,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> &SchedulingPolicy {
        &self.policy
    }

    /// Validate `request` against a fresh snapshot and insert it, holding the
    /// provider's lock for the whole sequence.
    ///
    /// # Errors
    /// Only store failures are errors; rule violations are
    /// [`BookingOutcome::Rejected`].
    pub fn book<S, C>(
        &self,
        store: &S,
        clock: &C,
        request: BookingRequest,
    ) -> Result<BookingOutcome, S::Error>
    where
        S: BookingStore + ?Sized,
        C: Clock + ?Sized,
    {
        let provider_id = request.provider_id.clone();
        let lock = self.provider_lock(&provider_id);
        let outcome = {
            // The guarded value is `()`, so a poisoned lock carries no broken state.
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.validate_and_insert(store, clock, request)
        };
        self.release_lock(&provider_id, lock);
        outcome
    }

    /// Number of providers with a lock entry. Entries are dropped once no
    /// request for the provider is in flight.
    pub fn tracked_providers(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn validate_and_insert<S, C>(
        &self,
        store: &S,
        clock: &C,
        request: BookingRequest,
    ) -> Result<BookingOutcome, S::Error>
    where
        S: BookingStore + ?Sized,
        C: Clock + ?Sized,
    {
        let snapshot = store.snapshot(&request.provider_id)?;
        let busy =
            ConflictIndex::for_provider(&request.provider_id, &snapshot.bookings, &snapshot.blocks);
        let validator =
            AppointmentValidator::new(snapshot.timezone, &snapshot.rules, &busy, &self.policy);

        if let Some(reason) = validator.validate(&request.interval, clock.now()).error {
            tracing::debug!(provider = %request.provider_id, %reason, "booking rejected");
            return Ok(BookingOutcome::Rejected(reason));
        }

        let booking = Booking {
            provider_id: request.provider_id,
            consumer_id: request.consumer_id,
            interval: request.interval,
            status: BookingStatus::Pending,
        };
        store.insert(booking.clone())?;
        tracing::debug!(provider = %booking.provider_id, start = %booking.interval.start(), "booking stored");
        Ok(BookingOutcome::Booked(booking))
    }

    fn provider_lock(&self, provider_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(provider_id.to_string()).or_default())
    }

    /// Drop this request's handle and remove the provider's entry once the table
    /// is its only owner. Handles are cloned and dropped only under the table
    /// lock, so the count is stable while it is held.
    fn release_lock(&self, provider_id: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        drop(lock);
        if locks
            .get(provider_id)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            locks.remove(provider_id);
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("booking store lock poisoned")]
    Poisoned,

    #[error("unknown provider: {0}")]
    UnknownProvider(ProviderId),
}

/// Thread-safe in-memory store for one provider's schedule.
#[derive(Debug)]
pub struct InMemoryBookingStore {
    provider_id: ProviderId,
    timezone: Tz,
    rules: Vec<RecurrenceRule>,
    blocks: Vec<Block>,
    bookings: RwLock<Vec<Booking>>,
}

impl InMemoryBookingStore {
    pub fn new(document: ScheduleDocument) -> Self {
        Self {
            rules: document.provider_rules(),
            provider_id: document.provider_id,
            timezone: document.timezone,
            blocks: document.blocks,
            bookings: RwLock::new(document.bookings),
        }
    }

    /// Copy of every stored booking, in insertion order.
    pub fn bookings(&self) -> Result<Vec<Booking>, StoreError> {
        self.bookings
            .read()
            .map(|bookings| bookings.clone())
            .map_err(|_| StoreError::Poisoned)
    }
}

impl BookingStore for InMemoryBookingStore {
    type Error = StoreError;

    fn snapshot(&self, provider_id: &str) -> Result<ProviderSnapshot, StoreError> {
        if provider_id != self.provider_id {
            return Err(StoreError::UnknownProvider(provider_id.to_string()));
        }
        Ok(ProviderSnapshot {
            timezone: self.timezone,
            rules: self.rules.clone(),
            blocks: self.blocks.clone(),
            bookings: self.bookings()?,
        })
    }

    fn insert(&self, booking: Booking) -> Result<(), StoreError> {
        self.bookings
            .write()
            .map_err(|_| StoreError::Poisoned)?
            .push(booking);
        Ok(())
    }
}
