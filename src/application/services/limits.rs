//! # Limit Tracker
//!
//! Rolling-window admission control for trader requisites.
//!
//! Each requisite carries an `operation_limit` (reservations per window),
//! a `sum_limit` (cumulative amount per window) and an `interval_minutes`
//! window length, where 0 means the limits are all-time. Admission holds
//! when both
//!
//! ```text
//! count(window) < operation_limit
//! sum(window) + amount <= sum_limit
//! ```
//!
//! evaluated over `[now - interval, now]`.
//!
//! Check-and-commit runs under a per-requisite exclusive guard, so two
//! concurrent reservations against the same requisite serialize and the
//! limits can never be oversubscribed. Releases are idempotent: the
//! dispatcher releases on rollback and the reconciler on settlement or
//! failure, and a duplicate release is a no-op.

use crate::domain::entities::ProviderRequisite;
use crate::domain::value_objects::timestamp::Timestamp;
use crate::domain::value_objects::{Amount, RequisiteId, ReservationId};
use dashmap::DashMap;
use rust_decimal::Decimal;
use thiserror::Error;

/// Why a reservation was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionDenied {
    /// The per-window reservation count is exhausted.
    #[error("operation limit reached: {limit} reservations in window")]
    OperationLimit {
        /// The requisite's per-window count limit.
        limit: u32,
    },

    /// The reservation would push the window sum over the limit.
    #[error("sum limit exceeded: window holds {current}, limit {limit}")]
    SumLimit {
        /// Amount already reserved in the window.
        current: Decimal,
        /// The requisite's per-window sum limit.
        limit: Decimal,
    },
}

/// A granted quota reservation.
///
/// The holder must eventually release it (directly or through the
/// reconciler) or the capacity stays consumed for the rest of the window.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct Reservation {
    /// Unique reservation id.
    pub id: ReservationId,
    /// Requisite the capacity was taken from.
    pub requisite_id: RequisiteId,
    /// Reserved amount.
    pub amount: Amount,
    /// When the reservation was granted.
    pub reserved_at: Timestamp,
}

/// Current window usage of a requisite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Usage {
    /// Live reservations inside the window.
    pub count: u32,
    /// Total reserved amount inside the window.
    pub sum: Decimal,
}

#[derive(Debug, Clone)]
struct LedgerEntry {
    id: ReservationId,
    amount: Decimal,
    reserved_at: Timestamp,
}

/// In-memory rolling-window quota tracker.
#[derive(Debug, Default)]
pub struct LimitTracker {
    ledgers: DashMap<RequisiteId, Vec<LedgerEntry>>,
    index: DashMap<ReservationId, RequisiteId>,
}

impl LimitTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to reserve `amount` against the requisite's window.
    ///
    /// Entries that fell out of the window are pruned on the way, so a
    /// requisite that went quiet does not accumulate dead ledger state.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionDenied`] when either window limit would be
    /// violated.
    pub fn try_reserve(
        &self,
        requisite: &ProviderRequisite,
        amount: Amount,
        now: Timestamp,
    ) -> Result<Reservation, AdmissionDenied> {
        // Entry guard: exclusive access to this requisite's ledger for
        // the whole check-and-commit.
        let mut ledger = self.ledgers.entry(requisite.id().clone()).or_default();

        if let Some(window_start) = requisite.window_start(now) {
            let mut pruned = Vec::new();
            ledger.retain(|entry| {
                let keep = !entry.reserved_at.is_before(&window_start);
                if !keep {
                    pruned.push(entry.id);
                }
                keep
            });
            for id in pruned {
                self.index.remove(&id);
            }
        }

        let count = ledger.len() as u32;
        // Checked arithmetic: an overflowing window sum denies admission
        // instead of panicking under overflow-checked profiles.
        let sum = ledger
            .iter()
            .try_fold(Decimal::ZERO, |acc, entry| acc.checked_add(entry.amount));

        if count >= requisite.operation_limit() {
            return Err(AdmissionDenied::OperationLimit {
                limit: requisite.operation_limit(),
            });
        }
        match sum.and_then(|current| current.checked_add(amount.get())) {
            Some(projected) if projected <= requisite.sum_limit().get() => {}
            _ => {
                return Err(AdmissionDenied::SumLimit {
                    current: sum.unwrap_or(Decimal::MAX),
                    limit: requisite.sum_limit().get(),
                });
            }
        }

        let reservation = Reservation {
            id: ReservationId::new_v4(),
            requisite_id: requisite.id().clone(),
            amount,
            reserved_at: now,
        };
        ledger.push(LedgerEntry {
            id: reservation.id,
            amount: amount.get(),
            reserved_at: now,
        });
        self.index.insert(reservation.id, reservation.requisite_id.clone());
        Ok(reservation)
    }

    /// Releases a reservation, freeing its capacity immediately.
    ///
    /// Returns false if the reservation is unknown or already released.
    pub fn release(&self, reservation_id: &ReservationId) -> bool {
        let Some((_, requisite_id)) = self.index.remove(reservation_id) else {
            return false;
        };
        if let Some(mut ledger) = self.ledgers.get_mut(&requisite_id) {
            ledger.retain(|entry| entry.id != *reservation_id);
        }
        true
    }

    /// Returns the requisite's live usage within the window ending at `now`.
    #[must_use]
    pub fn usage(&self, requisite: &ProviderRequisite, now: Timestamp) -> Usage {
        let Some(ledger) = self.ledgers.get(requisite.id()) else {
            return Usage::default();
        };
        let window_start = requisite.window_start(now);
        let mut usage = Usage::default();
        for entry in ledger.iter() {
            if let Some(start) = window_start {
                if entry.reserved_at.is_before(&start) {
                    continue;
                }
            }
            usage.count += 1;
            usage.sum = usage.sum.saturating_add(entry.amount);
        }
        usage
    }
}
