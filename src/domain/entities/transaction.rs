//! # Transaction
//!
//! A single dispatch attempt of a payment collection.
//!
//! Each transaction belongs to exactly one [`DispatchRequest`] and records
//! which provider it was assigned to, the reservation it holds against a
//! requisite's quota (if any), and the external reference partners use to
//! confirm it. Escalation never mutates a failed attempt in place; it
//! creates a fresh transaction under the same request with `attempt + 1`.
//!
//! All state changes go through [`Transaction::transition_to`] so that the
//! status graph in [`TransactionStatus`] is the single source of truth.
//!
//! [`DispatchRequest`]: crate::domain::entities::dispatch_request::DispatchRequest

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::timestamp::Timestamp;
use crate::domain::value_objects::{
    Amount, ExternalRef, MerchantId, PaymentMethod, ProviderRef, RequestId, ReservationId,
    TransactionId, TransactionStatus,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One dispatch attempt of a collection request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier.
    id: TransactionId,
    /// The dispatch request this attempt belongs to.
    request_id: RequestId,
    /// Merchant that originated the collection.
    merchant_id: MerchantId,
    /// 1-based attempt ordinal within the request.
    attempt: u32,
    /// Requested amount.
    amount: Amount,
    /// Settlement rail.
    method: PaymentMethod,
    /// Assigned provider, set on first successful assignment.
    provider: Option<ProviderRef>,
    /// Quota reservation held while in flight on a requisite.
    reservation_id: Option<ReservationId>,
    /// Opaque reference partners echo back in callbacks.
    external_ref: ExternalRef,
    /// Current lifecycle status.
    status: TransactionStatus,
    /// Amount the provider reported on settlement, if any.
    settled_amount: Option<Amount>,
    /// True if `settled_amount` differed from `amount`.
    amount_discrepancy: bool,
    /// Why the attempt failed or expired, if it did.
    failure_reason: Option<String>,
    /// Optimistic-concurrency version, bumped on every persisted update.
    version: u64,
    /// When the attempt was created.
    created_at: Timestamp,
    /// When a provider was assigned.
    assigned_at: Option<Timestamp>,
    /// When the attempt reached a terminal status.
    finished_at: Option<Timestamp>,
}

impl Transaction {
    /// Creates a new unassigned attempt in `Created` status.
    #[must_use]
    pub fn new(
        request_id: RequestId,
        merchant_id: MerchantId,
        attempt: u32,
        amount: Amount,
        method: PaymentMethod,
    ) -> Self {
        Self {
            id: TransactionId::new_v4(),
            request_id,
            merchant_id,
            attempt,
            amount,
            method,
            provider: None,
            reservation_id: None,
            external_ref: ExternalRef::mint(),
            status: TransactionStatus::Created,
            settled_amount: None,
            amount_discrepancy: false,
            failure_reason: None,
            version: 0,
            created_at: Timestamp::now(),
            assigned_at: None,
            finished_at: None,
        }
    }

    /// Returns the transaction id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &TransactionId {
        &self.id
    }

    /// Returns the owning request id.
    #[inline]
    #[must_use]
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// Returns the originating merchant id.
    #[inline]
    #[must_use]
    pub fn merchant_id(&self) -> &MerchantId {
        &self.merchant_id
    }

    /// Returns the 1-based attempt ordinal.
    #[inline]
    #[must_use]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Returns the requested amount.
    #[inline]
    #[must_use]
    pub fn amount(&self) -> Amount {
        self.amount
    }

    /// Returns the settlement method.
    #[inline]
    #[must_use]
    pub fn method(&self) -> PaymentMethod {
        self.method
    }

    /// Returns the assigned provider, if any.
    #[inline]
    #[must_use]
    pub fn provider(&self) -> Option<&ProviderRef> {
        self.provider.as_ref()
    }

    /// Returns the held quota reservation, if any.
    #[inline]
    #[must_use]
    pub fn reservation_id(&self) -> Option<&ReservationId> {
        self.reservation_id.as_ref()
    }

    /// Returns the external reference partners echo back.
    #[inline]
    #[must_use]
    pub fn external_ref(&self) -> &ExternalRef {
        &self.external_ref
    }

    /// Returns the current status.
    #[inline]
    #[must_use]
    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    /// Returns the settled amount reported by the provider, if any.
    #[inline]
    #[must_use]
    pub fn settled_amount(&self) -> Option<Amount> {
        self.settled_amount
    }

    /// Returns true if the settled amount differed from the requested one.
    #[inline]
    #[must_use]
    pub fn amount_discrepancy(&self) -> bool {
        self.amount_discrepancy
    }

    /// Returns the failure reason, if the attempt failed or expired.
    #[inline]
    #[must_use]
    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    /// Returns the optimistic-concurrency version.
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns when this attempt was created.
    #[inline]
    #[must_use]
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Returns when a provider was assigned, if one was.
    #[inline]
    #[must_use]
    pub fn assigned_at(&self) -> Option<Timestamp> {
        self.assigned_at
    }

    /// Returns when the attempt reached a terminal status, if it has.
    #[inline]
    #[must_use]
    pub fn finished_at(&self) -> Option<Timestamp> {
        self.finished_at
    }

    /// Returns true if the attempt is waiting on confirmation.
    #[inline]
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.status.is_in_flight()
    }

    /// Returns true if the attempt settled successfully.
    #[inline]
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.status.is_settled()
    }

    /// Bumps the optimistic-concurrency version.
    ///
    /// Repositories call this after a successful compare-and-swap; domain
    /// code never touches the version directly.
    pub fn bump_version(&mut self) {
        self.version += 1;
    }

    /// Assigns a trader requisite and records the quota reservation held
    /// for it, moving the attempt to `Pending`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ProviderAlreadyAssigned` if a provider is set,
    /// or `DomainError::InvalidStateTransition` if not in `Created`.
    pub fn assign_requisite(
        &mut self,
        requisite_id: crate::domain::value_objects::RequisiteId,
        reservation_id: ReservationId,
        at: Timestamp,
    ) -> DomainResult<()> {
        if self.provider.is_some() {
            return Err(DomainError::ProviderAlreadyAssigned);
        }
        self.transition_to(TransactionStatus::Pending)?;
        self.provider = Some(ProviderRef::Requisite(requisite_id));
        self.reservation_id = Some(reservation_id);
        self.assigned_at = Some(at);
        Ok(())
    }

    /// Assigns an external aggregator, moving the attempt to
    /// `PendingAggregator`. The caller is responsible for arming the SLA
    /// timer against the aggregator's deadline.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ProviderAlreadyAssigned` if a provider is set,
    /// or `DomainError::InvalidStateTransition` if not in `Created`.
    pub fn assign_aggregator(
        &mut self,
        aggregator_id: crate::domain::value_objects::AggregatorId,
        at: Timestamp,
    ) -> DomainResult<()> {
        if self.provider.is_some() {
            return Err(DomainError::ProviderAlreadyAssigned);
        }
        self.transition_to(TransactionStatus::PendingAggregator)?;
        self.provider = Some(ProviderRef::Aggregator(aggregator_id));
        self.assigned_at = Some(at);
        Ok(())
    }

    /// Marks the attempt settled with the amount the provider reported.
    ///
    /// Records a discrepancy flag when the reported amount differs from the
    /// requested one; the attempt still settles.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStateTransition` if the attempt is not
    /// in flight.
    pub fn mark_ready(&mut self, settled_amount: Amount, at: Timestamp) -> DomainResult<()> {
        self.transition_to(TransactionStatus::Ready)?;
        self.amount_discrepancy = settled_amount != self.amount;
        self.settled_amount = Some(settled_amount);
        self.finished_at = Some(at);
        Ok(())
    }

    /// Marks the attempt failed with a reason.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStateTransition` if the attempt is not
    /// in flight.
    pub fn mark_failed(&mut self, reason: impl Into<String>, at: Timestamp) -> DomainResult<()> {
        self.transition_to(TransactionStatus::Failed)?;
        self.failure_reason = Some(reason.into());
        self.finished_at = Some(at);
        Ok(())
    }

    /// Expires an aggregator hand-off whose SLA deadline passed without
    /// confirmation.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStateTransition` unless the attempt is
    /// in `PendingAggregator`.
    pub fn expire(&mut self, at: Timestamp) -> DomainResult<()> {
        self.transition_to(TransactionStatus::Expired)?;
        self.failure_reason = Some("aggregator SLA deadline exceeded".to_string());
        self.finished_at = Some(at);
        Ok(())
    }

    fn transition_to(&mut self, next: TransactionStatus) -> DomainResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidStateTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Transaction({} attempt={} {} {} {})",
            self.id, self.attempt, self.method, self.amount, self.status
        )
    }
}
