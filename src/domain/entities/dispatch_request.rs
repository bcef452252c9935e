//! # Dispatch Request
//!
//! The merchant-facing collection order that dispatch attempts hang off.
//!
//! A request stays `InFlight` across SLA escalations; each escalation adds
//! an attempt and excludes the aggregator that timed out so the same
//! partner is never retried within one request.

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::timestamp::Timestamp;
use crate::domain::value_objects::{AggregatorId, Amount, MerchantId, PaymentMethod, RequestId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Terminal or in-flight outcome of a dispatch request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestOutcome {
    /// Some attempt is still awaiting confirmation.
    InFlight,
    /// An attempt settled successfully.
    Settled,
    /// All routing options were exhausted or the active attempt failed.
    Failed {
        /// Why the request failed.
        reason: String,
    },
}

impl RequestOutcome {
    /// Returns true if the request reached a terminal outcome.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InFlight)
    }
}

/// A merchant collection order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchRequest {
    /// Unique identifier.
    id: RequestId,
    /// Originating merchant.
    merchant_id: MerchantId,
    /// Settlement rail.
    method: PaymentMethod,
    /// Requested amount.
    amount: Amount,
    /// Number of attempts created so far.
    attempts: u32,
    /// Aggregators that already timed out under this request.
    excluded_aggregators: HashSet<AggregatorId>,
    /// Current outcome.
    outcome: RequestOutcome,
    /// Optimistic-concurrency version, bumped on every persisted update.
    version: u64,
    /// When the request was accepted.
    created_at: Timestamp,
    /// When the request reached a terminal outcome.
    finished_at: Option<Timestamp>,
}

impl DispatchRequest {
    /// Creates a new in-flight request with zero attempts.
    #[must_use]
    pub fn new(merchant_id: MerchantId, method: PaymentMethod, amount: Amount) -> Self {
        Self {
            id: RequestId::new_v4(),
            merchant_id,
            method,
            amount,
            attempts: 0,
            excluded_aggregators: HashSet::new(),
            outcome: RequestOutcome::InFlight,
            version: 0,
            created_at: Timestamp::now(),
            finished_at: None,
        }
    }

    /// Returns the request id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &RequestId {
        &self.id
    }

    /// Returns the originating merchant id.
    #[inline]
    #[must_use]
    pub fn merchant_id(&self) -> &MerchantId {
        &self.merchant_id
    }

    /// Returns the settlement method.
    #[inline]
    #[must_use]
    pub fn method(&self) -> PaymentMethod {
        self.method
    }

    /// Returns the requested amount.
    #[inline]
    #[must_use]
    pub fn amount(&self) -> Amount {
        self.amount
    }

    /// Returns the number of attempts created so far.
    #[inline]
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Returns the aggregators excluded from further routing.
    #[inline]
    #[must_use]
    pub fn excluded_aggregators(&self) -> &HashSet<AggregatorId> {
        &self.excluded_aggregators
    }

    /// Returns the current outcome.
    #[inline]
    #[must_use]
    pub fn outcome(&self) -> &RequestOutcome {
        &self.outcome
    }

    /// Returns the optimistic-concurrency version.
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns when the request was accepted.
    #[inline]
    #[must_use]
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Returns when the request finished, if it has.
    #[inline]
    #[must_use]
    pub fn finished_at(&self) -> Option<Timestamp> {
        self.finished_at
    }

    /// Bumps the optimistic-concurrency version.
    pub fn bump_version(&mut self) {
        self.version += 1;
    }

    /// Records a new attempt and returns its 1-based ordinal.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ValidationError` if the request is already
    /// terminal or `attempts` reached `max_attempts`.
    pub fn begin_attempt(&mut self, max_attempts: u32) -> DomainResult<u32> {
        if self.outcome.is_terminal() {
            return Err(DomainError::validation(
                "cannot start an attempt on a finished request",
            ));
        }
        if self.attempts >= max_attempts {
            return Err(DomainError::validation("attempt budget exhausted"));
        }
        self.attempts += 1;
        Ok(self.attempts)
    }

    /// Excludes an aggregator from further routing under this request.
    ///
    /// Returns false if it was already excluded.
    pub fn exclude_aggregator(&mut self, aggregator_id: AggregatorId) -> bool {
        self.excluded_aggregators.insert(aggregator_id)
    }

    /// Returns true if the aggregator already timed out under this request.
    #[must_use]
    pub fn is_excluded(&self, aggregator_id: &AggregatorId) -> bool {
        self.excluded_aggregators.contains(aggregator_id)
    }

    /// Marks the request settled.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ValidationError` if the request already
    /// reached a terminal outcome.
    pub fn settle(&mut self, at: Timestamp) -> DomainResult<()> {
        self.finish(RequestOutcome::Settled, at)
    }

    /// Marks the request failed with a reason.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ValidationError` if the request already
    /// reached a terminal outcome.
    pub fn fail(&mut self, reason: impl Into<String>, at: Timestamp) -> DomainResult<()> {
        self.finish(
            RequestOutcome::Failed {
                reason: reason.into(),
            },
            at,
        )
    }

    fn finish(&mut self, outcome: RequestOutcome, at: Timestamp) -> DomainResult<()> {
        if self.outcome.is_terminal() {
            return Err(DomainError::validation("request already finished"));
        }
        self.outcome = outcome;
        self.finished_at = Some(at);
        Ok(())
    }
}

impl fmt::Display for DispatchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Request({} {} {} {} attempts={})",
            self.id, self.merchant_id, self.method, self.amount, self.attempts
        )
    }
}
