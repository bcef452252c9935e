//! # Deal Dispute
//!
//! A merchant-raised contest over a settled, requisite-routed collection.
//!
//! Aggregator-routed transactions are disputed with the partner out of
//! band, so a dispute always names the trader agent who owned the
//! requisite at settlement time. At most one dispute exists per
//! transaction; a rejected dispute cannot be reopened.

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::timestamp::Timestamp;
use crate::domain::value_objects::{AgentId, DisputeId, DisputeStatus, MerchantId, TransactionId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A dispute raised against a settled transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealDispute {
    /// Unique identifier.
    id: DisputeId,
    /// The contested transaction.
    transaction_id: TransactionId,
    /// Merchant that raised the dispute.
    merchant_id: MerchantId,
    /// Trader agent accountable for the settlement.
    agent_id: AgentId,
    /// Merchant-supplied grounds for the dispute.
    reason: String,
    /// Current status.
    status: DisputeStatus,
    /// Operator note recorded at resolution, if any.
    resolution_note: Option<String>,
    /// Optimistic-concurrency version, bumped on every persisted update.
    version: u64,
    /// When the dispute was opened.
    opened_at: Timestamp,
    /// When the dispute was closed, if it was.
    closed_at: Option<Timestamp>,
}

impl DealDispute {
    /// Opens a new dispute.
    #[must_use]
    pub fn open(
        transaction_id: TransactionId,
        merchant_id: MerchantId,
        agent_id: AgentId,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: DisputeId::new_v4(),
            transaction_id,
            merchant_id,
            agent_id,
            reason: reason.into(),
            status: DisputeStatus::Open,
            resolution_note: None,
            version: 0,
            opened_at: Timestamp::now(),
            closed_at: None,
        }
    }

    /// Returns the dispute id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &DisputeId {
        &self.id
    }

    /// Returns the contested transaction id.
    #[inline]
    #[must_use]
    pub fn transaction_id(&self) -> &TransactionId {
        &self.transaction_id
    }

    /// Returns the merchant that raised the dispute.
    #[inline]
    #[must_use]
    pub fn merchant_id(&self) -> &MerchantId {
        &self.merchant_id
    }

    /// Returns the accountable trader agent.
    #[inline]
    #[must_use]
    pub fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }

    /// Returns the merchant-supplied grounds.
    #[inline]
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Returns the current status.
    #[inline]
    #[must_use]
    pub fn status(&self) -> DisputeStatus {
        self.status
    }

    /// Returns the operator resolution note, if the dispute was closed.
    #[inline]
    #[must_use]
    pub fn resolution_note(&self) -> Option<&str> {
        self.resolution_note.as_deref()
    }

    /// Returns the optimistic-concurrency version.
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns when the dispute was opened.
    #[inline]
    #[must_use]
    pub fn opened_at(&self) -> Timestamp {
        self.opened_at
    }

    /// Returns when the dispute was closed, if it was.
    #[inline]
    #[must_use]
    pub fn closed_at(&self) -> Option<Timestamp> {
        self.closed_at
    }

    /// Bumps the optimistic-concurrency version.
    pub fn bump_version(&mut self) {
        self.version += 1;
    }

    /// Resolves the dispute in the merchant's favor.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidDisputeTransition` if not `Open`.
    pub fn resolve(&mut self, note: impl Into<String>, at: Timestamp) -> DomainResult<()> {
        self.close(DisputeStatus::Resolved, note, at)
    }

    /// Rejects the dispute.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidDisputeTransition` if not `Open`.
    pub fn reject(&mut self, note: impl Into<String>, at: Timestamp) -> DomainResult<()> {
        self.close(DisputeStatus::Rejected, note, at)
    }

    fn close(
        &mut self,
        next: DisputeStatus,
        note: impl Into<String>,
        at: Timestamp,
    ) -> DomainResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidDisputeTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.resolution_note = Some(note.into());
        self.closed_at = Some(at);
        Ok(())
    }
}

impl fmt::Display for DealDispute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Dispute({} txn={} {} {})",
            self.id, self.transaction_id, self.agent_id, self.status
        )
    }
}
