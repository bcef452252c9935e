//! # Provider Requisite
//!
//! A claimable settlement instrument owned by a trader agent.
//!
//! Requisites carry per-request amount bounds and a rolling-window quota
//! (`operation_limit` reservations and `sum_limit` cumulative amount per
//! `interval_minutes`). The Limit Tracker enforces the quota; the entity
//! only describes it.
//!
//! # Examples
//!
//! ```
//! use pay_dispatch::domain::entities::requisite::ProviderRequisite;
//! use pay_dispatch::domain::value_objects::{AgentId, Amount, PaymentMethod, RequisiteId};
//! use rust_decimal::Decimal;
//!
//! let requisite = ProviderRequisite::builder(
//!     RequisiteId::new("req-1"),
//!     AgentId::new("agent-1"),
//!     PaymentMethod::CardToCard,
//! )
//! .amount_bounds(
//!     Amount::new(Decimal::from(100)).unwrap(),
//!     Amount::new(Decimal::from(100_000)).unwrap(),
//! )
//! .limits(10, Amount::new(Decimal::from(500_000)).unwrap(), 0)
//! .build()
//! .unwrap();
//!
//! assert!(requisite.accepts(PaymentMethod::CardToCard, Amount::new(Decimal::from(1000)).unwrap()));
//! ```

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::timestamp::Timestamp;
use crate::domain::value_objects::{AgentId, Amount, PaymentMethod, RequisiteId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A trader requisite: an internal agent's bank instrument that can be
/// claimed by dispatched collections.
///
/// # Invariants
///
/// - `min_amount <= max_amount`
/// - Archived requisites never become candidates again
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRequisite {
    /// Unique identifier.
    id: RequisiteId,
    /// Owning trader agent.
    agent_id: AgentId,
    /// Settlement rail this requisite serves.
    method: PaymentMethod,
    /// Display name shown to payers.
    display_name: String,
    /// Masked recipient account or card number.
    account_mask: String,
    /// Minimum acceptable request amount (inclusive).
    min_amount: Amount,
    /// Maximum acceptable request amount (inclusive).
    max_amount: Amount,
    /// Maximum reservations per rolling window.
    operation_limit: u32,
    /// Maximum cumulative reserved amount per rolling window.
    sum_limit: Amount,
    /// Window length in minutes; 0 means unbounded (all-time limits).
    interval_minutes: u32,
    /// Whether the owner currently accepts traffic.
    is_active: bool,
    /// Whether the requisite is permanently retired.
    is_archived: bool,
    /// When this requisite was registered.
    created_at: Timestamp,
}

impl ProviderRequisite {
    /// Returns a builder with required identity fields.
    #[must_use]
    pub fn builder(id: RequisiteId, agent_id: AgentId, method: PaymentMethod) -> RequisiteBuilder {
        RequisiteBuilder::new(id, agent_id, method)
    }

    /// Returns the requisite id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &RequisiteId {
        &self.id
    }

    /// Returns the owning agent id.
    #[inline]
    #[must_use]
    pub fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }

    /// Returns the settlement method.
    #[inline]
    #[must_use]
    pub fn method(&self) -> PaymentMethod {
        self.method
    }

    /// Returns the display name.
    #[inline]
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Returns the masked recipient account.
    #[inline]
    #[must_use]
    pub fn account_mask(&self) -> &str {
        &self.account_mask
    }

    /// Returns the minimum acceptable amount.
    #[inline]
    #[must_use]
    pub fn min_amount(&self) -> Amount {
        self.min_amount
    }

    /// Returns the maximum acceptable amount.
    #[inline]
    #[must_use]
    pub fn max_amount(&self) -> Amount {
        self.max_amount
    }

    /// Returns the per-window reservation count limit.
    #[inline]
    #[must_use]
    pub fn operation_limit(&self) -> u32 {
        self.operation_limit
    }

    /// Returns the per-window cumulative amount limit.
    #[inline]
    #[must_use]
    pub fn sum_limit(&self) -> Amount {
        self.sum_limit
    }

    /// Returns the rolling window length in minutes (0 = unbounded).
    #[inline]
    #[must_use]
    pub fn interval_minutes(&self) -> u32 {
        self.interval_minutes
    }

    /// Returns true if this requisite currently accepts traffic.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns true if this requisite is permanently retired.
    #[inline]
    #[must_use]
    pub fn is_archived(&self) -> bool {
        self.is_archived
    }

    /// Returns when this requisite was registered.
    #[inline]
    #[must_use]
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Returns the start of the rolling window ending at `now`.
    ///
    /// `None` means the limits are unbounded (all-time).
    #[must_use]
    pub fn window_start(&self, now: Timestamp) -> Option<Timestamp> {
        if self.interval_minutes == 0 {
            None
        } else {
            Some(now.sub_minutes(i64::from(self.interval_minutes)))
        }
    }

    /// Eligibility predicate: active, not archived, method matches and the
    /// amount lies inside `[min_amount, max_amount]`.
    #[must_use]
    pub fn accepts(&self, method: PaymentMethod, amount: Amount) -> bool {
        self.is_active
            && !self.is_archived
            && self.method == method
            && self.min_amount <= amount
            && amount <= self.max_amount
    }

    /// Enables traffic to this requisite.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ValidationError` if the requisite is archived.
    pub fn activate(&mut self) -> DomainResult<()> {
        if self.is_archived {
            return Err(DomainError::validation(
                "cannot activate an archived requisite",
            ));
        }
        self.is_active = true;
        Ok(())
    }

    /// Disables traffic to this requisite.
    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    /// Permanently retires this requisite. Archival implies deactivation.
    pub fn archive(&mut self) {
        self.is_archived = true;
        self.is_active = false;
    }
}

impl fmt::Display for ProviderRequisite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Requisite({} {} {} [{}..{}])",
            self.id, self.agent_id, self.method, self.min_amount, self.max_amount
        )
    }
}

/// Builder for [`ProviderRequisite`].
#[derive(Debug, Clone)]
pub struct RequisiteBuilder {
    id: RequisiteId,
    agent_id: AgentId,
    method: PaymentMethod,
    display_name: String,
    account_mask: String,
    min_amount: Option<Amount>,
    max_amount: Option<Amount>,
    operation_limit: u32,
    sum_limit: Option<Amount>,
    interval_minutes: u32,
    is_active: bool,
    created_at: Timestamp,
}

impl RequisiteBuilder {
    /// Creates a new builder with required identity fields.
    #[must_use]
    pub fn new(id: RequisiteId, agent_id: AgentId, method: PaymentMethod) -> Self {
        Self {
            id,
            agent_id,
            method,
            display_name: String::new(),
            account_mask: String::new(),
            min_amount: None,
            max_amount: None,
            operation_limit: u32::MAX,
            sum_limit: None,
            interval_minutes: 0,
            is_active: true,
            created_at: Timestamp::now(),
        }
    }

    /// Sets payer-facing display metadata.
    #[must_use]
    pub fn recipient(mut self, display_name: impl Into<String>, account_mask: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self.account_mask = account_mask.into();
        self
    }

    /// Sets the inclusive request-amount bounds.
    #[must_use]
    pub fn amount_bounds(mut self, min: Amount, max: Amount) -> Self {
        self.min_amount = Some(min);
        self.max_amount = Some(max);
        self
    }

    /// Sets the rolling-window limits.
    #[must_use]
    pub fn limits(mut self, operation_limit: u32, sum_limit: Amount, interval_minutes: u32) -> Self {
        self.operation_limit = operation_limit;
        self.sum_limit = Some(sum_limit);
        self.interval_minutes = interval_minutes;
        self
    }

    /// Sets the initial active flag (defaults to true).
    #[must_use]
    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Sets the registration timestamp (defaults to now).
    #[must_use]
    pub fn created_at(mut self, created_at: Timestamp) -> Self {
        self.created_at = created_at;
        self
    }

    /// Builds the requisite with validation.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ValidationError` if amount bounds or the sum
    /// limit are missing, or if `min_amount > max_amount`.
    pub fn build(self) -> DomainResult<ProviderRequisite> {
        let min_amount = self
            .min_amount
            .ok_or_else(|| DomainError::validation("min_amount is required"))?;
        let max_amount = self
            .max_amount
            .ok_or_else(|| DomainError::validation("max_amount is required"))?;
        let sum_limit = self
            .sum_limit
            .ok_or_else(|| DomainError::validation("sum_limit is required"))?;

        if min_amount > max_amount {
            return Err(DomainError::validation(
                "min_amount must not exceed max_amount",
            ));
        }

        Ok(ProviderRequisite {
            id: self.id,
            agent_id: self.agent_id,
            method: self.method,
            display_name: self.display_name,
            account_mask: self.account_mask,
            min_amount,
            max_amount,
            operation_limit: self.operation_limit,
            sum_limit,
            interval_minutes: self.interval_minutes,
            is_active: self.is_active,
            is_archived: false,
            created_at: self.created_at,
        })
    }
}
