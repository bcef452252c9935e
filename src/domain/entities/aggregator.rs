//! # Aggregator Provider
//!
//! An external payment-collection partner reached over HTTP.
//!
//! Aggregators are not quota-tracked; instead each carries an SLA budget
//! (`max_sla_ms`) within which it must confirm a handed-off transaction,
//! and a per-method external reference used when addressing its API.

use crate::domain::value_objects::timestamp::Timestamp;
use crate::domain::value_objects::{AggregatorId, PaymentMethod};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use subtle::ConstantTimeEq;

/// An external aggregator that accepts handed-off collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatorProvider {
    /// Unique identifier.
    id: AggregatorId,
    /// Human-readable partner name.
    name: String,
    /// Base URL of the partner API.
    base_url: String,
    /// Shared secret the partner presents on callbacks.
    api_token: String,
    /// Whether the partner currently accepts traffic.
    is_active: bool,
    /// Per-method external reference; a method absent here is unsupported.
    method_refs: HashMap<PaymentMethod, String>,
    /// Confirmation SLA in milliseconds, measured from hand-off.
    max_sla_ms: u64,
    /// When this partner was registered.
    created_at: Timestamp,
}

impl AggregatorProvider {
    /// Creates a new active aggregator.
    #[must_use]
    pub fn new(
        id: AggregatorId,
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_token: impl Into<String>,
        method_refs: HashMap<PaymentMethod, String>,
        max_sla_ms: u64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            base_url: base_url.into(),
            api_token: api_token.into(),
            is_active: true,
            method_refs,
            max_sla_ms,
            created_at: Timestamp::now(),
        }
    }

    /// Returns the aggregator id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &AggregatorId {
        &self.id
    }

    /// Returns the partner name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the partner API base URL.
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns true if the partner currently accepts traffic.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns the confirmation SLA in milliseconds.
    #[inline]
    #[must_use]
    pub fn max_sla_ms(&self) -> u64 {
        self.max_sla_ms
    }

    /// Returns when this partner was registered.
    #[inline]
    #[must_use]
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Returns true if the partner supports the given method.
    #[must_use]
    pub fn supports(&self, method: PaymentMethod) -> bool {
        self.method_refs.contains_key(&method)
    }

    /// Returns the partner-side reference for the given method, if supported.
    #[must_use]
    pub fn method_ref(&self, method: PaymentMethod) -> Option<&str> {
        self.method_refs.get(&method).map(String::as_str)
    }

    /// Eligibility predicate: active and supports the method.
    #[must_use]
    pub fn accepts(&self, method: PaymentMethod) -> bool {
        self.is_active && self.supports(method)
    }

    /// Checks a presented callback token against the stored secret.
    ///
    /// Constant-time comparison; only the token length can leak.
    #[must_use]
    pub fn token_matches(&self, presented: &str) -> bool {
        self.api_token
            .as_bytes()
            .ct_eq(presented.as_bytes())
            .into()
    }

    /// Returns the SLA deadline for a hand-off made at `assigned_at`.
    #[must_use]
    pub fn sla_deadline(&self, assigned_at: Timestamp) -> Timestamp {
        assigned_at.add_millis(self.max_sla_ms as i64)
    }

    /// Enables traffic to this partner.
    pub fn activate(&mut self) {
        self.is_active = true;
    }

    /// Disables traffic to this partner.
    pub fn deactivate(&mut self) {
        self.is_active = false;
    }
}

impl fmt::Display for AggregatorProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Aggregator({} {})", self.id, self.name)
    }
}
