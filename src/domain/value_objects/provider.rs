//! # Provider Reference
//!
//! Tagged reference to exactly one settlement provider.
//!
//! A transaction is settled either by a trader requisite or by an aggregator
//! integration, never both. [`ProviderRef`] makes that a structural
//! invariant instead of a pair of nullable foreign keys.

use crate::domain::value_objects::ids::{AggregatorId, RequisiteId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to the provider an assignment attempt was routed to.
///
/// # Examples
///
/// ```
/// use pay_dispatch::domain::value_objects::ids::RequisiteId;
/// use pay_dispatch::domain::value_objects::provider::ProviderRef;
///
/// let provider = ProviderRef::Requisite(RequisiteId::new("req-1"));
/// assert!(provider.is_requisite());
/// assert!(provider.aggregator_id().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderRef {
    /// Internal trader requisite.
    Requisite(RequisiteId),
    /// External aggregator integration.
    Aggregator(AggregatorId),
}

impl ProviderRef {
    /// Returns true if this references a trader requisite.
    #[inline]
    #[must_use]
    pub const fn is_requisite(&self) -> bool {
        matches!(self, Self::Requisite(_))
    }

    /// Returns true if this references an aggregator.
    #[inline]
    #[must_use]
    pub const fn is_aggregator(&self) -> bool {
        matches!(self, Self::Aggregator(_))
    }

    /// Returns the requisite id, if this is a requisite reference.
    #[inline]
    #[must_use]
    pub const fn requisite_id(&self) -> Option<&RequisiteId> {
        match self {
            Self::Requisite(id) => Some(id),
            Self::Aggregator(_) => None,
        }
    }

    /// Returns the aggregator id, if this is an aggregator reference.
    #[inline]
    #[must_use]
    pub const fn aggregator_id(&self) -> Option<&AggregatorId> {
        match self {
            Self::Requisite(_) => None,
            Self::Aggregator(id) => Some(id),
        }
    }
}

impl fmt::Display for ProviderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requisite(id) => write!(f, "REQUISITE({id})"),
            Self::Aggregator(id) => write!(f, "AGGREGATOR({id})"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn requisite_accessors() {
        let provider = ProviderRef::Requisite(RequisiteId::new("req-1"));
        assert!(provider.is_requisite());
        assert!(!provider.is_aggregator());
        assert_eq!(provider.requisite_id(), Some(&RequisiteId::new("req-1")));
        assert!(provider.aggregator_id().is_none());
    }

    #[test]
    fn aggregator_accessors() {
        let provider = ProviderRef::Aggregator(AggregatorId::new("agg-1"));
        assert!(provider.is_aggregator());
        assert_eq!(provider.aggregator_id(), Some(&AggregatorId::new("agg-1")));
        assert!(provider.requisite_id().is_none());
    }

    #[test]
    fn display_format() {
        let provider = ProviderRef::Requisite(RequisiteId::new("req-9"));
        assert_eq!(provider.to_string(), "REQUISITE(req-9)");
    }

    #[test]
    fn serde_roundtrip() {
        let provider = ProviderRef::Aggregator(AggregatorId::new("agg-2"));
        let json = serde_json::to_string(&provider).unwrap();
        let back: ProviderRef = serde_json::from_str(&json).unwrap();
        assert_eq!(provider, back);
    }
}
