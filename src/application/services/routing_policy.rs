//! # Routing Policy
//!
//! Strategies for ordering provider classes during dispatch.
//!
//! This module provides the [`RoutingPolicy`] trait and implementations
//! that decide whether trader requisites or external aggregators are
//! tried first. Within a class the registry's deterministic candidate
//! order applies; the policy only sequences the classes.

use std::fmt;

/// A class of providers the dispatcher can route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderClass {
    /// Trader-owned requisites with quota admission.
    Requisites,
    /// External aggregator partners with SLA hand-off.
    Aggregators,
}

impl fmt::Display for ProviderClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requisites => write!(f, "REQUISITES"),
            Self::Aggregators => write!(f, "AGGREGATORS"),
        }
    }
}

/// Trait for provider-class ordering strategies.
pub trait RoutingPolicy: Send + Sync + fmt::Debug {
    /// Returns the provider classes in the order they should be tried.
    fn order(&self) -> [ProviderClass; 2];

    /// Returns the name of this routing policy.
    fn name(&self) -> &'static str;
}

/// Routes to trader requisites first, falling back to aggregators.
///
/// This is the default: internal capacity is cheaper than partner
/// hand-offs, so it is consumed before any SLA exposure is taken.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequisitesFirstPolicy;

impl RequisitesFirstPolicy {
    /// Creates the policy.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl RoutingPolicy for RequisitesFirstPolicy {
    fn order(&self) -> [ProviderClass; 2] {
        [ProviderClass::Requisites, ProviderClass::Aggregators]
    }

    fn name(&self) -> &'static str {
        "requisites_first"
    }
}

/// Routes to aggregators first, falling back to trader requisites.
///
/// Useful when internal capacity is being drained, for example ahead of
/// a payout cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregatorsFirstPolicy;

impl AggregatorsFirstPolicy {
    /// Creates the policy.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl RoutingPolicy for AggregatorsFirstPolicy {
    fn order(&self) -> [ProviderClass; 2] {
        [ProviderClass::Aggregators, ProviderClass::Requisites]
    }

    fn name(&self) -> &'static str {
        "aggregators_first"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requisites_first_order() {
        let policy = RequisitesFirstPolicy::new();
        assert_eq!(
            policy.order(),
            [ProviderClass::Requisites, ProviderClass::Aggregators]
        );
        assert_eq!(policy.name(), "requisites_first");
    }

    #[test]
    fn aggregators_first_order() {
        let policy = AggregatorsFirstPolicy::new();
        assert_eq!(
            policy.order(),
            [ProviderClass::Aggregators, ProviderClass::Requisites]
        );
        assert_eq!(policy.name(), "aggregators_first");
    }
}
