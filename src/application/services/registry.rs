//! # Provider Registry
//!
//! Read-through candidate lookup over the requisite and aggregator
//! repositories.
//!
//! The registry deliberately keeps no cache of its own: operators can
//! activate, deactivate or archive providers at any time, and every
//! dispatch must see the current state. Candidate order is deterministic
//! (registration time, then id) so routing is reproducible under test.

use crate::domain::entities::{AggregatorProvider, ProviderRequisite};
use crate::domain::value_objects::{AggregatorId, Amount, PaymentMethod};
use crate::infrastructure::persistence::traits::{
    AggregatorRepository, RepositoryResult, RequisiteRepository,
};
use std::collections::HashSet;
use std::sync::Arc;

/// Candidate lookup over provider repositories.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    requisites: Arc<dyn RequisiteRepository>,
    aggregators: Arc<dyn AggregatorRepository>,
}

impl ProviderRegistry {
    /// Creates a registry over the given repositories.
    #[must_use]
    pub fn new(
        requisites: Arc<dyn RequisiteRepository>,
        aggregators: Arc<dyn AggregatorRepository>,
    ) -> Self {
        Self {
            requisites,
            aggregators,
        }
    }

    /// Returns the requisite repository this registry reads from.
    #[inline]
    #[must_use]
    pub fn requisites(&self) -> &Arc<dyn RequisiteRepository> {
        &self.requisites
    }

    /// Returns the aggregator repository this registry reads from.
    #[inline]
    #[must_use]
    pub fn aggregators(&self) -> &Arc<dyn AggregatorRepository> {
        &self.aggregators
    }

    /// Finds requisites eligible for the given method and amount,
    /// ordered by registration time then id.
    ///
    /// # Errors
    ///
    /// Returns a repository error if the lookup fails.
    pub async fn eligible_requisites(
        &self,
        method: PaymentMethod,
        amount: Amount,
    ) -> RepositoryResult<Vec<ProviderRequisite>> {
        let mut candidates: Vec<ProviderRequisite> = self
            .requisites
            .find_active()
            .await?
            .into_iter()
            .filter(|r| r.accepts(method, amount))
            .collect();
        candidates.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().cmp(b.id()))
        });
        Ok(candidates)
    }

    /// Finds aggregators eligible for the given method, skipping the
    /// excluded set, ordered by registration time then id.
    ///
    /// # Errors
    ///
    /// Returns a repository error if the lookup fails.
    pub async fn eligible_aggregators(
        &self,
        method: PaymentMethod,
        excluded: &HashSet<AggregatorId>,
    ) -> RepositoryResult<Vec<AggregatorProvider>> {
        let mut candidates: Vec<AggregatorProvider> = self
            .aggregators
            .find_active()
            .await?
            .into_iter()
            .filter(|a| a.accepts(method) && !excluded.contains(a.id()))
            .collect();
        candidates.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().cmp(b.id()))
        });
        Ok(candidates)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::value_objects::timestamp::Timestamp;
    use crate::domain::value_objects::{AgentId, RequisiteId};
    use crate::infrastructure::persistence::in_memory::{
        InMemoryAggregatorRepository, InMemoryRequisiteRepository,
    };
    use rust_decimal::Decimal;
    use std::collections::HashMap;

    fn amount(value: i64) -> Amount {
        Amount::new(Decimal::from(value)).unwrap()
    }

    fn requisite(id: &str, method: PaymentMethod, created_secs: i64) -> ProviderRequisite {
        ProviderRequisite::builder(RequisiteId::new(id), AgentId::new("agent-1"), method)
            .amount_bounds(amount(100), amount(10_000))
            .limits(10, amount(100_000), 0)
            .created_at(Timestamp::from_secs(created_secs).unwrap())
            .build()
            .unwrap()
    }

    fn aggregator(id: &str, method: PaymentMethod) -> AggregatorProvider {
        let mut refs = HashMap::new();
        refs.insert(method, "ref".to_string());
        AggregatorProvider::new(
            AggregatorId::new(id),
            id,
            "https://partner.example",
            "token",
            refs,
            60_000,
        )
    }

    fn registry(
        requisites: Vec<ProviderRequisite>,
        aggregators: Vec<AggregatorProvider>,
    ) -> ProviderRegistry {
        ProviderRegistry::new(
            Arc::new(InMemoryRequisiteRepository::with_requisites(requisites)),
            Arc::new(InMemoryAggregatorRepository::with_aggregators(aggregators)),
        )
    }

    #[tokio::test]
    async fn requisites_filtered_by_method_and_amount() {
        let registry = registry(
            vec![
                requisite("c2c", PaymentMethod::CardToCard, 10),
                requisite("sbp", PaymentMethod::InstantTransfer, 10),
            ],
            vec![],
        );

        let found = registry
            .eligible_requisites(PaymentMethod::CardToCard, amount(500))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id().as_str(), "c2c");

        let none = registry
            .eligible_requisites(PaymentMethod::CardToCard, amount(50_000))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn requisites_ordered_by_registration_then_id() {
        let registry = registry(
            vec![
                requisite("b", PaymentMethod::CardToCard, 20),
                requisite("c", PaymentMethod::CardToCard, 10),
                requisite("a", PaymentMethod::CardToCard, 20),
            ],
            vec![],
        );

        let found = registry
            .eligible_requisites(PaymentMethod::CardToCard, amount(500))
            .await
            .unwrap();
        let ids: Vec<&str> = found.iter().map(|r| r.id().as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn aggregators_respect_exclusions() {
        let registry = registry(
            vec![],
            vec![
                aggregator("agg-1", PaymentMethod::CardToCard),
                aggregator("agg-2", PaymentMethod::CardToCard),
            ],
        );

        let mut excluded = HashSet::new();
        excluded.insert(AggregatorId::new("agg-1"));

        let found = registry
            .eligible_aggregators(PaymentMethod::CardToCard, &excluded)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id().as_str(), "agg-2");
    }
}
