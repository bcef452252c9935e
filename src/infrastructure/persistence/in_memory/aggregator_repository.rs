//! # In-Memory Aggregator Repository
//!
//! Thread-safe in-memory implementation of [`AggregatorRepository`].

use crate::domain::entities::AggregatorProvider;
use crate::domain::value_objects::AggregatorId;
use crate::infrastructure::persistence::traits::{AggregatorRepository, RepositoryResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory implementation of [`AggregatorRepository`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryAggregatorRepository {
    storage: Arc<RwLock<HashMap<AggregatorId, AggregatorProvider>>>,
}

impl InMemoryAggregatorRepository {
    /// Creates a new empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository pre-populated with the given aggregators.
    #[must_use]
    pub fn with_aggregators(aggregators: impl IntoIterator<Item = AggregatorProvider>) -> Self {
        let map = aggregators
            .into_iter()
            .map(|a| (a.id().clone(), a))
            .collect();
        Self {
            storage: Arc::new(RwLock::new(map)),
        }
    }
}

#[async_trait]
impl AggregatorRepository for InMemoryAggregatorRepository {
    async fn save(&self, aggregator: &AggregatorProvider) -> RepositoryResult<()> {
        let mut storage = self.storage.write().await;
        storage.insert(aggregator.id().clone(), aggregator.clone());
        Ok(())
    }

    async fn get(&self, id: &AggregatorId) -> RepositoryResult<Option<AggregatorProvider>> {
        let storage = self.storage.read().await;
        Ok(storage.get(id).cloned())
    }

    async fn get_all(&self) -> RepositoryResult<Vec<AggregatorProvider>> {
        let storage = self.storage.read().await;
        Ok(storage.values().cloned().collect())
    }

    async fn find_active(&self) -> RepositoryResult<Vec<AggregatorProvider>> {
        let storage = self.storage.read().await;
        Ok(storage
            .values()
            .filter(|a| a.is_active())
            .cloned()
            .collect())
    }

    async fn delete(&self, id: &AggregatorId) -> RepositoryResult<bool> {
        let mut storage = self.storage.write().await;
        Ok(storage.remove(id).is_some())
    }

    async fn count(&self) -> RepositoryResult<u64> {
        let storage = self.storage.read().await;
        Ok(storage.len() as u64)
    }
}
