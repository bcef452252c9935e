//! # In-Memory Requisite Repository
//!
//! Thread-safe in-memory implementation of [`RequisiteRepository`].
//!
//! Requisite records come from operator configuration rather than the
//! dispatch hot path, so plain last-write-wins `save` is enough here.

use crate::domain::entities::ProviderRequisite;
use crate::domain::value_objects::RequisiteId;
use crate::infrastructure::persistence::traits::{RepositoryResult, RequisiteRepository};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory implementation of [`RequisiteRepository`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryRequisiteRepository {
    storage: Arc<RwLock<HashMap<RequisiteId, ProviderRequisite>>>,
}

impl InMemoryRequisiteRepository {
    /// Creates a new empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository pre-populated with the given requisites.
    #[must_use]
    pub fn with_requisites(requisites: impl IntoIterator<Item = ProviderRequisite>) -> Self {
        let map = requisites
            .into_iter()
            .map(|r| (r.id().clone(), r))
            .collect();
        Self {
            storage: Arc::new(RwLock::new(map)),
        }
    }
}

#[async_trait]
impl RequisiteRepository for InMemoryRequisiteRepository {
    async fn save(&self, requisite: &ProviderRequisite) -> RepositoryResult<()> {
        let mut storage = self.storage.write().await;
        storage.insert(requisite.id().clone(), requisite.clone());
        Ok(())
    }

    async fn get(&self, id: &RequisiteId) -> RepositoryResult<Option<ProviderRequisite>> {
        let storage = self.storage.read().await;
        Ok(storage.get(id).cloned())
    }

    async fn get_all(&self) -> RepositoryResult<Vec<ProviderRequisite>> {
        let storage = self.storage.read().await;
        Ok(storage.values().cloned().collect())
    }

    async fn find_active(&self) -> RepositoryResult<Vec<ProviderRequisite>> {
        let storage = self.storage.read().await;
        Ok(storage
            .values()
            .filter(|r| r.is_active() && !r.is_archived())
            .cloned()
            .collect())
    }

    async fn delete(&self, id: &RequisiteId) -> RepositoryResult<bool> {
        let mut storage = self.storage.write().await;
        Ok(storage.remove(id).is_some())
    }

    async fn count(&self) -> RepositoryResult<u64> {
        let storage = self.storage.read().await;
        Ok(storage.len() as u64)
    }
}
