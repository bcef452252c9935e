//! # In-Memory Dispute Repository
//!
//! Thread-safe in-memory implementation of [`DisputeRepository`].
//!
//! Enforces the one-dispute-per-transaction rule with a secondary index
//! checked under the same write lock as the insert.

use crate::domain::entities::DealDispute;
use crate::domain::value_objects::{DisputeId, TransactionId};
use crate::infrastructure::persistence::traits::{
    DisputeRepository, RepositoryError, RepositoryResult,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Storage {
    disputes: HashMap<DisputeId, DealDispute>,
    by_transaction: HashMap<TransactionId, DisputeId>,
}

/// In-memory implementation of [`DisputeRepository`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryDisputeRepository {
    storage: Arc<RwLock<Storage>>,
}

impl InMemoryDisputeRepository {
    /// Creates a new empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DisputeRepository for InMemoryDisputeRepository {
    async fn insert(&self, dispute: &DealDispute) -> RepositoryResult<()> {
        let mut storage = self.storage.write().await;
        if storage.by_transaction.contains_key(dispute.transaction_id()) {
            return Err(RepositoryError::duplicate(
                "DealDispute",
                dispute.transaction_id().to_string(),
            ));
        }
        storage
            .by_transaction
            .insert(*dispute.transaction_id(), *dispute.id());
        storage.disputes.insert(*dispute.id(), dispute.clone());
        Ok(())
    }

    async fn update(&self, dispute: &DealDispute) -> RepositoryResult<()> {
        let mut storage = self.storage.write().await;
        let stored = storage
            .disputes
            .get_mut(dispute.id())
            .ok_or_else(|| RepositoryError::not_found("DealDispute", dispute.id().to_string()))?;
        if dispute.version() != stored.version() + 1 {
            return Err(RepositoryError::version_conflict(
                "DealDispute",
                dispute.id().to_string(),
                dispute.version(),
                stored.version(),
            ));
        }
        *stored = dispute.clone();
        Ok(())
    }

    async fn get(&self, id: &DisputeId) -> RepositoryResult<Option<DealDispute>> {
        let storage = self.storage.read().await;
        Ok(storage.disputes.get(id).cloned())
    }

    async fn get_by_transaction(
        &self,
        transaction_id: &TransactionId,
    ) -> RepositoryResult<Option<DealDispute>> {
        let storage = self.storage.read().await;
        let id = storage.by_transaction.get(transaction_id);
        Ok(id.and_then(|id| storage.disputes.get(id)).cloned())
    }

    async fn get_all(&self) -> RepositoryResult<Vec<DealDispute>> {
        let storage = self.storage.read().await;
        Ok(storage.disputes.values().cloned().collect())
    }

    async fn count(&self) -> RepositoryResult<u64> {
        let storage = self.storage.read().await;
        Ok(storage.disputes.len() as u64)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::value_objects::timestamp::Timestamp;
    use crate::domain::value_objects::{AgentId, MerchantId};

    fn test_dispute(transaction_id: TransactionId) -> DealDispute {
        DealDispute::open(
            transaction_id,
            MerchantId::new("merchant-1"),
            AgentId::new("agent-1"),
            "funds not received",
        )
    }

    #[tokio::test]
    async fn one_dispute_per_transaction() {
        let repo = InMemoryDisputeRepository::new();
        let txn_id = TransactionId::new_v4();
        repo.insert(&test_dispute(txn_id)).await.unwrap();

        let err = repo.insert(&test_dispute(txn_id)).await.unwrap_err();
        assert!(err.is_duplicate());

        repo.insert(&test_dispute(TransactionId::new_v4()))
            .await
            .unwrap();
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn lookup_by_transaction() {
        let repo = InMemoryDisputeRepository::new();
        let txn_id = TransactionId::new_v4();
        let dispute = test_dispute(txn_id);
        repo.insert(&dispute).await.unwrap();

        let found = repo.get_by_transaction(&txn_id).await.unwrap().unwrap();
        assert_eq!(found.id(), dispute.id());
        assert!(repo
            .get_by_transaction(&TransactionId::new_v4())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn update_enforces_versioning() {
        let repo = InMemoryDisputeRepository::new();
        let dispute = test_dispute(TransactionId::new_v4());
        repo.insert(&dispute).await.unwrap();

        let mut next = dispute.clone();
        next.resolve("refunded", Timestamp::now()).unwrap();
        assert!(repo.update(&next).await.unwrap_err().is_version_conflict());

        next.bump_version();
        repo.update(&next).await.unwrap();
        assert!(repo
            .get(dispute.id())
            .await
            .unwrap()
            .unwrap()
            .status()
            .is_terminal());
    }
}
