//! # In-Memory Transaction Repository
//!
//! Thread-safe in-memory implementation of [`TransactionRepository`].
//!
//! Keeps a secondary index from external reference to transaction id so
//! callback lookups stay O(1), and enforces optimistic locking on
//! `update` under a single write lock, which is what serializes the
//! callback reconciler against the SLA sweeper.

use crate::domain::entities::Transaction;
use crate::domain::value_objects::{ExternalRef, RequestId, TransactionId};
use crate::infrastructure::persistence::traits::{
    RepositoryError, RepositoryResult, TransactionRepository,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Storage {
    transactions: HashMap<TransactionId, Transaction>,
    by_external_ref: HashMap<ExternalRef, TransactionId>,
}

/// In-memory implementation of [`TransactionRepository`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryTransactionRepository {
    storage: Arc<RwLock<Storage>>,
}

impl InMemoryTransactionRepository {
    /// Creates a new empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all transactions.
    pub async fn clear(&self) {
        let mut storage = self.storage.write().await;
        storage.transactions.clear();
        storage.by_external_ref.clear();
    }
}

#[async_trait]
impl TransactionRepository for InMemoryTransactionRepository {
    async fn insert(&self, transaction: &Transaction) -> RepositoryResult<()> {
        let mut storage = self.storage.write().await;
        if storage.transactions.contains_key(transaction.id()) {
            return Err(RepositoryError::duplicate(
                "Transaction",
                transaction.id().to_string(),
            ));
        }
        if storage.by_external_ref.contains_key(transaction.external_ref()) {
            return Err(RepositoryError::duplicate(
                "Transaction",
                transaction.external_ref().to_string(),
            ));
        }
        storage
            .by_external_ref
            .insert(transaction.external_ref().clone(), transaction.id().clone());
        storage
            .transactions
            .insert(transaction.id().clone(), transaction.clone());
        Ok(())
    }

    async fn update(&self, transaction: &Transaction) -> RepositoryResult<()> {
        let mut storage = self.storage.write().await;
        let stored = storage.transactions.get_mut(transaction.id()).ok_or_else(|| {
            RepositoryError::not_found("Transaction", transaction.id().to_string())
        })?;
        if transaction.version() != stored.version() + 1 {
            return Err(RepositoryError::version_conflict(
                "Transaction",
                transaction.id().to_string(),
                transaction.version(),
                stored.version(),
            ));
        }
        *stored = transaction.clone();
        Ok(())
    }

    async fn get(&self, id: &TransactionId) -> RepositoryResult<Option<Transaction>> {
        let storage = self.storage.read().await;
        Ok(storage.transactions.get(id).cloned())
    }

    async fn get_by_external_ref(
        &self,
        external_ref: &ExternalRef,
    ) -> RepositoryResult<Option<Transaction>> {
        let storage = self.storage.read().await;
        let id = storage.by_external_ref.get(external_ref);
        Ok(id.and_then(|id| storage.transactions.get(id)).cloned())
    }

    async fn find_by_request(&self, request_id: &RequestId) -> RepositoryResult<Vec<Transaction>> {
        let storage = self.storage.read().await;
        let mut attempts: Vec<Transaction> = storage
            .transactions
            .values()
            .filter(|t| t.request_id() == request_id)
            .cloned()
            .collect();
        attempts.sort_by_key(Transaction::attempt);
        Ok(attempts)
    }

    async fn find_in_flight(&self) -> RepositoryResult<Vec<Transaction>> {
        let storage = self.storage.read().await;
        Ok(storage
            .transactions
            .values()
            .filter(|t| t.is_in_flight())
            .cloned()
            .collect())
    }

    async fn count(&self) -> RepositoryResult<u64> {
        let storage = self.storage.read().await;
        Ok(storage.transactions.len() as u64)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{Amount, MerchantId, PaymentMethod};
    use rust_decimal::Decimal;

    fn test_transaction() -> Transaction {
        Transaction::new(
            RequestId::new_v4(),
            MerchantId::new("merchant-1"),
            1,
            Amount::new(Decimal::from(5000)).unwrap(),
            PaymentMethod::CardToCard,
        )
    }

    #[tokio::test]
    async fn insert_and_get() {
        let repo = InMemoryTransactionRepository::new();
        let txn = test_transaction();
        repo.insert(&txn).await.unwrap();

        let found = repo.get(txn.id()).await.unwrap().unwrap();
        assert_eq!(found, txn);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn duplicate_insert_is_rejected() {
        let repo = InMemoryTransactionRepository::new();
        let txn = test_transaction();
        repo.insert(&txn).await.unwrap();

        let err = repo.insert(&txn).await.unwrap_err();
        assert!(err.is_duplicate());
    }

    #[tokio::test]
    async fn lookup_by_external_ref() {
        let repo = InMemoryTransactionRepository::new();
        let txn = test_transaction();
        repo.insert(&txn).await.unwrap();

        let found = repo
            .get_by_external_ref(txn.external_ref())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id(), txn.id());

        let missing = repo
            .get_by_external_ref(&ExternalRef::mint())
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn update_requires_next_version() {
        let repo = InMemoryTransactionRepository::new();
        let txn = test_transaction();
        repo.insert(&txn).await.unwrap();

        // Stale write: same version as stored.
        let err = repo.update(&txn).await.unwrap_err();
        assert!(err.is_version_conflict());

        let mut next = txn.clone();
        next.bump_version();
        repo.update(&next).await.unwrap();
        assert_eq!(repo.get(txn.id()).await.unwrap().unwrap().version(), 1);

        // Replaying the same bump loses.
        let err = repo.update(&next).await.unwrap_err();
        assert!(err.is_version_conflict());
    }

    #[tokio::test]
    async fn update_unknown_transaction_is_not_found() {
        let repo = InMemoryTransactionRepository::new();
        let mut txn = test_transaction();
        txn.bump_version();
        let err = repo.update(&txn).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn find_by_request_orders_by_attempt() {
        let repo = InMemoryTransactionRepository::new();
        let request_id = RequestId::new_v4();
        let amount = Amount::new(Decimal::from(100)).unwrap();
        let second = Transaction::new(
            request_id.clone(),
            MerchantId::new("m"),
            2,
            amount,
            PaymentMethod::CardToCard,
        );
        let first = Transaction::new(
            request_id.clone(),
            MerchantId::new("m"),
            1,
            amount,
            PaymentMethod::CardToCard,
        );
        repo.insert(&second).await.unwrap();
        repo.insert(&first).await.unwrap();
        repo.insert(&test_transaction()).await.unwrap();

        let attempts = repo.find_by_request(&request_id).await.unwrap();
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].attempt(), 1);
        assert_eq!(attempts[1].attempt(), 2);
    }

    #[tokio::test]
    async fn find_in_flight_skips_created_and_terminal() {
        let repo = InMemoryTransactionRepository::new();
        let created = test_transaction();
        repo.insert(&created).await.unwrap();

        let mut pending = test_transaction();
        pending
            .assign_aggregator(
                crate::domain::value_objects::AggregatorId::new("agg-1"),
                crate::domain::value_objects::timestamp::Timestamp::now(),
            )
            .unwrap();
        repo.insert(&pending).await.unwrap();

        let in_flight = repo.find_in_flight().await.unwrap();
        assert_eq!(in_flight.len(), 1);
        assert_eq!(in_flight[0].id(), pending.id());
    }
}
