//! # In-Memory Dispatch Request Repository
//!
//! Thread-safe in-memory implementation of [`DispatchRequestRepository`]
//! with optimistic locking on updates.

use crate::domain::entities::DispatchRequest;
use crate::domain::value_objects::RequestId;
use crate::infrastructure::persistence::traits::{
    DispatchRequestRepository, RepositoryError, RepositoryResult,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory implementation of [`DispatchRequestRepository`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryDispatchRequestRepository {
    storage: Arc<RwLock<HashMap<RequestId, DispatchRequest>>>,
}

impl InMemoryDispatchRequestRepository {
    /// Creates a new empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all requests.
    pub async fn clear(&self) {
        self.storage.write().await.clear();
    }
}

#[async_trait]
impl DispatchRequestRepository for InMemoryDispatchRequestRepository {
    async fn insert(&self, request: &DispatchRequest) -> RepositoryResult<()> {
        let mut storage = self.storage.write().await;
        if storage.contains_key(request.id()) {
            return Err(RepositoryError::duplicate(
                "DispatchRequest",
                request.id().to_string(),
            ));
        }
        storage.insert(*request.id(), request.clone());
        Ok(())
    }

    async fn update(&self, request: &DispatchRequest) -> RepositoryResult<()> {
        let mut storage = self.storage.write().await;
        let stored = storage.get_mut(request.id()).ok_or_else(|| {
            RepositoryError::not_found("DispatchRequest", request.id().to_string())
        })?;
        if request.version() != stored.version() + 1 {
            return Err(RepositoryError::version_conflict(
                "DispatchRequest",
                request.id().to_string(),
                request.version(),
                stored.version(),
            ));
        }
        *stored = request.clone();
        Ok(())
    }

    async fn get(&self, id: &RequestId) -> RepositoryResult<Option<DispatchRequest>> {
        let storage = self.storage.read().await;
        Ok(storage.get(id).cloned())
    }

    async fn count(&self) -> RepositoryResult<u64> {
        let storage = self.storage.read().await;
        Ok(storage.len() as u64)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{Amount, MerchantId, PaymentMethod};
    use rust_decimal::Decimal;

    fn test_request() -> DispatchRequest {
        DispatchRequest::new(
            MerchantId::new("merchant-1"),
            PaymentMethod::InstantTransfer,
            Amount::new(Decimal::from(2500)).unwrap(),
        )
    }

    #[tokio::test]
    async fn insert_get_and_duplicate() {
        let repo = InMemoryDispatchRequestRepository::new();
        let request = test_request();
        repo.insert(&request).await.unwrap();

        assert_eq!(repo.get(request.id()).await.unwrap().unwrap(), request);
        assert!(repo.insert(&request).await.unwrap_err().is_duplicate());
    }

    #[tokio::test]
    async fn update_enforces_versioning() {
        let repo = InMemoryDispatchRequestRepository::new();
        let request = test_request();
        repo.insert(&request).await.unwrap();

        assert!(repo.update(&request).await.unwrap_err().is_version_conflict());

        let mut next = request.clone();
        next.begin_attempt(3).unwrap();
        next.bump_version();
        repo.update(&next).await.unwrap();
        assert_eq!(repo.get(request.id()).await.unwrap().unwrap().attempts(), 1);
    }
}
