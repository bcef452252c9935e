//! # Repository Traits
//!
//! Port definitions for persistence abstraction.
//!
//! This module defines the repository traits (ports) that abstract
//! persistence operations. Implementations can use different backends;
//! the crate ships thread-safe in-memory ones.
//!
//! # Available Repositories
//!
//! - [`TransactionRepository`]: Persistence for dispatch attempts
//! - [`DispatchRequestRepository`]: Persistence for collection orders
//! - [`RequisiteRepository`]: Persistence for trader requisites
//! - [`AggregatorRepository`]: Persistence for external partners
//! - [`DisputeRepository`]: Persistence for deal disputes
//!
//! # Concurrency
//!
//! `Transaction`, `DispatchRequest` and `DealDispute` updates use
//! optimistic locking: `update` succeeds only when the entity's version
//! is exactly one ahead of the stored copy, so racing writers (callback
//! reconciler vs SLA sweeper, duplicate callbacks) serialize cleanly and
//! the loser observes [`RepositoryError::VersionConflict`].

use crate::domain::entities::{
    AggregatorProvider, DealDispute, DispatchRequest, ProviderRequisite, Transaction,
};
use crate::domain::value_objects::{
    AggregatorId, DisputeId, ExternalRef, RequestId, RequisiteId, TransactionId,
};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Error type for repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Entity not found.
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound {
        /// Type of entity.
        entity_type: &'static str,
        /// Entity identifier.
        id: String,
    },

    /// Duplicate entity.
    #[error("Duplicate entity: {entity_type} with id {id} already exists")]
    Duplicate {
        /// Type of entity.
        entity_type: &'static str,
        /// Entity identifier.
        id: String,
    },

    /// Optimistic locking conflict.
    #[error("Version conflict: {entity_type} with id {id} has been modified")]
    VersionConflict {
        /// Type of entity.
        entity_type: &'static str,
        /// Entity identifier.
        id: String,
        /// Version the writer expected to install.
        expected: u64,
        /// Version currently stored.
        actual: u64,
    },

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RepositoryError {
    /// Creates a not found error.
    #[must_use]
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a duplicate error.
    #[must_use]
    pub fn duplicate(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::Duplicate {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a version conflict error.
    #[must_use]
    pub fn version_conflict(
        entity_type: &'static str,
        id: impl Into<String>,
        expected: u64,
        actual: u64,
    ) -> Self {
        Self::VersionConflict {
            entity_type,
            id: id.into(),
            expected,
            actual,
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if this is a duplicate error.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }

    /// Returns true if this is a version conflict error.
    #[must_use]
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }
}

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Repository for dispatch attempts.
#[async_trait]
pub trait TransactionRepository: Send + Sync + fmt::Debug {
    /// Inserts a new transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Duplicate` if the id or external
    /// reference is already present.
    async fn insert(&self, transaction: &Transaction) -> RepositoryResult<()>;

    /// Updates a transaction under optimistic locking.
    ///
    /// The caller bumps the version before calling; the update succeeds
    /// only if the incoming version is exactly one ahead of the stored
    /// copy.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::VersionConflict` on a lost race and
    /// `RepositoryError::NotFound` if the transaction does not exist.
    async fn update(&self, transaction: &Transaction) -> RepositoryResult<()>;

    /// Gets a transaction by id.
    async fn get(&self, id: &TransactionId) -> RepositoryResult<Option<Transaction>>;

    /// Gets a transaction by the external reference partners echo back.
    async fn get_by_external_ref(
        &self,
        external_ref: &ExternalRef,
    ) -> RepositoryResult<Option<Transaction>>;

    /// Finds all attempts belonging to a dispatch request, oldest first.
    async fn find_by_request(&self, request_id: &RequestId) -> RepositoryResult<Vec<Transaction>>;

    /// Finds all in-flight attempts.
    async fn find_in_flight(&self) -> RepositoryResult<Vec<Transaction>>;

    /// Counts all transactions.
    async fn count(&self) -> RepositoryResult<u64>;
}

/// Repository for merchant collection orders.
#[async_trait]
pub trait DispatchRequestRepository: Send + Sync + fmt::Debug {
    /// Inserts a new request.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Duplicate` if the id is already present.
    async fn insert(&self, request: &DispatchRequest) -> RepositoryResult<()>;

    /// Updates a request under optimistic locking.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::VersionConflict` on a lost race and
    /// `RepositoryError::NotFound` if the request does not exist.
    async fn update(&self, request: &DispatchRequest) -> RepositoryResult<()>;

    /// Gets a request by id.
    async fn get(&self, id: &RequestId) -> RepositoryResult<Option<DispatchRequest>>;

    /// Counts all requests.
    async fn count(&self) -> RepositoryResult<u64>;
}

/// Repository for trader requisites.
#[async_trait]
pub trait RequisiteRepository: Send + Sync + fmt::Debug {
    /// Saves a requisite, overwriting any existing copy.
    async fn save(&self, requisite: &ProviderRequisite) -> RepositoryResult<()>;

    /// Gets a requisite by id.
    async fn get(&self, id: &RequisiteId) -> RepositoryResult<Option<ProviderRequisite>>;

    /// Gets all requisites.
    async fn get_all(&self) -> RepositoryResult<Vec<ProviderRequisite>>;

    /// Finds requisites that are active and not archived.
    async fn find_active(&self) -> RepositoryResult<Vec<ProviderRequisite>>;

    /// Deletes a requisite by id.
    ///
    /// Returns `Ok(true)` if it was deleted, `Ok(false)` if it didn't exist.
    async fn delete(&self, id: &RequisiteId) -> RepositoryResult<bool>;

    /// Counts all requisites.
    async fn count(&self) -> RepositoryResult<u64>;
}

/// Repository for external aggregator partners.
#[async_trait]
pub trait AggregatorRepository: Send + Sync + fmt::Debug {
    /// Saves an aggregator, overwriting any existing copy.
    async fn save(&self, aggregator: &AggregatorProvider) -> RepositoryResult<()>;

    /// Gets an aggregator by id.
    async fn get(&self, id: &AggregatorId) -> RepositoryResult<Option<AggregatorProvider>>;

    /// Gets all aggregators.
    async fn get_all(&self) -> RepositoryResult<Vec<AggregatorProvider>>;

    /// Finds aggregators that are active.
    async fn find_active(&self) -> RepositoryResult<Vec<AggregatorProvider>>;

    /// Deletes an aggregator by id.
    ///
    /// Returns `Ok(true)` if it was deleted, `Ok(false)` if it didn't exist.
    async fn delete(&self, id: &AggregatorId) -> RepositoryResult<bool>;

    /// Counts all aggregators.
    async fn count(&self) -> RepositoryResult<u64>;
}

/// Repository for deal disputes.
#[async_trait]
pub trait DisputeRepository: Send + Sync + fmt::Debug {
    /// Inserts a new dispute.
    ///
    /// At most one dispute may exist per transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Duplicate` if a dispute already exists
    /// for the same transaction.
    async fn insert(&self, dispute: &DealDispute) -> RepositoryResult<()>;

    /// Updates a dispute under optimistic locking.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::VersionConflict` on a lost race and
    /// `RepositoryError::NotFound` if the dispute does not exist.
    async fn update(&self, dispute: &DealDispute) -> RepositoryResult<()>;

    /// Gets a dispute by id.
    async fn get(&self, id: &DisputeId) -> RepositoryResult<Option<DealDispute>>;

    /// Gets the dispute raised against a transaction, if any.
    async fn get_by_transaction(
        &self,
        transaction_id: &TransactionId,
    ) -> RepositoryResult<Option<DealDispute>>;

    /// Gets all disputes.
    async fn get_all(&self) -> RepositoryResult<Vec<DealDispute>>;

    /// Counts all disputes.
    async fn count(&self) -> RepositoryResult<u64>;
}
