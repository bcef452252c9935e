//! # In-Memory Repositories
//!
//! In-memory implementations suitable for tests and single-node runs.
//!
//! ## Available Repositories
//!
//! - [`InMemoryTransactionRepository`]: Dispatch attempt persistence
//! - [`InMemoryDispatchRequestRepository`]: Collection order persistence
//! - [`InMemoryRequisiteRepository`]: Trader requisite persistence
//! - [`InMemoryAggregatorRepository`]: Partner persistence
//! - [`InMemoryDisputeRepository`]: Dispute persistence
//!
//! ## Thread Safety
//!
//! All implementations use `Arc<RwLock<HashMap>>` for thread-safe access;
//! versioned entities additionally check optimistic-lock versions under
//! the write lock.

pub mod aggregator_repository;
pub mod dispute_repository;
pub mod request_repository;
pub mod requisite_repository;
pub mod transaction_repository;

pub use aggregator_repository::InMemoryAggregatorRepository;
pub use dispute_repository::InMemoryDisputeRepository;
pub use request_repository::InMemoryDispatchRequestRepository;
pub use requisite_repository::InMemoryRequisiteRepository;
pub use transaction_repository::InMemoryTransactionRepository;
