//! # Persistence Layer
//!
//! Repository ports and their in-memory implementations.
//!
//! ## Repository Traits (Ports)
//!
//! - [`TransactionRepository`]: Persistence for dispatch attempts
//! - [`DispatchRequestRepository`]: Persistence for collection orders
//! - [`RequisiteRepository`]: Persistence for trader requisites
//! - [`AggregatorRepository`]: Persistence for external partners
//! - [`DisputeRepository`]: Persistence for deal disputes
//!
//! ## Implementations
//!
//! - `in_memory`: Thread-safe in-memory implementations

pub mod in_memory;
pub mod traits;

pub use traits::{
    AggregatorRepository, DispatchRequestRepository, DisputeRepository, RepositoryError,
    RepositoryResult, RequisiteRepository, TransactionRepository,
};
