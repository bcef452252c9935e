//! # Payment Collection Dispatch
//!
//! A dispatch engine for payment collections: incoming merchant requests
//! are routed onto trader requisites (internal settlement instruments
//! under rolling-window quotas) or external aggregator partners (under a
//! confirmation SLA with automatic failover), confirmations arrive as
//! idempotent callbacks, and settled collections can be disputed.
//!
//! ## Architecture
//!
//! The crate follows a layered architecture:
//!
//! - [`domain`]: Entities, value objects and domain errors
//! - [`application`]: Dispatch, reconciliation, quotas, SLA, disputes
//! - [`infrastructure`]: Repository ports and in-memory implementations
//! - [`api`]: REST transport
//! - [`config`]: Layered runtime configuration
//!
//! ## Example
//!
//! ```
//! use pay_dispatch::application::services::{
//!     Dispatcher, DispatcherConfig, DispatchIntake, LimitTracker, ProviderRegistry,
//!     RequisitesFirstPolicy, SlaMonitor,
//! };
//! use pay_dispatch::domain::value_objects::{MerchantId, PaymentMethod};
//! use pay_dispatch::infrastructure::persistence::in_memory::{
//!     InMemoryAggregatorRepository, InMemoryDispatchRequestRepository,
//!     InMemoryRequisiteRepository, InMemoryTransactionRepository,
//! };
//! use rust_decimal::Decimal;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let registry = ProviderRegistry::new(
//!     Arc::new(InMemoryRequisiteRepository::new()),
//!     Arc::new(InMemoryAggregatorRepository::new()),
//! );
//! let dispatcher = Dispatcher::new(
//!     registry,
//!     Arc::new(LimitTracker::new()),
//!     Arc::new(InMemoryTransactionRepository::new()),
//!     Arc::new(InMemoryDispatchRequestRepository::new()),
//!     Arc::new(SlaMonitor::new()),
//!     Arc::new(RequisitesFirstPolicy::new()),
//!     DispatcherConfig::default(),
//! );
//!
//! // No providers are registered, so the request is refused.
//! let result = dispatcher
//!     .dispatch(DispatchIntake {
//!         merchant_id: MerchantId::new("merchant-1"),
//!         method: PaymentMethod::CardToCard,
//!         amount: Decimal::from(5000),
//!     })
//!     .await;
//! assert!(result.unwrap_err().is_no_capacity());
//! # }
//! ```

pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use application::error::{ApplicationError, ApplicationResult};
pub use domain::errors::{DomainError, DomainResult};
