//! # Domain Entities
//!
//! Aggregate roots and entities representing core business concepts.
//!
//! ## Aggregates
//!
//! - [`DispatchRequest`]: Merchant collection order spanning attempts
//! - [`Transaction`]: Single dispatch attempt with a provider state machine
//! - [`DealDispute`]: Merchant contest over a settled collection
//!
//! ## Entities
//!
//! - [`ProviderRequisite`]: Trader-owned settlement instrument with quotas
//! - [`AggregatorProvider`]: External partner with a confirmation SLA

pub mod aggregator;
pub mod dispatch_request;
pub mod dispute;
pub mod requisite;
pub mod transaction;

pub use aggregator::AggregatorProvider;
pub use dispatch_request::{DispatchRequest, RequestOutcome};
pub use dispute::DealDispute;
pub use requisite::{ProviderRequisite, RequisiteBuilder};
pub use transaction::Transaction;
