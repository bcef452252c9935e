//! # Value Objects
//!
//! Immutable types with validation and domain semantics.
//!
//! ## Identity Types
//!
//! - [`TransactionId`], [`RequestId`], [`ReservationId`], [`DisputeId`]: UUID-based identifiers
//! - [`RequisiteId`], [`AggregatorId`], [`MerchantId`], [`AgentId`]: string-based identifiers
//! - [`ExternalRef`]: per-attempt reference callbacks address transactions by
//!
//! ## Numeric Types
//!
//! - [`Amount`]: strictly positive decimal money amount
//!
//! ## Domain Enums
//!
//! - [`PaymentMethod`]: settlement rail
//! - [`TransactionStatus`]: assignment-attempt lifecycle states
//! - [`DisputeStatus`]: dispute lifecycle states
//! - [`ProviderRef`]: tagged requisite-or-aggregator provider reference

pub mod amount;
pub mod dispute_status;
pub mod ids;
pub mod method;
pub mod provider;
pub mod timestamp;
pub mod transaction_status;

pub use amount::{Amount, InvalidAmountError};
pub use dispute_status::DisputeStatus;
pub use ids::{
    AgentId, AggregatorId, DisputeId, ExternalRef, MerchantId, RequestId, RequisiteId,
    ReservationId, TransactionId,
};
pub use method::PaymentMethod;
pub use provider::ProviderRef;
pub use timestamp::Timestamp;
pub use transaction_status::TransactionStatus;
