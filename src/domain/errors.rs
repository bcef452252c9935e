//! # Domain Errors
//!
//! Error types for business-rule violations inside the domain layer.

use crate::domain::value_objects::{DisputeStatus, TransactionStatus};
use rust_decimal::Decimal;
use thiserror::Error;

/// Domain layer error.
///
/// Raised by aggregates when an operation would violate a business rule
/// or an illegal state transition is requested.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Amount failed validation (zero, negative, or out of a requisite's bounds).
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Requested transaction state transition is not allowed.
    #[error("invalid transaction transition: {from} -> {to}")]
    InvalidStateTransition {
        /// Current state.
        from: TransactionStatus,
        /// Requested target state.
        to: TransactionStatus,
    },

    /// Requested dispute state transition is not allowed.
    #[error("invalid dispute transition: {from} -> {to}")]
    InvalidDisputeTransition {
        /// Current state.
        from: DisputeStatus,
        /// Requested target state.
        to: DisputeStatus,
    },

    /// A provider was already assigned to this attempt.
    #[error("provider already assigned")]
    ProviderAlreadyAssigned,

    /// Generic validation failure.
    #[error("validation error: {0}")]
    ValidationError(String),
}

impl DomainError {
    /// Creates an invalid amount error from a rejected decimal value.
    #[must_use]
    pub fn invalid_amount(value: Decimal) -> Self {
        Self::InvalidAmount(value.to_string())
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }
}

impl From<crate::domain::value_objects::InvalidAmountError> for DomainError {
    fn from(err: crate::domain::value_objects::InvalidAmountError) -> Self {
        Self::invalid_amount(err.0)
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
