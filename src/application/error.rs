//! # Application Errors
//!
//! Error types for the application layer.
//!
//! These errors represent failures that can occur during use case
//! execution: validation failures, business rule violations, auth
//! failures and persistence errors.
//!
//! # Error Hierarchy
//!
//! ```text
//! ApplicationError
//! ├── Domain(DomainError)         - Business rule violations
//! ├── Repository(RepositoryError) - Persistence failures
//! ├── InvalidRequest(String)      - Input validation failures
//! ├── NoCapacity                  - No provider could take the request
//! ├── NotFound                    - Resource not found
//! ├── Unauthorized                - Callback authentication failures
//! ├── InvalidState(String)        - Precondition on entity state failed
//! ├── AlreadyExists(String)       - Uniqueness violation
//! └── Internal(String)            - Unexpected internal failures
//! ```
//!
//! # Examples
//!
//! ```
//! use pay_dispatch::application::error::ApplicationError;
//!
//! let err = ApplicationError::invalid_request("amount must be positive");
//! assert!(err.is_invalid_request());
//!
//! let err = ApplicationError::not_found("Transaction", "txn-123");
//! assert!(err.is_not_found());
//! ```

use crate::domain::errors::DomainError;
use crate::infrastructure::persistence::RepositoryError;
use thiserror::Error;

/// Application layer error.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain error.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// Repository error.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Input validation failure.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No eligible provider could admit the request.
    #[error("no provider capacity for this request")]
    NoCapacity,

    /// Resource not found.
    #[error("{resource_type} not found: {id}")]
    NotFound {
        /// Type of resource.
        resource_type: &'static str,
        /// Resource identifier.
        id: String,
    },

    /// Caller failed authentication or is not entitled to the resource.
    #[error("unauthorized")]
    Unauthorized,

    /// Entity exists but is in the wrong state for the operation.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Uniqueness violation.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Unexpected internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Creates an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(resource_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type,
            id: id.into(),
        }
    }

    /// Creates an invalid state error.
    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// Creates an already exists error.
    #[must_use]
    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::AlreadyExists(message.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if this is an invalid request error.
    #[must_use]
    pub fn is_invalid_request(&self) -> bool {
        matches!(self, Self::InvalidRequest(_))
    }

    /// Returns true if this is a no capacity error.
    #[must_use]
    pub fn is_no_capacity(&self) -> bool {
        matches!(self, Self::NoCapacity)
    }

    /// Returns true if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if this is an unauthorized error.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Returns true if this is an invalid state error.
    #[must_use]
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState(_))
    }

    /// Returns true if this is an already exists error.
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }
}

/// Result type for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicates_match_variants() {
        assert!(ApplicationError::invalid_request("x").is_invalid_request());
        assert!(ApplicationError::NoCapacity.is_no_capacity());
        assert!(ApplicationError::not_found("Transaction", "t1").is_not_found());
        assert!(ApplicationError::Unauthorized.is_unauthorized());
        assert!(ApplicationError::invalid_state("x").is_invalid_state());
        assert!(ApplicationError::already_exists("x").is_already_exists());
    }

    #[test]
    fn repository_errors_convert() {
        let err: ApplicationError =
            RepositoryError::not_found("Transaction", "t1").into();
        assert!(matches!(err, ApplicationError::Repository(_)));
    }

    #[test]
    fn display_includes_context() {
        let err = ApplicationError::not_found("Transaction", "t1");
        assert_eq!(err.to_string(), "Transaction not found: t1");
    }
}
