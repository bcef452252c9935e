//! # Domain Layer
//!
//! Core business logic: entities, value objects and domain errors.
//!
//! This layer has no dependencies on application services, persistence or
//! transport; it only encodes the rules of payment-collection dispatch.

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use errors::{DomainError, DomainResult};
