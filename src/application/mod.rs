//! # Application Layer
//!
//! Use-case orchestration over the domain: dispatch, reconciliation,
//! quota tracking, SLA monitoring and disputes.

pub mod error;
pub mod services;

pub use error::{ApplicationError, ApplicationResult};
