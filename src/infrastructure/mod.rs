//! # Infrastructure Layer
//!
//! Adapters for the outside world: persistence ports and their
//! in-memory implementations.

pub mod persistence;
