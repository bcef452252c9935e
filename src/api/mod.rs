//! # API Layer
//!
//! Transport adapters exposing the application services.

pub mod rest;
