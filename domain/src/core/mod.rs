//! Core domain concepts shared across the crate.
//!
//! - [`model::Model`]: chat models the providers can serve
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod model;
