//! Data destination abstractions for the load pipeline.
//!
//! This module provides the core [`Destination`] trait and an in-memory implementation. Warehouse
//! backed destinations live in their own crates.

mod base;
pub mod memory;

pub use base::Destination;
