//! Helpers shared by unit and integration tests.
//!
//! - [`records`] builds deterministic county records.
//! - [`pipeline`] wires memory sources and destinations into a pipeline with a fixed clock.

pub mod pipeline;
pub mod records;
