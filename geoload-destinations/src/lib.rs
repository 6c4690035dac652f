//! Warehouse destinations for the geoload pipeline.
//!
//! Provides implementations of [`geoload::destination::Destination`] backed by cloud analytics
//! platforms.

#[cfg(feature = "bigquery")]
pub mod bigquery;
pub mod encryption;
