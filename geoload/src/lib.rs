//! Batch loading of geospatial rows from Postgres into an analytics warehouse.
//!
//! A [`pipeline::Pipeline`] provisions the destination table, scans a [`source::RowSource`],
//! groups records into fixed-size batches and appends each batch to a
//! [`destination::Destination`], retrying failed appends according to a [`retry::RetryPolicy`].

pub mod batch;
pub mod clock;
pub mod dedup;
pub mod destination;
pub mod error;
pub mod inserter;
mod macros;
pub mod pipeline;
pub mod provisioner;
pub mod retry;
pub mod schema;
pub mod source;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
