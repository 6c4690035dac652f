//! Row sources feeding the load pipeline.
//!
//! A [`RowSource`] is a sequential cursor producing one [`crate::types::CountyRecord`] at a time.

mod base;
pub mod memory;
pub mod postgres;

pub use base::RowSource;
