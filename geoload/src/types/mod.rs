//! Common types moved through the load pipeline.

mod batch;
mod record;

pub use batch::*;
pub use record::*;
