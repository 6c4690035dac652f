//! Configuration for the geoload pipeline.
//!
//! Holds the typed configuration structures shared by the pipeline library and the loader binary,
//! together with the hierarchical loader that reads them from files and environment variables.

mod environment;
mod load;
pub mod shared;

pub use environment::Environment;
pub use load::{Config, LoadConfigError, load_config, load_config_from};
