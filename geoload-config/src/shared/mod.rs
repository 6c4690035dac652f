//! Shared configuration types for the geoload pipeline.

mod base;
mod batch;
mod connection;
mod destination;
mod loader;
mod pipeline;
mod retry;
mod source;

pub use base::ValidationError;
pub use batch::BatchConfig;
pub use connection::{IntoConnectOptions, PgConnectionConfig, TlsConfig};
pub use destination::{BigQueryCredentials, DeduplicationMode, DestinationConfig};
pub use loader::LoaderConfig;
pub use pipeline::PipelineConfig;
pub use retry::RetryConfig;
pub use source::{GeometryFormat, SourceTableConfig};
