use serde::Deserialize;

use crate::Config;
use crate::shared::{
    DestinationConfig, PgConnectionConfig, PipelineConfig, SourceTableConfig, ValidationError,
};

/// Complete configuration for one run of the loader.
///
/// Typically loaded from configuration files at startup with [`crate::load_config`].
///
/// This intentionally does not implement [`Serialize`](serde::Serialize) to avoid accidentally
/// leaking secrets in the config into serialized forms.
#[derive(Debug, Clone, Deserialize)]
pub struct LoaderConfig {
    /// Connection to the source Postgres database.
    pub source: PgConnectionConfig,
    /// Table scanned on the source.
    pub source_table: SourceTableConfig,
    /// Where rows are loaded.
    pub destination: DestinationConfig,
    /// Batching, retry and deduplication settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl Config for LoaderConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        self.source.validate()?;
        self.source_table.validate()?;
        self.destination.validate()?;
        self.pipeline.validate()
    }
}
