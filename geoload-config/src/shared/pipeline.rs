use serde::{Deserialize, Serialize};

use crate::shared::{BatchConfig, DeduplicationMode, RetryConfig, ValidationError};

/// Settings that shape how the pipeline moves rows, independent of where they come from or go to.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct PipelineConfig {
    /// Batching of appended rows.
    #[serde(default)]
    pub batch: BatchConfig,
    /// Retry behavior for failed appends.
    #[serde(default)]
    pub retry: RetryConfig,
    /// Whether appended rows carry insert ids.
    #[serde(default)]
    pub deduplication: DeduplicationMode,
}

impl PipelineConfig {
    /// Validates the batch and retry settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.batch.validate()?;
        self.retry.validate()
    }
}
