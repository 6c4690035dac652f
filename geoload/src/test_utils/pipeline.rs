use chrono::{DateTime, TimeZone, Utc};
use geoload_config::shared::{BatchConfig, PipelineConfig};
use std::sync::Arc;

use crate::clock::FixedClock;
use crate::destination::memory::MemoryDestination;
use crate::pipeline::Pipeline;
use crate::source::memory::MemoryRowSource;
use crate::types::{AppendRow, CountyRecord};

/// Instant returned by the clock of test pipelines.
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 1, 15, 8, 0, 0)
        .single()
        .expect("valid test timestamp")
}

/// Pipeline configuration with the given batch size and default retry settings.
pub fn test_pipeline_config(max_size: usize) -> PipelineConfig {
    PipelineConfig {
        batch: BatchConfig { max_size },
        ..PipelineConfig::default()
    }
}

/// Creates a pipeline over memory components with a fixed clock.
///
/// Retries follow `config.retry`. With the defaults a failing append is retried forever every two
/// seconds, so tests driving failures should run with paused tokio time.
pub fn create_pipeline(
    config: PipelineConfig,
    source: MemoryRowSource,
    destination: MemoryDestination,
) -> Pipeline<MemoryRowSource, MemoryDestination> {
    Pipeline::new(config, source, destination).with_clock(Arc::new(FixedClock::new(test_now())))
}

/// Returns the records of each appended batch, dropping insert ids.
pub fn appended_records(batches: &[Vec<AppendRow>]) -> Vec<Vec<CountyRecord>> {
    batches
        .iter()
        .map(|rows| rows.iter().map(|row| row.record.clone()).collect())
        .collect()
}
