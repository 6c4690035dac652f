use geoload_config::shared::PipelineConfig;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{error, info};

use crate::batch::BatchAccumulator;
use crate::bail;
use crate::clock::{Clock, SystemClock};
use crate::destination::Destination;
use crate::error::{ErrorKind, EtlResult};
use crate::inserter::RetryingInserter;
use crate::provisioner::TableProvisioner;
use crate::retry::RetryPolicy;
use crate::source::RowSource;
use crate::types::Batch;

/// Counters describing a completed load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    /// Records read from the source.
    pub records_read: u64,
    /// Batches appended to the destination.
    pub batches_appended: u64,
    /// Append calls made, including failed ones that were retried.
    pub append_attempts: u64,
}

/// Loads every record of a source into a freshly created destination table.
///
/// The run is strictly sequential: the table is provisioned first, then records are read one at a
/// time and each full batch is appended before the next record is read. Provisioning and source
/// errors end the run immediately. Append errors go through the [`RetryPolicy`].
#[derive(Debug)]
pub struct Pipeline<S, D> {
    config: PipelineConfig,
    source: S,
    destination: D,
    retry_policy: RetryPolicy,
    clock: Arc<dyn Clock>,
}

impl<S, D> Pipeline<S, D>
where
    S: RowSource,
    D: Destination,
{
    pub fn new(config: PipelineConfig, source: S, destination: D) -> Self {
        let retry_policy = RetryPolicy::from(&config.retry);

        Self {
            config,
            source,
            destination,
            retry_policy,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the retry policy derived from the configuration.
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Replaces the clock used to compute the table expiration.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Runs the load to completion and shuts the destination down.
    pub async fn run(mut self) -> EtlResult<PipelineSummary> {
        if let Err(err) = self.config.validate() {
            bail!(
                ErrorKind::ConfigError,
                "Invalid pipeline configuration",
                source: err
            );
        }

        let Some(capacity) = NonZeroUsize::new(self.config.batch.max_size) else {
            bail!(
                ErrorKind::ConfigError,
                "Batch size must be greater than zero"
            );
        };

        info!(
            source = S::name(),
            destination = D::name(),
            batch_size = capacity.get(),
            "starting pipeline"
        );

        // The table must exist before anything is read, an existing table aborts the load.
        TableProvisioner::new(self.clock.clone())
            .provision(&self.destination)
            .await?;

        let inserter = RetryingInserter::new(
            &self.destination,
            &self.retry_policy,
            self.config.deduplication,
        );
        let mut accumulator = BatchAccumulator::new(capacity);
        let mut summary = PipelineSummary::default();

        while let Some(record) = self.source.next_record().await? {
            summary.records_read += 1;

            if let Some(batch) = accumulator.offer(record) {
                submit(&inserter, &batch, &mut summary).await?;
            }
        }

        if let Some(batch) = accumulator.flush_remainder() {
            submit(&inserter, &batch, &mut summary).await?;
        }

        if let Err(err) = self.destination.shutdown().await {
            error!(error = %err, "failed to shut down destination");
            return Err(err);
        }

        info!(
            records_read = summary.records_read,
            batches_appended = summary.batches_appended,
            append_attempts = summary.append_attempts,
            "pipeline completed"
        );

        Ok(summary)
    }
}

async fn submit<D>(
    inserter: &RetryingInserter<'_, D>,
    batch: &Batch,
    summary: &mut PipelineSummary,
) -> EtlResult<()>
where
    D: Destination,
{
    let report = inserter.submit(batch).await?;
    summary.batches_appended += 1;
    summary.append_attempts += u64::from(report.attempts);

    Ok(())
}
