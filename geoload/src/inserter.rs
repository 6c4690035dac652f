//! Submission of batches with retries.

use geoload_config::shared::DeduplicationMode;
use tracing::{debug, error, warn};

use crate::destination::Destination;
use crate::error::EtlResult;
use crate::retry::{RetryDecision, RetryPolicy};
use crate::types::Batch;

/// Outcome of a successful [`RetryingInserter::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitReport {
    /// Number of append calls made, including the successful one.
    pub attempts: u32,
    /// Number of rows appended.
    pub rows: usize,
}

/// Appends batches to a destination, resubmitting a failed batch as the [`RetryPolicy`] allows.
///
/// Each attempt is one append call carrying the whole batch. The rows of a batch are built once,
/// so every attempt sends identical rows. The pause between attempts blocks the caller.
#[derive(Debug)]
pub struct RetryingInserter<'a, D> {
    destination: &'a D,
    policy: &'a RetryPolicy,
    deduplication: DeduplicationMode,
}

impl<'a, D> RetryingInserter<'a, D>
where
    D: Destination,
{
    pub fn new(
        destination: &'a D,
        policy: &'a RetryPolicy,
        deduplication: DeduplicationMode,
    ) -> Self {
        Self {
            destination,
            policy,
            deduplication,
        }
    }

    /// Appends `batch`, retrying until it succeeds or the policy gives up.
    ///
    /// When the policy gives up, the error of the last attempt is returned.
    pub async fn submit(&self, batch: &Batch) -> EtlResult<SubmitReport> {
        let rows = batch.to_append_rows(self.deduplication);
        let mut attempt: u32 = 1;

        loop {
            match self.destination.append_rows(&rows).await {
                Ok(()) => {
                    debug!(
                        batch = batch.sequence(),
                        rows = rows.len(),
                        attempt,
                        "appended batch"
                    );

                    return Ok(SubmitReport {
                        attempts: attempt,
                        rows: rows.len(),
                    });
                }
                Err(err) => match self.policy.decide(attempt, &err) {
                    RetryDecision::RetryAfter(delay) => {
                        warn!(
                            batch = batch.sequence(),
                            attempt,
                            retry_in_ms = delay.as_millis() as u64,
                            error = %err,
                            "failed to append batch, retrying"
                        );

                        tokio::time::sleep(delay).await;
                        attempt = attempt.saturating_add(1);
                    }
                    RetryDecision::GiveUp => {
                        error!(
                            batch = batch.sequence(),
                            attempt,
                            error = %err,
                            "failed to append batch, giving up"
                        );

                        return Err(err);
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destination::memory::MemoryDestination;
    use crate::error::ErrorKind;
    use crate::schema::DestinationTableSchema;
    use crate::types::CountyRecord;
    use chrono::Utc;
    use std::time::Duration;

    async fn destination() -> MemoryDestination {
        let destination = MemoryDestination::new();
        destination
            .create_table(&DestinationTableSchema::provisioned_at(Utc::now()).unwrap())
            .await
            .unwrap();

        destination
    }

    fn batch() -> Batch {
        Batch::new(
            1,
            vec![
                CountyRecord::new(1, "001", "POINT(0 0)"),
                CountyRecord::new(2, "003", "POINT(1 1)"),
            ],
        )
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_append_succeeds() {
        let destination = destination().await;
        destination
            .fail_next_appends(3, ErrorKind::DestinationConnectionFailed)
            .await;
        let policy = RetryPolicy::unbounded(Duration::from_secs(2));
        let inserter = RetryingInserter::new(&destination, &policy, DeduplicationMode::Disabled);

        let started = tokio::time::Instant::now();
        let report = inserter.submit(&batch()).await.unwrap();

        assert_eq!(report, SubmitReport { attempts: 4, rows: 2 });
        assert_eq!(started.elapsed(), Duration::from_secs(6));
        assert_eq!(destination.append_attempts().await, 4);
        assert_eq!(destination.appended_batches().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_with_last_error() {
        let destination = destination().await;
        destination
            .fail_next_appends(1, ErrorKind::DestinationConnectionFailed)
            .await;
        destination
            .fail_next_appends(1, ErrorKind::DestinationIoError)
            .await;
        let policy = RetryPolicy::unbounded(Duration::from_secs(1)).with_max_attempts(2);
        let inserter = RetryingInserter::new(&destination, &policy, DeduplicationMode::Disabled);

        let err = inserter.submit(&batch()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::DestinationIoError);
        assert_eq!(destination.append_attempts().await, 2);
        assert!(destination.appended_batches().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn retried_rows_keep_their_insert_ids() {
        let destination = destination().await;
        destination
            .fail_next_appends(1, ErrorKind::DestinationError)
            .await;
        let policy = RetryPolicy::unbounded(Duration::from_secs(2));
        let inserter =
            RetryingInserter::new(&destination, &policy, DeduplicationMode::ContentHash);
        let batch = batch();

        inserter.submit(&batch).await.unwrap();

        let appended = destination.appended_batches().await;
        assert_eq!(
            appended,
            vec![batch.to_append_rows(DeduplicationMode::ContentHash)]
        );
    }
}
