use geoload::destination::memory::MemoryDestination;
use geoload::error::ErrorKind;
use geoload::source::memory::MemoryRowSource;
use geoload::test_utils::pipeline::{appended_records, create_pipeline, test_pipeline_config};
use geoload::test_utils::records::{county_records, ids};
use geoload_config::shared::RetryConfig;
use geoload_telemetry::init_test_tracing;
use std::time::Duration;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn failing_append_is_retried_until_it_succeeds() {
    init_test_tracing();
    let source = MemoryRowSource::new(county_records(7));
    let destination = MemoryDestination::new();
    destination
        .fail_next_appends(3, ErrorKind::DestinationConnectionFailed)
        .await;

    let started = Instant::now();
    let summary = create_pipeline(test_pipeline_config(5), source, destination.clone())
        .run()
        .await
        .unwrap();

    // Three failed attempts on the first batch, each followed by the default two second pause.
    assert_eq!(started.elapsed(), Duration::from_secs(6));
    assert_eq!(summary.append_attempts, 5);
    assert_eq!(destination.append_attempts().await, 5);

    let batches = appended_records(&destination.appended_batches().await);
    let batch_ids: Vec<Vec<i64>> = batches.iter().map(|batch| ids(batch)).collect();
    assert_eq!(batch_ids, vec![vec![1, 2, 3, 4, 5], vec![6, 7]]);
}

#[tokio::test(start_paused = true)]
async fn final_partial_batch_is_retried_too() {
    init_test_tracing();
    let source = MemoryRowSource::new(county_records(2));
    let destination = MemoryDestination::new();
    destination
        .fail_next_appends(2, ErrorKind::DestinationIoError)
        .await;

    let summary = create_pipeline(test_pipeline_config(5), source, destination.clone())
        .run()
        .await
        .unwrap();

    assert_eq!(summary.batches_appended, 1);
    assert_eq!(summary.append_attempts, 3);
    let batches = appended_records(&destination.appended_batches().await);
    assert_eq!(ids(&batches[0]), vec![1, 2]);
}

#[tokio::test(start_paused = true)]
async fn bounded_policy_gives_up_and_skips_later_batches() {
    init_test_tracing();
    let source = MemoryRowSource::new(county_records(12));
    let destination = MemoryDestination::new();
    destination
        .fail_next_appends(10, ErrorKind::DestinationConnectionFailed)
        .await;
    let mut config = test_pipeline_config(5);
    config.retry = RetryConfig {
        max_attempts: Some(3),
        initial_delay_ms: 100,
        max_delay_ms: 1000,
        backoff_multiplier: 2.0,
        retry_non_transient: true,
    };

    let started = Instant::now();
    let err = create_pipeline(config, source.clone(), destination.clone())
        .run()
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DestinationConnectionFailed);
    assert_eq!(destination.append_attempts().await, 3);
    assert!(destination.appended_batches().await.is_empty());
    // Pauses of 100ms and 200ms separate the three attempts.
    assert_eq!(started.elapsed(), Duration::from_millis(300));
    // Reading stopped with the first batch.
    assert_eq!(source.records_read().await, 5);
}

#[tokio::test(start_paused = true)]
async fn permanent_error_stops_immediately_when_opted_out() {
    init_test_tracing();
    let source = MemoryRowSource::new(county_records(3));
    let destination = MemoryDestination::new();
    destination
        .fail_next_appends(1, ErrorKind::AuthenticationError)
        .await;
    let mut config = test_pipeline_config(5);
    config.retry.retry_non_transient = false;

    let err = create_pipeline(config, source, destination.clone())
        .run()
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::AuthenticationError);
    assert_eq!(destination.append_attempts().await, 1);
}

#[tokio::test(start_paused = true)]
async fn transient_error_is_retried_when_permanent_ones_are_not() {
    init_test_tracing();
    let source = MemoryRowSource::new(county_records(3));
    let destination = MemoryDestination::new();
    destination
        .fail_next_appends(2, ErrorKind::DestinationConnectionFailed)
        .await;
    let mut config = test_pipeline_config(5);
    config.retry.retry_non_transient = false;

    let summary = create_pipeline(config, source, destination.clone())
        .run()
        .await
        .unwrap();

    assert_eq!(summary.append_attempts, 3);
}

#[tokio::test(start_paused = true)]
async fn invalid_retry_config_is_rejected_before_provisioning() {
    init_test_tracing();
    let source = MemoryRowSource::new(county_records(7));
    let destination = MemoryDestination::new();
    destination
        .fail_next_appends(2, ErrorKind::DestinationConnectionFailed)
        .await;

    let mut config = test_pipeline_config(5);
    config.retry.backoff_multiplier = -2.0;

    let err = create_pipeline(config, source, destination.clone())
        .run()
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConfigError);
    assert!(destination.table_schema().await.is_none());
    assert_eq!(destination.append_attempts().await, 0);
}
