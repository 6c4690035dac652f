use geoload::destination::Destination;
use geoload::destination::memory::MemoryDestination;
use geoload::error::ErrorKind;
use geoload::pipeline::PipelineSummary;
use geoload::schema::{DestinationTableSchema, FieldType};
use geoload::source::memory::MemoryRowSource;
use geoload::test_utils::pipeline::{
    appended_records, create_pipeline, test_now, test_pipeline_config,
};
use geoload::test_utils::records::{county_records, ids};
use geoload::{bail, etl_error};
use geoload_config::shared::DeduplicationMode;
use geoload_telemetry::init_test_tracing;

#[tokio::test(flavor = "multi_thread")]
async fn seven_records_are_appended_in_two_batches() {
    init_test_tracing();
    let source = MemoryRowSource::new(county_records(7));
    let destination = MemoryDestination::new();

    let summary = create_pipeline(test_pipeline_config(5), source, destination.clone())
        .run()
        .await
        .unwrap();

    let batches = appended_records(&destination.appended_batches().await);
    let batch_ids: Vec<Vec<i64>> = batches.iter().map(|batch| ids(batch)).collect();
    assert_eq!(batch_ids, vec![vec![1, 2, 3, 4, 5], vec![6, 7]]);
    assert_eq!(
        summary,
        PipelineSummary {
            records_read: 7,
            batches_appended: 2,
            append_attempts: 2,
        }
    );
    assert!(destination.is_shut_down().await);
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_source_still_provisions_the_table() {
    init_test_tracing();
    let source = MemoryRowSource::new(Vec::new());
    let destination = MemoryDestination::new();

    let summary = create_pipeline(test_pipeline_config(5), source, destination.clone())
        .run()
        .await
        .unwrap();

    assert_eq!(summary, PipelineSummary::default());
    assert_eq!(destination.append_attempts().await, 0);

    let schema = destination.table_schema().await.unwrap();
    let field_types: Vec<_> = schema
        .fields()
        .iter()
        .map(|field| (field.name, field.field_type))
        .collect();
    assert_eq!(
        field_types,
        vec![
            ("id", FieldType::Int64),
            ("county_fp", FieldType::String),
            ("geom", FieldType::Geography),
        ]
    );
    assert_eq!(
        schema,
        DestinationTableSchema::provisioned_at(test_now()).unwrap()
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn existing_table_aborts_before_reading_the_source() {
    init_test_tracing();
    let source = MemoryRowSource::new(county_records(3));
    let destination = MemoryDestination::new();
    destination
        .create_table(&DestinationTableSchema::provisioned_at(test_now()).unwrap())
        .await
        .unwrap();

    let err = create_pipeline(test_pipeline_config(5), source.clone(), destination.clone())
        .run()
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DestinationTableAlreadyExists);
    assert_eq!(source.records_read().await, 0);
    assert_eq!(destination.append_attempts().await, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn provisioning_failure_is_returned_as_is() {
    init_test_tracing();
    let source = MemoryRowSource::new(county_records(3));
    let destination = MemoryDestination::new();
    destination
        .fail_table_creation_with(etl_error!(
            ErrorKind::PermissionDenied,
            "Access denied to dataset"
        ))
        .await;

    let err = create_pipeline(test_pipeline_config(5), source.clone(), destination.clone())
        .run()
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    assert_eq!(source.records_read().await, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn source_failure_halts_before_later_batches() {
    init_test_tracing();
    let source = MemoryRowSource::new(county_records(12));
    source.fail_after(7, ErrorKind::ConversionError).await;
    let destination = MemoryDestination::new();

    let err = create_pipeline(test_pipeline_config(5), source, destination.clone())
        .run()
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConversionError);
    // Only the batch completed before the failure was appended, the two buffered records are lost.
    let batches = appended_records(&destination.appended_batches().await);
    assert_eq!(batches.len(), 1);
    assert_eq!(ids(&batches[0]), vec![1, 2, 3, 4, 5]);
    assert!(!destination.is_shut_down().await);
}

#[tokio::test(flavor = "multi_thread")]
async fn exact_multiple_has_no_trailing_append() {
    init_test_tracing();
    let source = MemoryRowSource::new(county_records(10));
    let destination = MemoryDestination::new();

    let summary = create_pipeline(test_pipeline_config(5), source, destination.clone())
        .run()
        .await
        .unwrap();

    assert_eq!(summary.batches_appended, 2);
    assert_eq!(destination.append_attempts().await, 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn content_hash_deduplication_attaches_insert_ids() {
    init_test_tracing();
    let source = MemoryRowSource::new(county_records(3));
    let destination = MemoryDestination::new();
    let mut config = test_pipeline_config(5);
    config.deduplication = DeduplicationMode::ContentHash;

    create_pipeline(config, source, destination.clone())
        .run()
        .await
        .unwrap();

    let batches = destination.appended_batches().await;
    assert_eq!(batches.len(), 1);
    assert!(batches[0].iter().all(|row| row.insert_id.is_some()));
}

#[tokio::test(flavor = "multi_thread")]
async fn zero_batch_size_is_rejected() {
    init_test_tracing();
    let source = MemoryRowSource::new(county_records(3));
    let destination = MemoryDestination::new();

    let err = create_pipeline(test_pipeline_config(0), source, destination.clone())
        .run()
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConfigError);
    assert!(destination.table_schema().await.is_none());
}

#[test]
fn bail_is_usable_outside_the_crate() {
    fn fail() -> geoload::error::EtlResult<()> {
        bail!(ErrorKind::InvalidState, "Always fails");
    }

    assert_eq!(fail().unwrap_err().kind(), ErrorKind::InvalidState);
}
