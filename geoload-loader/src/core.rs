use geoload::destination::Destination;
use geoload::destination::memory::MemoryDestination;
use geoload::pipeline::{Pipeline, PipelineSummary};
use geoload::source::postgres::PostgresRowSource;
use geoload_config::shared::{
    BatchConfig, DestinationConfig, LoaderConfig, PgConnectionConfig, PipelineConfig, RetryConfig,
    SourceTableConfig,
};
use geoload_destinations::bigquery::BigQueryDestination;
use tracing::{debug, info};

use crate::error::LoaderResult;

/// Runs one load with the provided configuration.
///
/// Connects to the source table, builds the configured destination and runs the pipeline to
/// completion. Each destination gets its own pipeline type since dispatch is static.
pub async fn start_loader_with_config(loader_config: LoaderConfig) -> LoaderResult<()> {
    info!("starting loader");

    log_config(&loader_config);

    let LoaderConfig {
        source,
        source_table,
        destination,
        pipeline,
    } = loader_config;

    // The source connects on its first read, after the pipeline has provisioned the table.
    let row_source = PostgresRowSource::new(source, &source_table);

    let summary = match destination {
        DestinationConfig::Memory => {
            let destination = MemoryDestination::new();
            run_pipeline(Pipeline::new(pipeline, row_source, destination)).await?
        }
        DestinationConfig::BigQuery {
            project_id,
            dataset_id,
            table_id,
            credentials,
        } => {
            let destination = BigQueryDestination::new_with_credentials(
                project_id,
                dataset_id,
                table_id,
                &credentials,
            )
            .await?;
            run_pipeline(Pipeline::new(pipeline, row_source, destination)).await?
        }
    };

    info!(
        records_read = summary.records_read,
        batches_appended = summary.batches_appended,
        append_attempts = summary.append_attempts,
        "loader completed"
    );

    Ok(())
}

async fn run_pipeline<D>(
    pipeline: Pipeline<PostgresRowSource, D>,
) -> LoaderResult<PipelineSummary>
where
    D: Destination,
{
    let summary = pipeline.run().await?;

    Ok(summary)
}

fn log_config(config: &LoaderConfig) {
    log_pg_connection_config(&config.source);
    log_source_table_config(&config.source_table);
    log_destination_config(&config.destination);
    log_pipeline_config(&config.pipeline);
}

fn log_pg_connection_config(config: &PgConnectionConfig) {
    debug!(
        host = config.host,
        port = config.port,
        dbname = config.name,
        username = config.username,
        tls_enabled = config.tls.enabled,
        "source postgres connection config",
    );
}

fn log_source_table_config(config: &SourceTableConfig) {
    debug!(
        schema = config.schema,
        table = config.table,
        id_column = config.id_column,
        county_fp_column = config.county_fp_column,
        geometry_column = config.geometry_column,
        geometry_format = ?config.geometry_format,
        "source table config"
    );
}

fn log_destination_config(config: &DestinationConfig) {
    match config {
        DestinationConfig::Memory => {
            debug!("using memory destination config");
        }
        DestinationConfig::BigQuery {
            project_id,
            dataset_id,
            table_id,
            credentials: _,
        } => {
            debug!(
                project_id,
                dataset_id, table_id, "using bigquery destination config"
            )
        }
    }
}

fn log_pipeline_config(config: &PipelineConfig) {
    debug!(deduplication = ?config.deduplication, "pipeline config");
    log_batch_config(&config.batch);
    log_retry_config(&config.retry);
}

fn log_batch_config(config: &BatchConfig) {
    debug!(max_size = config.max_size, "batch config");
}

fn log_retry_config(config: &RetryConfig) {
    debug!(
        max_attempts = config.max_attempts,
        initial_delay_ms = config.initial_delay_ms,
        max_delay_ms = config.max_delay_ms,
        backoff_multiplier = config.backoff_multiplier,
        retry_non_transient = config.retry_non_transient,
        "retry config"
    );
}
