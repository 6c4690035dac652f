use geoload::destination::Destination;
use geoload::error::EtlResult;
use geoload::schema::DestinationTableSchema;
use geoload::types::AppendRow;
use geoload_config::shared::BigQueryCredentials;
use tracing::info;

use crate::bigquery::client::{BigQueryClient, BigQueryDatasetId, BigQueryProjectId, BigQueryTableId};

/// A BigQuery destination that implements the [`Destination`] trait.
///
/// Targets one table in one dataset. The table is created with a DDL query job and rows are
/// appended through the streaming `insertAll` API, forwarding each row's insert id so that
/// BigQuery can drop duplicates of resubmitted rows.
#[derive(Debug, Clone)]
pub struct BigQueryDestination {
    client: BigQueryClient,
    dataset_id: BigQueryDatasetId,
    table_id: BigQueryTableId,
}

impl BigQueryDestination {
    /// Creates a new [`BigQueryDestination`] from an existing client.
    pub fn new(
        client: BigQueryClient,
        dataset_id: BigQueryDatasetId,
        table_id: BigQueryTableId,
    ) -> Self {
        Self {
            client,
            dataset_id,
            table_id,
        }
    }

    /// Creates a new [`BigQueryDestination`] authenticated with `credentials`.
    pub async fn new_with_credentials(
        project_id: BigQueryProjectId,
        dataset_id: BigQueryDatasetId,
        table_id: BigQueryTableId,
        credentials: &BigQueryCredentials,
    ) -> EtlResult<Self> {
        let client = BigQueryClient::new_with_credentials(project_id, credentials).await?;

        Ok(Self::new(client, dataset_id, table_id))
    }

    /// Creates a new [`BigQueryDestination`] using a service account key JSON string.
    pub async fn new_with_key(
        project_id: BigQueryProjectId,
        dataset_id: BigQueryDatasetId,
        table_id: BigQueryTableId,
        sa_key: &str,
    ) -> EtlResult<Self> {
        let client = BigQueryClient::new_with_key(project_id, sa_key).await?;

        Ok(Self::new(client, dataset_id, table_id))
    }

    /// Creates a new [`BigQueryDestination`] using Application Default Credentials.
    pub async fn new_with_adc(
        project_id: BigQueryProjectId,
        dataset_id: BigQueryDatasetId,
        table_id: BigQueryTableId,
    ) -> EtlResult<Self> {
        let client = BigQueryClient::new_with_adc(project_id).await?;

        Ok(Self::new(client, dataset_id, table_id))
    }

    /// Returns the fully qualified name of the target table.
    pub fn full_table_name(&self) -> EtlResult<String> {
        self.client.full_table_name(&self.dataset_id, &self.table_id)
    }
}

impl Destination for BigQueryDestination {
    fn name() -> &'static str {
        "bigquery"
    }

    async fn create_table(&self, schema: &DestinationTableSchema) -> EtlResult<()> {
        self.client
            .create_table(&self.dataset_id, &self.table_id, schema)
            .await?;

        info!(
            project_id = self.client.project_id(),
            dataset_id = %self.dataset_id,
            table_id = %self.table_id,
            "table created in bigquery"
        );

        Ok(())
    }

    async fn append_rows(&self, rows: &[AppendRow]) -> EtlResult<()> {
        if rows.is_empty() {
            return Ok(());
        }

        self.client
            .insert_rows(&self.dataset_id, &self.table_id, rows)
            .await
    }
}
