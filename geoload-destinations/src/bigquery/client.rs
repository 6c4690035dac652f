use gcp_bigquery_client::client_builder::ClientBuilder;
use gcp_bigquery_client::error::BQError;
use gcp_bigquery_client::model::query_request::QueryRequest;
use gcp_bigquery_client::yup_oauth2::parse_service_account_key;
use gcp_bigquery_client::Client;
use geoload::error::{ErrorKind, EtlError, EtlResult};
use geoload::etl_error;
use geoload::schema::DestinationTableSchema;
use geoload::types::AppendRow;
use geoload_config::shared::BigQueryCredentials;
use secrecy::ExposeSecret;
use std::fmt;
use tracing::{debug, info};

use crate::bigquery::encoding::build_insert_all_request;
use crate::encryption::install_crypto_provider;

/// BigQuery project identifier.
pub type BigQueryProjectId = String;
/// BigQuery dataset identifier.
pub type BigQueryDatasetId = String;
/// BigQuery table identifier.
pub type BigQueryTableId = String;

/// Converts BigQuery errors to load errors with appropriate classification.
///
/// The kind decides whether the pipeline may retry an append, so connectivity and availability
/// failures map to destination kinds while credential, permission and data problems keep their
/// own kinds.
pub(crate) fn bq_error_to_etl_error(err: BQError) -> EtlError {
    let (kind, description) = match &err {
        // Authentication related errors
        BQError::InvalidServiceAccountKey(_) => (
            ErrorKind::AuthenticationError,
            "Invalid BigQuery service account key",
        ),
        BQError::InvalidServiceAccountAuthenticator(_) => (
            ErrorKind::AuthenticationError,
            "Invalid BigQuery service account authenticator",
        ),
        BQError::InvalidApplicationDefaultCredentialsAuthenticator(_) => (
            ErrorKind::AuthenticationError,
            "Invalid BigQuery application default credentials",
        ),
        BQError::AuthError(_) => (
            ErrorKind::AuthenticationError,
            "BigQuery authentication error",
        ),
        BQError::YupAuthError(_) => (
            ErrorKind::AuthenticationError,
            "BigQuery OAuth authentication error",
        ),
        BQError::NoToken => (
            ErrorKind::AuthenticationError,
            "BigQuery authentication token missing",
        ),

        // Network and transport errors
        BQError::RequestError(_) => (ErrorKind::DestinationIoError, "BigQuery request failed"),

        // HTTP responses carrying an error payload
        BQError::ResponseError { error } => {
            classify_response_error(i64::from(error.error.code), &error.error.message)
        }

        // Serialization errors
        BQError::SerializationError(_) => (
            ErrorKind::SerializationError,
            "BigQuery JSON serialization error",
        ),

        _ => (ErrorKind::DestinationError, "BigQuery client error"),
    };

    etl_error!(kind, description, err.to_string())
}

/// Classifies an HTTP error returned by the BigQuery REST API.
fn classify_response_error(code: i64, message: &str) -> (ErrorKind, &'static str) {
    if code == 409 || message.contains("Already Exists") {
        return (
            ErrorKind::DestinationTableAlreadyExists,
            "BigQuery table already exists",
        );
    }

    match code {
        400 => (ErrorKind::InvalidData, "BigQuery rejected the request"),
        401 => (
            ErrorKind::AuthenticationError,
            "BigQuery authentication failed",
        ),
        403 if message.contains("rate") || message.contains("quota") => (
            ErrorKind::DestinationError,
            "BigQuery rate limit exceeded",
        ),
        403 => (ErrorKind::PermissionDenied, "BigQuery permission denied"),
        404 if message.contains("Dataset") => (
            ErrorKind::DestinationNamespaceMissing,
            "BigQuery dataset not found",
        ),
        404 => (ErrorKind::DestinationTableMissing, "BigQuery table not found"),
        429 => (ErrorKind::DestinationError, "BigQuery rate limit exceeded"),
        500 | 502 | 503 | 504 => (ErrorKind::DestinationError, "BigQuery unavailable"),
        _ => (
            ErrorKind::DestinationQueryFailed,
            "BigQuery response error",
        ),
    }
}

/// Client for interacting with Google BigQuery.
///
/// Wraps a single authenticated [`Client`] for one project. Cloning is cheap and clones share the
/// underlying HTTP connection pool.
#[derive(Clone)]
pub struct BigQueryClient {
    project_id: BigQueryProjectId,
    client: Client,
}

impl BigQueryClient {
    /// Creates a new [`BigQueryClient`] authenticated with the given credentials.
    pub async fn new_with_credentials(
        project_id: BigQueryProjectId,
        credentials: &BigQueryCredentials,
    ) -> EtlResult<BigQueryClient> {
        match credentials {
            BigQueryCredentials::ServiceAccountKey { key } => {
                Self::new_with_key(project_id, key.expose_secret()).await
            }
            BigQueryCredentials::ServiceAccountKeyPath { path } => {
                Self::new_with_key_path(project_id, path).await
            }
            BigQueryCredentials::ApplicationDefault => Self::new_with_adc(project_id).await,
        }
    }

    /// Creates a new [`BigQueryClient`] from a service account key file.
    pub async fn new_with_key_path(
        project_id: BigQueryProjectId,
        sa_key_file: &str,
    ) -> EtlResult<BigQueryClient> {
        install_crypto_provider();

        let client = ClientBuilder::new()
            .build_from_service_account_key_file(sa_key_file)
            .await
            .map_err(bq_error_to_etl_error)?;

        Ok(BigQueryClient { project_id, client })
    }

    /// Creates a new [`BigQueryClient`] from a service account key JSON string.
    pub async fn new_with_key(
        project_id: BigQueryProjectId,
        sa_key: &str,
    ) -> EtlResult<BigQueryClient> {
        install_crypto_provider();

        let sa_key = parse_service_account_key(sa_key)
            .map_err(BQError::from)
            .map_err(bq_error_to_etl_error)?;
        let client = ClientBuilder::new()
            .build_from_service_account_key(sa_key, false)
            .await
            .map_err(bq_error_to_etl_error)?;

        Ok(BigQueryClient { project_id, client })
    }

    /// Creates a new [`BigQueryClient`] using Application Default Credentials.
    ///
    /// Returns an error if credentials are missing or invalid.
    pub async fn new_with_adc(project_id: BigQueryProjectId) -> EtlResult<BigQueryClient> {
        install_crypto_provider();

        let client = ClientBuilder::new()
            .build_from_application_default_credentials()
            .await
            .map_err(bq_error_to_etl_error)?;

        Ok(BigQueryClient { project_id, client })
    }

    /// Returns the project this client targets.
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Returns the fully qualified BigQuery table name.
    ///
    /// Formats the table name as `project_id.dataset_id.table_id` with proper quoting.
    pub fn full_table_name(
        &self,
        dataset_id: &BigQueryDatasetId,
        table_id: &BigQueryTableId,
    ) -> EtlResult<String> {
        let project_id = Self::sanitize_identifier(&self.project_id, "BigQuery project id")?;
        let dataset_id = Self::sanitize_identifier(dataset_id, "BigQuery dataset id")?;
        let table_id = Self::sanitize_identifier(table_id, "BigQuery table id")?;

        Ok(format!("`{project_id}.{dataset_id}.{table_id}`"))
    }

    /// Creates a new table in the BigQuery dataset.
    ///
    /// Issues a plain `create table` statement, so the call fails when the table already exists.
    pub async fn create_table(
        &self,
        dataset_id: &BigQueryDatasetId,
        table_id: &BigQueryTableId,
        schema: &DestinationTableSchema,
    ) -> EtlResult<()> {
        let full_table_name = self.full_table_name(dataset_id, table_id)?;
        let query = Self::create_table_query(&full_table_name, schema)?;

        info!(%full_table_name, expires_at = %schema.expires_at(), "creating table in bigquery");

        self.client
            .job()
            .query(&self.project_id, QueryRequest::new(query))
            .await
            .map_err(bq_error_to_etl_error)?;

        Ok(())
    }

    /// Streams rows into a table with a single `tabledata.insertAll` call.
    ///
    /// Rows rejected individually by BigQuery fail the whole call. Rows accepted in the same call
    /// stay inserted, so a resubmission may duplicate them unless they carry insert ids.
    pub async fn insert_rows(
        &self,
        dataset_id: &BigQueryDatasetId,
        table_id: &BigQueryTableId,
        rows: &[AppendRow],
    ) -> EtlResult<()> {
        let request = build_insert_all_request(rows)?;

        debug!(
            %dataset_id,
            %table_id,
            rows = rows.len(),
            "streaming rows into bigquery"
        );

        let response = self
            .client
            .tabledata()
            .insert_all(&self.project_id, dataset_id, table_id, request)
            .await
            .map_err(bq_error_to_etl_error)?;

        if let Some(insert_errors) = response.insert_errors.filter(|errors| !errors.is_empty()) {
            return Err(etl_error!(
                ErrorKind::DestinationError,
                "BigQuery rejected rows of the append",
                format!(
                    "{} of {} rows were rejected: {insert_errors:?}",
                    insert_errors.len(),
                    rows.len()
                )
            ));
        }

        Ok(())
    }

    /// Builds the DDL statement creating a table with `schema`.
    fn create_table_query(
        full_table_name: &str,
        schema: &DestinationTableSchema,
    ) -> EtlResult<String> {
        let mut columns = Vec::with_capacity(schema.fields().len());
        for field in schema.fields() {
            let column_name = Self::sanitize_identifier(field.name, "BigQuery column name")?;
            columns.push(format!("`{column_name}` {}", field.field_type));
        }

        let expiration = schema.expires_at().format("%Y-%m-%d %H:%M:%S%.6f UTC");

        Ok(format!(
            "create table {full_table_name} ({}) options (expiration_timestamp = timestamp '{expiration}')",
            columns.join(", ")
        ))
    }

    /// Sanitizes a BigQuery identifier for safe backtick quoting.
    ///
    /// Rejects empty identifiers and identifiers containing control characters. Backticks and
    /// backslashes are escaped so the value can be wrapped in backticks without altering the
    /// identifier or allowing statement breaks.
    fn sanitize_identifier(identifier: &str, context: &str) -> EtlResult<String> {
        if identifier.is_empty() {
            return Err(etl_error!(
                ErrorKind::DestinationTableNameInvalid,
                "Invalid BigQuery identifier",
                format!("{context} cannot be empty")
            ));
        }

        if identifier.chars().any(char::is_control) {
            return Err(etl_error!(
                ErrorKind::DestinationTableNameInvalid,
                "Invalid BigQuery identifier",
                format!("{context} contains control characters")
            ));
        }

        let mut escaped = String::with_capacity(identifier.len());
        for ch in identifier.chars() {
            match ch {
                '`' => escaped.push_str("\\`"),
                '\\' => escaped.push_str("\\\\"),
                _ => escaped.push(ch),
            }
        }

        Ok(escaped)
    }
}

impl fmt::Debug for BigQueryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BigQueryClient")
            .field("project_id", &self.project_id)
            .finish()
    }
}
