use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Configuration for the destination of the load.
///
/// This intentionally does not implement [`Serialize`] to avoid accidentally
/// leaking secrets in the config into serialized forms.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationConfig {
    /// Keeps appended rows in memory. Useful to dry-run a source without a warehouse.
    Memory,
    /// Google BigQuery destination configuration.
    BigQuery {
        /// Google Cloud project identifier.
        project_id: String,
        /// BigQuery dataset identifier.
        dataset_id: String,
        /// Table created and loaded by the pipeline.
        table_id: String,
        /// How the client authenticates against Google Cloud.
        credentials: BigQueryCredentials,
    },
}

impl DestinationConfig {
    /// Validates the destination configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let DestinationConfig::BigQuery {
            project_id,
            dataset_id,
            table_id,
            ..
        } = self
        {
            let identifiers = [
                ("destination.big_query.project_id", project_id),
                ("destination.big_query.dataset_id", dataset_id),
                ("destination.big_query.table_id", table_id),
            ];

            for (field, value) in identifiers {
                if value.trim().is_empty() {
                    return Err(ValidationError::EmptyIdentifier(field));
                }
            }
        }

        Ok(())
    }
}

/// Credentials used by the BigQuery client.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BigQueryCredentials {
    /// Service account key JSON passed inline.
    ServiceAccountKey { key: SecretString },
    /// Path of a service account key JSON file.
    ServiceAccountKeyPath { path: String },
    /// Application default credentials from the environment.
    ApplicationDefault,
}

/// Controls whether appended rows carry an insert id.
///
/// BigQuery uses insert ids for best-effort deduplication of streaming inserts. Without them a
/// retried append whose first attempt was durably accepted produces duplicate rows, in exchange
/// for higher streaming throughput.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeduplicationMode {
    /// Rows are sent without insert ids.
    #[default]
    Disabled,
    /// Each row carries an insert id derived from the row content.
    ContentHash,
}
