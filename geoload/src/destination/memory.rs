use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::destination::Destination;
use crate::error::{ErrorKind, EtlError, EtlResult};
use crate::etl_error;
use crate::schema::DestinationTableSchema;
use crate::types::AppendRow;

#[derive(Debug)]
struct Inner {
    table_schema: Option<DestinationTableSchema>,
    appended: Vec<Vec<AppendRow>>,
    append_attempts: usize,
    scripted_append_failures: VecDeque<EtlError>,
    create_table_failure: Option<EtlError>,
    shutdown_called: bool,
}

/// In-memory destination for dry runs and testing.
///
/// [`MemoryDestination`] keeps the created table schema and every successful append in memory.
/// Failures can be scripted ahead of time to exercise the retry behavior of the pipeline. Clones
/// share the same state, so a clone kept by a test observes what the pipeline wrote.
///
/// # Examples
///
/// ```rust,no_run
/// use geoload::destination::memory::MemoryDestination;
/// use geoload::error::ErrorKind;
///
/// # #[tokio::main]
/// # async fn main() {
/// let destination = MemoryDestination::new();
///
/// // The first two appends fail, the third one goes through.
/// destination
///     .fail_next_appends(2, ErrorKind::DestinationConnectionFailed)
///     .await;
///
/// // ... run a pipeline with `destination.clone()` ...
///
/// let batches = destination.appended_batches().await;
/// println!("appended {} batches", batches.len());
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryDestination {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryDestination {
    /// Creates a new empty memory destination without a table.
    pub fn new() -> Self {
        let inner = Inner {
            table_schema: None,
            appended: Vec::new(),
            append_attempts: 0,
            scripted_append_failures: VecDeque::new(),
            create_table_failure: None,
            shutdown_called: false,
        };

        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Returns the schema the table was created with, if it was created.
    pub async fn table_schema(&self) -> Option<DestinationTableSchema> {
        let inner = self.inner.lock().await;
        inner.table_schema.clone()
    }

    /// Returns a copy of all successful appends, one entry per append call.
    pub async fn appended_batches(&self) -> Vec<Vec<AppendRow>> {
        let inner = self.inner.lock().await;
        inner.appended.clone()
    }

    /// Returns how many append calls were made, including failed ones.
    pub async fn append_attempts(&self) -> usize {
        let inner = self.inner.lock().await;
        inner.append_attempts
    }

    /// Returns whether [`Destination::shutdown`] was called.
    pub async fn is_shut_down(&self) -> bool {
        let inner = self.inner.lock().await;
        inner.shutdown_called
    }

    /// Makes the next `count` append calls fail with an error of the given kind.
    ///
    /// Failures accumulate with previously scripted ones and are consumed in order.
    pub async fn fail_next_appends(&self, count: usize, kind: ErrorKind) {
        let mut inner = self.inner.lock().await;
        for _ in 0..count {
            inner
                .scripted_append_failures
                .push_back(etl_error!(kind, "Scripted append failure"));
        }
    }

    /// Makes the next append call fail with the given error.
    pub async fn fail_next_append_with(&self, error: EtlError) {
        let mut inner = self.inner.lock().await;
        inner.scripted_append_failures.push_back(error);
    }

    /// Makes the next table creation fail with the given error.
    pub async fn fail_table_creation_with(&self, error: EtlError) {
        let mut inner = self.inner.lock().await;
        inner.create_table_failure = Some(error);
    }
}

impl Default for MemoryDestination {
    fn default() -> Self {
        Self::new()
    }
}

impl Destination for MemoryDestination {
    fn name() -> &'static str {
        "memory"
    }

    async fn shutdown(&self) -> EtlResult<()> {
        let mut inner = self.inner.lock().await;
        inner.shutdown_called = true;

        Ok(())
    }

    async fn create_table(&self, schema: &DestinationTableSchema) -> EtlResult<()> {
        let mut inner = self.inner.lock().await;

        if let Some(err) = inner.create_table_failure.take() {
            return Err(err);
        }

        if inner.table_schema.is_some() {
            return Err(etl_error!(
                ErrorKind::DestinationTableAlreadyExists,
                "Destination table already exists",
                "the memory destination already holds a table"
            ));
        }

        info!(expires_at = %schema.expires_at(), "creating memory table");
        inner.table_schema = Some(schema.clone());

        Ok(())
    }

    async fn append_rows(&self, rows: &[AppendRow]) -> EtlResult<()> {
        let mut inner = self.inner.lock().await;
        inner.append_attempts += 1;

        if let Some(err) = inner.scripted_append_failures.pop_front() {
            return Err(err);
        }

        if inner.table_schema.is_none() {
            return Err(etl_error!(
                ErrorKind::DestinationTableMissing,
                "Destination table does not exist"
            ));
        }

        debug!("appending {} rows to memory table", rows.len());
        inner.appended.push(rows.to_vec());

        Ok(())
    }
}
