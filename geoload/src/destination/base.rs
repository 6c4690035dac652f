use std::future::Future;

use crate::error::EtlResult;
use crate::schema::DestinationTableSchema;
use crate::types::AppendRow;

/// Trait for systems that can receive loaded rows.
///
/// [`Destination`] implementations define how the destination table is created and how rows are
/// appended to it. A destination targets a single table and is reused for the whole load, so any
/// client or connection it holds should be created once and shared across calls.
///
/// The trait also provides an optional [`Destination::shutdown`] method with a default no-op
/// implementation. Override this method if your destination requires cleanup when the load ends.
pub trait Destination {
    /// Returns the name of the destination.
    fn name() -> &'static str;

    /// Releases resources held by the destination.
    ///
    /// Called once by the pipeline after the last batch was appended. The default implementation
    /// is a no-op.
    fn shutdown(&self) -> impl Future<Output = EtlResult<()>> + Send {
        async { Ok(()) }
    }

    /// Creates the destination table with the given schema.
    ///
    /// The table must not exist yet. Implementations return
    /// [`crate::error::ErrorKind::DestinationTableAlreadyExists`] when it does, instead of
    /// silently reusing it.
    fn create_table(
        &self,
        schema: &DestinationTableSchema,
    ) -> impl Future<Output = EtlResult<()>> + Send;

    /// Appends rows to the destination table in a single call.
    ///
    /// Either the whole call succeeds or it returns an error. Rows rejected individually by the
    /// destination are reported as an error for the whole call, so the caller can resubmit the
    /// same rows. Rows without an insert id may be duplicated by such a resubmission.
    fn append_rows(&self, rows: &[AppendRow]) -> impl Future<Output = EtlResult<()>> + Send;
}
