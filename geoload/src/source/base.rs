use std::future::Future;

use crate::error::EtlResult;
use crate::types::CountyRecord;

/// Trait for sequential cursors over the source table.
///
/// Records are returned in the order the source produces them. Once [`RowSource::next_record`]
/// returned `Ok(None)` the source is exhausted. Any error is final: the pipeline does not call the
/// source again after a failure.
pub trait RowSource {
    /// Returns the name of the source.
    fn name() -> &'static str;

    /// Returns the next record, or [`None`] when the source is exhausted.
    fn next_record(&mut self) -> impl Future<Output = EtlResult<Option<CountyRecord>>> + Send;
}
