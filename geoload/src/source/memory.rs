use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::bail;
use crate::error::{ErrorKind, EtlResult};
use crate::source::RowSource;
use crate::types::CountyRecord;

#[derive(Debug)]
struct Inner {
    pending: VecDeque<CountyRecord>,
    records_read: usize,
    fail_after: Option<(usize, ErrorKind)>,
}

/// In-memory row source for dry runs and testing.
///
/// Clones share the same cursor, so a clone kept by a test can observe how far the pipeline read.
#[derive(Debug, Clone)]
pub struct MemoryRowSource {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryRowSource {
    /// Creates a source yielding `records` in order.
    pub fn new(records: Vec<CountyRecord>) -> Self {
        let inner = Inner {
            pending: records.into(),
            records_read: 0,
            fail_after: None,
        };

        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Makes the source fail with an error of the given kind once `count` records were read.
    pub async fn fail_after(&self, count: usize, kind: ErrorKind) {
        let mut inner = self.inner.lock().await;
        inner.fail_after = Some((count, kind));
    }

    /// Returns how many records were handed out so far.
    pub async fn records_read(&self) -> usize {
        let inner = self.inner.lock().await;
        inner.records_read
    }
}

impl RowSource for MemoryRowSource {
    fn name() -> &'static str {
        "memory"
    }

    async fn next_record(&mut self) -> EtlResult<Option<CountyRecord>> {
        let mut inner = self.inner.lock().await;

        if let Some((count, kind)) = inner.fail_after
            && inner.records_read >= count
        {
            bail!(
                kind,
                "Scripted source failure",
                format!("failed after {count} records")
            );
        }

        let record = inner.pending.pop_front();
        if record.is_some() {
            inner.records_read += 1;
        }

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn yields_records_in_order_then_none() {
        let mut source = MemoryRowSource::new(vec![
            CountyRecord::new(1, "001", "POINT(0 0)"),
            CountyRecord::new(2, "003", "POINT(1 1)"),
        ]);

        assert_eq!(source.next_record().await.unwrap().unwrap().id, 1);
        assert_eq!(source.next_record().await.unwrap().unwrap().id, 2);
        assert!(source.next_record().await.unwrap().is_none());
        assert_eq!(source.records_read().await, 2);
    }

    #[tokio::test]
    async fn scripted_failure_stops_the_cursor() {
        let mut source = MemoryRowSource::new(vec![
            CountyRecord::new(1, "001", "POINT(0 0)"),
            CountyRecord::new(2, "003", "POINT(1 1)"),
        ]);
        source.fail_after(1, ErrorKind::ConversionError).await;

        assert!(source.next_record().await.unwrap().is_some());
        let err = source.next_record().await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ConversionError);
        assert_eq!(source.records_read().await, 1);
    }
}
