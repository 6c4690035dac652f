use geoload_config::shared::DeduplicationMode;

use crate::dedup::content_hash_insert_id;
use crate::types::{AppendRow, CountyRecord};

/// An ordered group of records submitted to the destination as one unit.
///
/// A batch is never split or reordered once created. Retries resend the exact same rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    sequence: u64,
    records: Vec<CountyRecord>,
}

impl Batch {
    /// Creates a new [`Batch`] with the given sequence number.
    pub fn new(sequence: u64, records: Vec<CountyRecord>) -> Self {
        Self { sequence, records }
    }

    /// Returns the position of this batch in the load, starting at 1.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns the records of this batch in insertion order.
    pub fn records(&self) -> &[CountyRecord] {
        &self.records
    }

    /// Returns the number of records in this batch.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if this batch holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Builds the rows sent to the destination for this batch.
    ///
    /// Insert ids depend only on the record content, so calling this again for a retry yields
    /// identical rows.
    pub fn to_append_rows(&self, deduplication: DeduplicationMode) -> Vec<AppendRow> {
        self.records
            .iter()
            .map(|record| match deduplication {
                DeduplicationMode::Disabled => AppendRow::new(record.clone()),
                DeduplicationMode::ContentHash => {
                    AppendRow::with_insert_id(record.clone(), content_hash_insert_id(record))
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch() -> Batch {
        Batch::new(
            1,
            vec![
                CountyRecord::new(1, "001", "POINT(1 1)"),
                CountyRecord::new(2, "003", "POINT(2 2)"),
            ],
        )
    }

    #[test]
    fn disabled_deduplication_omits_insert_ids() {
        let rows = batch().to_append_rows(DeduplicationMode::Disabled);

        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.insert_id.is_none()));
        assert_eq!(rows[0].record.id, 1);
        assert_eq!(rows[1].record.id, 2);
    }

    #[test]
    fn content_hash_ids_are_stable_across_calls() {
        let batch = batch();

        let first = batch.to_append_rows(DeduplicationMode::ContentHash);
        let second = batch.to_append_rows(DeduplicationMode::ContentHash);

        assert_eq!(first, second);
        assert!(first.iter().all(|row| row.insert_id.is_some()));
        assert_ne!(first[0].insert_id, first[1].insert_id);
    }

    #[test]
    fn len_counts_records() {
        assert_eq!(batch().len(), 2);
        assert!(!batch().is_empty());
        assert!(Batch::new(2, Vec::new()).is_empty());
    }
}
