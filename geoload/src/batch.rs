//! Grouping of records into fixed-size batches.

use std::num::NonZeroUsize;

use crate::types::{Batch, CountyRecord};

/// Buffers records until a batch is full.
///
/// A batch is handed out by the [`BatchAccumulator::offer`] call that fills it, after which the
/// buffer starts empty again. The final partial batch is obtained with
/// [`BatchAccumulator::flush_remainder`].
#[derive(Debug)]
pub struct BatchAccumulator {
    capacity: NonZeroUsize,
    buffer: Vec<CountyRecord>,
    next_sequence: u64,
}

impl BatchAccumulator {
    /// Creates an accumulator producing batches of `capacity` records.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            capacity,
            buffer: Vec::with_capacity(capacity.get()),
            next_sequence: 1,
        }
    }

    /// Adds a record, returning a batch when the buffer reaches capacity.
    pub fn offer(&mut self, record: CountyRecord) -> Option<Batch> {
        self.buffer.push(record);

        if self.buffer.len() < self.capacity.get() {
            return None;
        }

        Some(self.take_batch())
    }

    /// Returns the buffered records as a final batch, or [`None`] when nothing is buffered.
    pub fn flush_remainder(&mut self) -> Option<Batch> {
        if self.buffer.is_empty() {
            return None;
        }

        Some(self.take_batch())
    }

    /// Returns how many records are waiting in the buffer.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    fn take_batch(&mut self) -> Batch {
        let records = std::mem::replace(
            &mut self.buffer,
            Vec::with_capacity(self.capacity.get()),
        );
        let batch = Batch::new(self.next_sequence, records);
        self.next_sequence += 1;

        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(ids: std::ops::RangeInclusive<i64>) -> Vec<CountyRecord> {
        ids.map(|id| CountyRecord::new(id, format!("{id:03}"), format!("POINT({id} {id})")))
            .collect()
    }

    fn accumulate(capacity: usize, input: Vec<CountyRecord>) -> Vec<Batch> {
        let mut accumulator = BatchAccumulator::new(NonZeroUsize::new(capacity).unwrap());
        let mut batches: Vec<Batch> = input
            .into_iter()
            .filter_map(|record| accumulator.offer(record))
            .collect();
        batches.extend(accumulator.flush_remainder());

        batches
    }

    #[test]
    fn seven_records_make_a_full_and_a_partial_batch() {
        let batches = accumulate(5, records(1..=7));

        let ids: Vec<Vec<i64>> = batches
            .iter()
            .map(|batch| batch.records().iter().map(|record| record.id).collect())
            .collect();
        assert_eq!(ids, vec![vec![1, 2, 3, 4, 5], vec![6, 7]]);
        assert_eq!(batches[0].sequence(), 1);
        assert_eq!(batches[1].sequence(), 2);
    }

    #[test]
    fn no_records_make_no_batches() {
        assert!(accumulate(5, Vec::new()).is_empty());
    }

    #[test]
    fn exact_multiple_has_no_remainder() {
        let batches = accumulate(5, records(1..=10));

        assert_eq!(batches.len(), 2);
        assert!(batches.iter().all(|batch| batch.len() == 5));
    }

    #[test]
    fn batch_count_and_order_hold_for_any_size() {
        for capacity in 1..=6 {
            for count in 0..=13 {
                let input = if count == 0 {
                    Vec::new()
                } else {
                    records(1..=count)
                };
                let batches = accumulate(capacity, input.clone());

                assert_eq!(batches.len(), (count as usize).div_ceil(capacity));
                assert!(batches.iter().all(|batch| batch.len() <= capacity));
                let flattened: Vec<CountyRecord> = batches
                    .iter()
                    .flat_map(|batch| batch.records().iter().cloned())
                    .collect();
                assert_eq!(flattened, input);
            }
        }
    }

    #[test]
    fn full_batch_is_handed_out_immediately() {
        let mut accumulator = BatchAccumulator::new(NonZeroUsize::new(2).unwrap());
        let mut input = records(1..=2).into_iter();

        assert!(accumulator.offer(input.next().unwrap()).is_none());
        assert_eq!(accumulator.buffered(), 1);
        assert!(accumulator.offer(input.next().unwrap()).is_some());
        assert_eq!(accumulator.buffered(), 0);
        assert!(accumulator.flush_remainder().is_none());
    }
}
