use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;

use crate::core::{
    item::{RecordWriter, RecordWriterResult},
    record::{Batch, Record},
};

/// A record writer collecting batches in memory.
///
/// Clones share the same storage, so a clone can be handed to a job and the original kept to
/// inspect what was written once the job is done.
///
/// # Examples
///
/// ```
/// use easy_batch_rs::core::{
///     item::RecordWriter,
///     record::{Batch, Header, Record},
/// };
/// use easy_batch_rs::item::vec::VecRecordWriter;
///
/// let writer = VecRecordWriter::new();
/// let mut handle = writer.clone();
///
/// let mut batch = Batch::with_capacity(2);
/// batch.push(Record::new(Header::new(1, "test"), "a")).unwrap();
/// batch.push(Record::new(Header::new(2, "test"), "b")).unwrap();
/// handle.write_batch(&batch).unwrap();
///
/// assert_eq!(writer.batch_sizes(), vec![2]);
/// assert_eq!(writer.payloads(), vec!["a", "b"]);
/// ```
#[derive(Debug)]
pub struct VecRecordWriter<P> {
    batches: Arc<Mutex<Vec<Batch<P>>>>,
}

impl<P> Clone for VecRecordWriter<P> {
    fn clone(&self) -> Self {
        Self {
            batches: Arc::clone(&self.batches),
        }
    }
}

impl<P> Default for VecRecordWriter<P> {
    fn default() -> Self {
        Self {
            batches: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<P> VecRecordWriter<P> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Batch<P>>> {
        self.batches.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Size of each written batch, in writing order.
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.lock().iter().map(Batch::len).collect()
    }

    /// Total number of records written.
    pub fn len(&self) -> usize {
        self.lock().iter().map(Batch::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<P: Clone> VecRecordWriter<P> {
    pub fn batches(&self) -> Vec<Batch<P>> {
        self.lock().clone()
    }

    /// All written records, flattened in writing order.
    pub fn records(&self) -> Vec<Record<P>> {
        self.lock()
            .iter()
            .flat_map(|batch| batch.iter().cloned())
            .collect()
    }

    pub fn payloads(&self) -> Vec<P> {
        self.lock()
            .iter()
            .flat_map(|batch| batch.payloads().cloned())
            .collect()
    }
}

impl<P: Clone> RecordWriter<P> for VecRecordWriter<P> {
    fn write_batch(&mut self, batch: &Batch<P>) -> RecordWriterResult {
        debug!("Storing batch of {} record(s)", batch.len());
        self.lock().push(batch.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::core::{
        item::RecordWriter,
        record::{Batch, Header, Record},
    };

    use super::VecRecordWriter;

    fn batch(numbers: &[u64]) -> Batch<u64> {
        let mut batch = Batch::with_capacity(numbers.len());
        for number in numbers {
            batch
                .push(Record::new(Header::new(*number, "test"), number * 10))
                .unwrap();
        }
        batch
    }

    #[test]
    fn clones_share_written_batches() {
        let writer = VecRecordWriter::new();
        let mut first = writer.clone();
        let mut second = writer.clone();

        first.write_batch(&batch(&[1, 2])).unwrap();
        second.write_batch(&batch(&[3])).unwrap();

        assert_eq!(writer.batch_sizes(), vec![2, 1]);
        assert_eq!(writer.len(), 3);
        assert_eq!(writer.payloads(), vec![10, 20, 30]);
        let numbers: Vec<u64> = writer
            .records()
            .iter()
            .map(|record| record.header().number())
            .collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn new_writer_is_empty() {
        let writer = VecRecordWriter::<String>::new();
        assert!(writer.is_empty());
        assert!(writer.batches().is_empty());
    }
}
