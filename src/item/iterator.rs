use crate::core::{
    item::{RecordReader, RecordReaderResult},
    record::{Header, Record},
};

/// A record reader over any iterator.
///
/// Each item becomes the payload of a record numbered from 1, with the reader's source name
/// in its header. When the iterator reports an exact size, the reader announces it as the
/// total number of records so monitors can show a percentage.
///
/// # Examples
///
/// ```
/// use easy_batch_rs::core::item::RecordReader;
/// use easy_batch_rs::item::iterator::IteratorRecordReader;
///
/// let mut reader = IteratorRecordReader::new("words", vec!["foo", "bar"]);
///
/// assert_eq!(reader.total_records(), Some(2));
///
/// let first = reader.read_record().unwrap().unwrap();
/// assert_eq!(first.header().number(), 1);
/// assert_eq!(first.header().source(), "words");
/// assert_eq!(*first.payload(), "foo");
///
/// assert!(reader.read_record().unwrap().is_some());
/// assert!(reader.read_record().unwrap().is_none());
/// ```
pub struct IteratorRecordReader<T: Iterator> {
    source_name: String,
    iterator: T,
    current: u64,
    total: Option<u64>,
}

impl<T: Iterator> IteratorRecordReader<T> {
    pub fn new(source_name: impl Into<String>, iterable: impl IntoIterator<IntoIter = T>) -> Self {
        let iterator = iterable.into_iter();
        let total = match iterator.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(lower as u64),
            _ => None,
        };

        Self {
            source_name: source_name.into(),
            iterator,
            current: 0,
            total,
        }
    }

    /// Overrides the announced total number of records.
    pub fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }
}

impl<T: Iterator> RecordReader<T::Item> for IteratorRecordReader<T> {
    fn read_record(&mut self) -> RecordReaderResult<T::Item> {
        let Some(payload) = self.iterator.next() else {
            return Ok(None);
        };
        self.current += 1;
        Ok(Some(Record::new(
            Header::new(self.current, self.source_name.as_str()),
            payload,
        )))
    }

    fn total_records(&self) -> Option<u64> {
        self.total
    }

    fn source_name(&self) -> String {
        self.source_name.clone()
    }
}

#[cfg(test)]
mod tests {
    use crate::core::item::RecordReader;

    use super::IteratorRecordReader;

    #[test]
    fn unbounded_iterators_have_no_total() {
        let reader = IteratorRecordReader::new("evens", (0..).filter(|n| n % 2 == 0));
        assert_eq!(reader.total_records(), None);
        assert_eq!(reader.with_total(50).total_records(), Some(50));
    }

    #[test]
    fn records_are_numbered_in_reading_order() {
        let mut reader = IteratorRecordReader::new("letters", "abc".chars());

        let mut numbers = Vec::new();
        while let Some(record) = reader.read_record().unwrap() {
            numbers.push((record.header().number(), *record.payload()));
        }

        assert_eq!(numbers, vec![(1, 'a'), (2, 'b'), (3, 'c')]);
        assert_eq!(reader.source_name(), "letters");
    }
}
