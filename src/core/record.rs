use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata attached to every record flowing through a job.
///
/// A header is created by the reader when the record is pulled from the data source.
/// The job confirms the record number: the n-th record read in a run always carries number `n`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    number: u64,
    source: String,
    creation_date: DateTime<Utc>,
    poison: bool,
}

impl Header {
    /// Creates a header stamped with the current time.
    pub fn new(number: u64, source: impl Into<String>) -> Self {
        Self {
            number,
            source: source.into(),
            creation_date: Utc::now(),
            poison: false,
        }
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn creation_date(&self) -> DateTime<Utc> {
        self.creation_date
    }

    /// A poison header marks the end of a stream that cannot be closed by its producer.
    pub fn is_poison(&self) -> bool {
        self.poison
    }

    pub(crate) fn with_number(mut self, number: u64) -> Self {
        self.number = number;
        self
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "number={}, source=\"{}\", creationDate=\"{}\"",
            self.number,
            self.source,
            self.creation_date.to_rfc3339()
        )
    }
}

/// A unit of data paired with its [`Header`].
///
/// Records are immutable; stages produce new records rather than mutating their input.
/// The payload type changes as the record crosses the mapping stage (`Record<I>` to `Record<O>`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<P> {
    header: Header,
    payload: P,
}

impl<P> Record<P> {
    pub fn new(header: Header, payload: P) -> Self {
        Self { header, payload }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn into_payload(self) -> P {
        self.payload
    }

    pub fn into_parts(self) -> (Header, P) {
        (self.header, self.payload)
    }

    /// Returns `true` when this record signals a graceful end of stream.
    pub fn is_poison(&self) -> bool {
        self.header.poison
    }

    /// Marks this record as the poison sentinel of its stream.
    pub fn into_poison(mut self) -> Self {
        self.header.poison = true;
        self
    }

    /// Builds a record with the same header and a new payload.
    pub fn with_payload<T>(&self, payload: T) -> Record<T> {
        Record {
            header: self.header.clone(),
            payload,
        }
    }

    /// Builds a record with the same header and a payload derived from this one.
    pub fn map_payload<T, F>(self, f: F) -> Record<T>
    where
        F: FnOnce(P) -> T,
    {
        Record {
            header: self.header,
            payload: f(self.payload),
        }
    }

    pub(crate) fn renumber(self, number: u64) -> Self {
        Record {
            header: self.header.with_number(number),
            payload: self.payload,
        }
    }
}

impl<P: fmt::Debug> fmt::Display for Record<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Record: {{header=[{}], payload=[{:?}]}}", self.header, self.payload)
    }
}

/// An ordered group of records written together.
///
/// A batch never holds more records than its capacity. The last batch of a run may hold fewer.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch<P> {
    records: Vec<Record<P>>,
    capacity: usize,
}

impl<P> Batch<P> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a record. Returns the record back when the batch is already full.
    pub fn push(&mut self, record: Record<P>) -> Result<(), Record<P>> {
        if self.is_full() {
            return Err(record);
        }
        self.records.push(record);
        Ok(())
    }

    pub fn is_full(&self) -> bool {
        self.records.len() >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn records(&self) -> &[Record<P>] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record<P>> {
        self.records.iter()
    }

    /// Iterates over the payloads, in record order.
    pub fn payloads(&self) -> impl Iterator<Item = &P> {
        self.records.iter().map(Record::payload)
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl<'a, P> IntoIterator for &'a Batch<P> {
    type Item = &'a Record<P>;
    type IntoIter = std::slice::Iter<'a, Record<P>>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
