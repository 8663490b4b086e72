use serde_json::Value;

use crate::error::BatchError;

use super::record::{Batch, Record};

/// Represents the result of reading a record from the reader.
///
/// - `Ok(Some(record))` when a record was read
/// - `Ok(None)` when the data source is exhausted
/// - `Err(BatchError)` when the source could not be read
pub type RecordReaderResult<P> = Result<Option<Record<P>>, BatchError>;

/// Represents the result of mapping a record to another payload type.
pub type RecordMapperResult<O> = Result<Record<O>, BatchError>;

/// Represents the result of validating a record.
pub type ValidationResult = Result<(), BatchError>;

/// Represents the result of processing a record.
///
/// `Ok(None)` means the processor vetoed the record: the remaining processors are skipped
/// and the record is counted as filtered.
pub type RecordProcessorResult<O> = Result<Option<Record<O>>, BatchError>;

/// Represents the result of writing a batch or of a lifecycle operation.
pub type RecordWriterResult = Result<(), BatchError>;

/// Pulls records, one at a time, from a data source.
///
/// `read_record` fuses the "has next" and "read next" operations: it returns `Ok(None)`
/// once the source has no more records. The job assigns the final record number, so
/// readers may number records however is convenient for them.
pub trait RecordReader<P> {
    /// Opens the data source. Called once before the first read.
    fn open(&mut self) -> Result<(), BatchError> {
        Ok(())
    }

    /// Reads the next record, or `None` when the source is exhausted.
    fn read_record(&mut self) -> RecordReaderResult<P>;

    /// Releases the data source. Called on every exit path of a job.
    fn close(&mut self) -> Result<(), BatchError> {
        Ok(())
    }

    /// Number of records the source will yield, when it is known upfront.
    fn total_records(&self) -> Option<u64> {
        None
    }

    /// Human readable name of the data source, copied into record headers and reports.
    fn source_name(&self) -> String {
        "unknown".to_string()
    }
}

/// Outcome of a [`RecordFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    /// The record continues down the pipeline.
    Keep,
    /// The record is skipped and counted as filtered.
    Reject,
    /// The record is the end-of-stream sentinel: the job stops gracefully.
    Poison,
}

impl From<bool> for FilterDecision {
    fn from(keep: bool) -> Self {
        if keep {
            FilterDecision::Keep
        } else {
            FilterDecision::Reject
        }
    }
}

/// Decides whether a record read from the source enters the pipeline.
pub trait RecordFilter<P> {
    fn filter(&self, record: &Record<P>) -> FilterDecision;
}

impl<P, F> RecordFilter<P> for F
where
    F: Fn(&Record<P>) -> FilterDecision,
{
    fn filter(&self, record: &Record<P>) -> FilterDecision {
        self(record)
    }
}

/// Transforms the payload of a record from the input type to the output type.
pub trait RecordMapper<I, O> {
    fn map(&self, record: &Record<I>) -> RecordMapperResult<O>;
}

impl<I, O, F> RecordMapper<I, O> for F
where
    F: Fn(&Record<I>) -> RecordMapperResult<O>,
{
    fn map(&self, record: &Record<I>) -> RecordMapperResult<O> {
        self(record)
    }
}

/// Mapper used when input and output payload types are the same.
#[derive(Default, Debug, Clone, Copy)]
pub struct IdentityMapper {}

impl<P: Clone> RecordMapper<P, P> for IdentityMapper {
    fn map(&self, record: &Record<P>) -> RecordMapperResult<P> {
        Ok(record.clone())
    }
}

/// Checks a mapped record. Failures are reported as [`BatchError::Validation`].
pub trait RecordValidator<P> {
    fn validate(&self, record: &Record<P>) -> ValidationResult;
}

impl<P, F> RecordValidator<P> for F
where
    F: Fn(&Record<P>) -> ValidationResult,
{
    fn validate(&self, record: &Record<P>) -> ValidationResult {
        self(record)
    }
}

/// Business logic applied to a valid record.
///
/// Processors are chained in registration order, the output of one feeding the next. A
/// processor may change the payload type, for example to marshal records before writing
/// them. Errors are recoverable or fatal as declared by [`BatchError::is_fatal`].
pub trait RecordProcessor<I, O = I> {
    fn process(&mut self, record: Record<I>) -> RecordProcessorResult<O>;

    /// Value computed over the whole run, collected into the job report at teardown.
    fn result(&self) -> Option<Value> {
        None
    }
}

impl<I, O, F> RecordProcessor<I, O> for F
where
    F: FnMut(Record<I>) -> RecordProcessorResult<O>,
{
    fn process(&mut self, record: Record<I>) -> RecordProcessorResult<O> {
        self(record)
    }
}

/// Writes batches of records to a data sink.
pub trait RecordWriter<P> {
    fn open(&mut self) -> RecordWriterResult {
        Ok(())
    }

    fn write_batch(&mut self, batch: &Batch<P>) -> RecordWriterResult;

    fn close(&mut self) -> RecordWriterResult {
        Ok(())
    }
}
