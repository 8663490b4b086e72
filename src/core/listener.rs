//! Observers notified at well defined points of a job run.
//!
//! There are four listener categories: job, pipeline (per record), reader and writer.
//! Listeners of a category are called in registration order through a composite dispatcher,
//! synchronously, on the thread running the job.
//!
//! A listener returning an error never changes the outcome of a job: the composite logs the
//! error and moves on to the next listener. This policy is the same for every category.

use log::warn;

use crate::error::BatchError;

use super::{
    parameters::JobParameters,
    record::{Batch, Record},
    report::JobReport,
};

/// Result returned by every listener callback.
pub type ListenerResult = Result<(), BatchError>;

pub trait JobListener {
    fn before_job_start(&mut self, _parameters: &JobParameters) -> ListenerResult {
        Ok(())
    }

    fn after_job_end(&mut self, _report: &JobReport) -> ListenerResult {
        Ok(())
    }
}

/// Per record callbacks, `I` being the payload read and `O` the payload written.
pub trait PipelineListener<I, O> {
    fn before_record_processing(&mut self, _record: &Record<I>) -> ListenerResult {
        Ok(())
    }

    /// `output` is `None` when the record was filtered out.
    fn after_record_processing(
        &mut self,
        _input: &Record<I>,
        _output: Option<&Record<O>>,
    ) -> ListenerResult {
        Ok(())
    }

    fn on_record_processing_exception(
        &mut self,
        _record: &Record<I>,
        _error: &BatchError,
    ) -> ListenerResult {
        Ok(())
    }
}

pub trait RecordReaderListener<P> {
    fn before_reader_open(&mut self) -> ListenerResult {
        Ok(())
    }

    fn after_reader_open(&mut self) -> ListenerResult {
        Ok(())
    }

    fn before_record_reading(&mut self) -> ListenerResult {
        Ok(())
    }

    /// `record` is `None` once the reader is exhausted.
    fn after_record_reading(&mut self, _record: Option<&Record<P>>) -> ListenerResult {
        Ok(())
    }

    fn on_record_reading_exception(&mut self, _error: &BatchError) -> ListenerResult {
        Ok(())
    }
}

pub trait RecordWriterListener<P> {
    fn before_batch_writing(&mut self, _batch: &Batch<P>) -> ListenerResult {
        Ok(())
    }

    fn after_batch_writing(&mut self, _batch: &Batch<P>) -> ListenerResult {
        Ok(())
    }

    fn on_batch_writing_exception(
        &mut self,
        _batch: &Batch<P>,
        _error: &BatchError,
    ) -> ListenerResult {
        Ok(())
    }
}

fn log_failure(category: &str, callback: &str, result: ListenerResult) {
    if let Err(error) = result {
        warn!("{} listener failed in {}: {}", category, callback, error);
    }
}

/// Fan-out dispatcher over the registered [`JobListener`]s.
#[derive(Default)]
pub struct CompositeJobListener {
    listeners: Vec<Box<dyn JobListener + Send>>,
}

impl CompositeJobListener {
    pub fn add(&mut self, listener: Box<dyn JobListener + Send>) {
        self.listeners.push(listener);
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn before_job_start(&mut self, parameters: &JobParameters) {
        for listener in self.listeners.iter_mut() {
            log_failure("Job", "before_job_start", listener.before_job_start(parameters));
        }
    }

    pub fn after_job_end(&mut self, report: &JobReport) {
        for listener in self.listeners.iter_mut() {
            log_failure("Job", "after_job_end", listener.after_job_end(report));
        }
    }
}

/// Fan-out dispatcher over the registered [`PipelineListener`]s.
pub struct CompositePipelineListener<I, O> {
    listeners: Vec<Box<dyn PipelineListener<I, O> + Send>>,
}

impl<I, O> Default for CompositePipelineListener<I, O> {
    fn default() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }
}

impl<I, O> CompositePipelineListener<I, O> {
    pub fn add(&mut self, listener: Box<dyn PipelineListener<I, O> + Send>) {
        self.listeners.push(listener);
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn before_record_processing(&mut self, record: &Record<I>) {
        for listener in self.listeners.iter_mut() {
            log_failure(
                "Pipeline",
                "before_record_processing",
                listener.before_record_processing(record),
            );
        }
    }

    pub fn after_record_processing(&mut self, input: &Record<I>, output: Option<&Record<O>>) {
        for listener in self.listeners.iter_mut() {
            log_failure(
                "Pipeline",
                "after_record_processing",
                listener.after_record_processing(input, output),
            );
        }
    }

    pub fn on_record_processing_exception(&mut self, record: &Record<I>, error: &BatchError) {
        for listener in self.listeners.iter_mut() {
            log_failure(
                "Pipeline",
                "on_record_processing_exception",
                listener.on_record_processing_exception(record, error),
            );
        }
    }
}

/// Fan-out dispatcher over the registered [`RecordReaderListener`]s.
pub struct CompositeRecordReaderListener<P> {
    listeners: Vec<Box<dyn RecordReaderListener<P> + Send>>,
}

impl<P> Default for CompositeRecordReaderListener<P> {
    fn default() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }
}

impl<P> CompositeRecordReaderListener<P> {
    pub fn add(&mut self, listener: Box<dyn RecordReaderListener<P> + Send>) {
        self.listeners.push(listener);
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn before_reader_open(&mut self) {
        for listener in self.listeners.iter_mut() {
            log_failure("Reader", "before_reader_open", listener.before_reader_open());
        }
    }

    pub fn after_reader_open(&mut self) {
        for listener in self.listeners.iter_mut() {
            log_failure("Reader", "after_reader_open", listener.after_reader_open());
        }
    }

    pub fn before_record_reading(&mut self) {
        for listener in self.listeners.iter_mut() {
            log_failure(
                "Reader",
                "before_record_reading",
                listener.before_record_reading(),
            );
        }
    }

    pub fn after_record_reading(&mut self, record: Option<&Record<P>>) {
        for listener in self.listeners.iter_mut() {
            log_failure(
                "Reader",
                "after_record_reading",
                listener.after_record_reading(record),
            );
        }
    }

    pub fn on_record_reading_exception(&mut self, error: &BatchError) {
        for listener in self.listeners.iter_mut() {
            log_failure(
                "Reader",
                "on_record_reading_exception",
                listener.on_record_reading_exception(error),
            );
        }
    }
}

/// Fan-out dispatcher over the registered [`RecordWriterListener`]s.
pub struct CompositeRecordWriterListener<P> {
    listeners: Vec<Box<dyn RecordWriterListener<P> + Send>>,
}

impl<P> Default for CompositeRecordWriterListener<P> {
    fn default() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }
}

impl<P> CompositeRecordWriterListener<P> {
    pub fn add(&mut self, listener: Box<dyn RecordWriterListener<P> + Send>) {
        self.listeners.push(listener);
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn before_batch_writing(&mut self, batch: &Batch<P>) {
        for listener in self.listeners.iter_mut() {
            log_failure(
                "Writer",
                "before_batch_writing",
                listener.before_batch_writing(batch),
            );
        }
    }

    pub fn after_batch_writing(&mut self, batch: &Batch<P>) {
        for listener in self.listeners.iter_mut() {
            log_failure(
                "Writer",
                "after_batch_writing",
                listener.after_batch_writing(batch),
            );
        }
    }

    pub fn on_batch_writing_exception(&mut self, batch: &Batch<P>, error: &BatchError) {
        for listener in self.listeners.iter_mut() {
            log_failure(
                "Writer",
                "on_batch_writing_exception",
                listener.on_batch_writing_exception(batch, error),
            );
        }
    }
}
