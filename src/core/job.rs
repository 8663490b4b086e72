use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::BatchError;

use super::{
    chain::{NoProcessor, ProcessorChain, RecordChain, StageError, Stages, Then},
    item::{
        FilterDecision, IdentityMapper, RecordFilter, RecordMapper, RecordProcessor, RecordReader,
        RecordValidator, RecordWriter,
    },
    listener::{
        CompositeJobListener, CompositePipelineListener, CompositeRecordReaderListener,
        CompositeRecordWriterListener, JobListener, PipelineListener, RecordReaderListener,
        RecordWriterListener,
    },
    metrics::{CustomMetrics, JobMetrics},
    monitor::{JobMonitor, JobProgress},
    parameters::JobParameters,
    record::{Batch, Record},
    report::{JobReport, JobStatus},
};

/// Represents a job that can be executed.
///
/// A job is one execution of a pipeline, from opening its reader and writer to a terminal
/// status. Calling a job always produces a [`JobReport`]: collaborator failures end up in the
/// report, they are never returned as errors or panics.
///
/// # Example Usage
///
/// ```
/// use easy_batch_rs::core::{
///     job::{Job, JobBuilder},
///     report::JobStatus,
/// };
/// use easy_batch_rs::item::{iterator::IteratorRecordReader, vec::VecRecordWriter};
///
/// let writer = VecRecordWriter::new();
///
/// let mut job = JobBuilder::new()
///     .name("numbers")
///     .reader(IteratorRecordReader::new("numbers", 1..=5))
///     .writer(writer.clone())
///     .batch_size(3)
///     .build()
///     .unwrap();
///
/// let report = job.call();
///
/// assert_eq!(report.status(), JobStatus::Completed);
/// assert_eq!(report.metrics().read_count(), 5);
/// assert_eq!(writer.batch_sizes(), vec![3, 2]);
/// ```
pub trait Job {
    fn name(&self) -> &str;

    /// Runs the job to completion and returns its report.
    fn call(&mut self) -> JobReport;
}

/// How the main loop ended when no fatal error occurred.
#[derive(Debug, Clone, Copy, PartialEq)]
enum LoopEnd {
    /// The reader is exhausted
    Exhausted,
    /// A poison record signaled the end of the stream
    Poisoned,
    /// Cancellation was requested
    Aborted,
}

/// Error that stops the main loop.
enum Halt {
    /// The pending batch is flushed before the job fails
    Failed(BatchError),
    /// Writing a batch failed: nothing more is written
    WriteFailed(BatchError),
}

/// What happened to a single record once it was read.
enum RecordOutcome<O> {
    /// The record went through every stage and waits to be written
    Processed(Record<O>),
    /// The record was filtered out or skipped after a recoverable error
    Skipped,
}

/// The pipeline executor.
///
/// Records are pulled one at a time and pushed through
/// filters -> mapper -> validators -> processors before being added to the current batch.
/// Full batches are written right away, the last partial batch at the end of the run, even
/// when the run fails on a read or processing error.
pub struct JobInstance<I, O> {
    /// Unique identifier for this job instance
    id: Uuid,
    parameters: JobParameters,
    reader: Box<dyn RecordReader<I> + Send>,
    filters: Vec<Box<dyn RecordFilter<I> + Send>>,
    chain: Box<dyn RecordChain<I, O> + Send>,
    writer: Box<dyn RecordWriter<O> + Send>,
    job_listener: CompositeJobListener,
    pipeline_listener: CompositePipelineListener<I, O>,
    reader_listener: CompositeRecordReaderListener<I>,
    writer_listener: CompositeRecordWriterListener<O>,
    status: JobStatus,
    metrics: JobMetrics,
    custom_metrics: CustomMetrics,
    monitor: JobMonitor,
    cancellation: CancellationToken,
    report: Option<JobReport>,
}

impl<I, O> Job for JobInstance<I, O> {
    fn name(&self) -> &str {
        &self.parameters.name
    }

    fn call(&mut self) -> JobReport {
        if let Some(report) = &self.report {
            warn!(
                "Job '{}' has already been executed, returning its report",
                self.parameters.name
            );
            return report.clone();
        }

        let start_time = Utc::now();
        let data_source = self.reader.source_name();
        let total_records = self.reader.total_records();

        info!("Start of job: {}, id: {}", self.parameters.name, self.id);
        debug!("Batch size: {}", self.parameters.batch_size);
        debug!("Strict mode: {}", self.parameters.strict_mode);

        self.monitor.publish(|progress| {
            progress.start_time = Some(start_time);
            progress.total_records = total_records;
        });
        self.job_listener.before_job_start(&self.parameters);

        let outcome = self.open().and_then(|()| {
            self.set_status(JobStatus::Started);
            self.run_loop()
        });

        if !self.status.is_terminal() && self.status != JobStatus::Starting {
            self.set_status(JobStatus::Stopping);
        }

        let writer_close_error = self.close_writer();
        let reader_close_error = self.close_reader();

        let (status, loop_error) = match outcome {
            Ok(LoopEnd::Aborted) => (JobStatus::Aborted, None),
            Ok(LoopEnd::Exhausted | LoopEnd::Poisoned) => (JobStatus::Completed, None),
            Err(error) => (JobStatus::Failed, Some(error)),
        };
        let last_error = loop_error.or(writer_close_error).or(reader_close_error);

        self.teardown(status, start_time, data_source, last_error)
    }
}

impl<I, O> JobInstance<I, O> {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn parameters(&self) -> &JobParameters {
        &self.parameters
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Monitoring surface of this job. Subscribe before submitting the job to follow it live.
    pub fn monitor(&self) -> &JobMonitor {
        &self.monitor
    }

    /// Handle to publish custom metrics from collaborators.
    pub fn custom_metrics(&self) -> CustomMetrics {
        self.custom_metrics.clone()
    }

    /// Token used to request the job to stop.
    ///
    /// The job checks the token between records: the record being processed completes, the
    /// current partial batch is discarded and the job ends with status `Aborted`.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    pub fn stop(&self) {
        info!("Stop requested for job '{}'", self.parameters.name);
        self.cancellation.cancel();
    }

    fn set_status(&mut self, status: JobStatus) {
        if !self.status.can_transition_to(status) {
            debug!(
                "Job '{}' ignores transition from {} to {}",
                self.parameters.name, self.status, status
            );
            return;
        }
        info!(
            "Job '{}' {}",
            self.parameters.name,
            status.to_string().to_lowercase()
        );
        self.status = status;
        self.monitor.publish(|progress| progress.status = status);
    }

    fn open(&mut self) -> Result<(), BatchError> {
        debug!("Opening record reader");
        self.reader_listener.before_reader_open();
        if let Err(error) = self.reader.open() {
            error!("Unable to open record reader: {}", error);
            self.reader_listener.on_record_reading_exception(&error);
            return Err(error);
        }
        self.reader_listener.after_reader_open();

        debug!("Opening record writer");
        self.writer.open().inspect_err(|error| {
            error!("Unable to open record writer: {}", error);
        })
    }

    fn close_writer(&mut self) -> Option<BatchError> {
        debug!("Closing record writer");
        self.writer
            .close()
            .inspect_err(|error| error!("Unable to close record writer: {}", error))
            .err()
    }

    fn close_reader(&mut self) -> Option<BatchError> {
        debug!("Closing record reader");
        self.reader
            .close()
            .inspect_err(|error| error!("Unable to close record reader: {}", error))
            .err()
    }

    fn run_loop(&mut self) -> Result<LoopEnd, BatchError> {
        let mut batch = Batch::with_capacity(self.parameters.batch_size);

        let end = loop {
            if self.cancellation.is_cancelled() {
                info!(
                    "Job '{}' has been interrupted, discarding {} pending record(s)",
                    self.parameters.name,
                    batch.len()
                );
                return Ok(LoopEnd::Aborted);
            }

            match self.step(&mut batch) {
                Ok(None) => self.publish_progress(),
                Ok(Some(end)) => break Ok(end),
                Err(Halt::Failed(error)) => break Err(error),
                Err(Halt::WriteFailed(error)) => return Err(error),
            }
        };

        if batch.is_empty() {
            return end;
        }
        let flushed = self.write_batch(&batch);
        batch.clear();
        self.publish_progress();

        // the error that stopped the loop wins over a failing flush
        end.and_then(|end| flushed.map(|()| end))
    }

    /// Reads one record and pushes it through the pipeline.
    ///
    /// Returns how the loop ends when the record ends it.
    fn step(&mut self, batch: &mut Batch<O>) -> Result<Option<LoopEnd>, Halt> {
        let record = match self.read_record().map_err(Halt::Failed)? {
            Some(record) => record,
            None => {
                debug!("No more records");
                return Ok(Some(LoopEnd::Exhausted));
            }
        };

        if record.is_poison() {
            info!("Poison record received, ending job '{}'", self.parameters.name);
            return Ok(Some(LoopEnd::Poisoned));
        }

        match self.filter_record(&record) {
            FilterDecision::Poison => {
                info!("Poison record detected, ending job '{}'", self.parameters.name);
                return Ok(Some(LoopEnd::Poisoned));
            }
            FilterDecision::Reject => {
                self.metrics.increment_read_count();
                self.pipeline_listener.before_record_processing(&record);
                debug!("Record {} has been filtered", record.header().number());
                self.metrics.increment_filtered_count();
                self.pipeline_listener.after_record_processing(&record, None);
            }
            FilterDecision::Keep => {
                self.metrics.increment_read_count();
                self.pipeline_listener.before_record_processing(&record);
                let outcome = self.process_record(&record).map_err(Halt::Failed)?;
                if let RecordOutcome::Processed(output) = outcome {
                    batch.push(output).map_err(|rejected| {
                        Halt::Failed(BatchError::JobExecutor(format!(
                            "batch is full, record {} rejected",
                            rejected.header().number()
                        )))
                    })?;
                    if batch.is_full() {
                        self.write_batch(batch).map_err(Halt::WriteFailed)?;
                        batch.clear();
                    }
                }
            }
        }

        Ok(None)
    }

    fn read_record(&mut self) -> Result<Option<Record<I>>, BatchError> {
        debug!("Reading next record");
        self.reader_listener.before_record_reading();

        match self.reader.read_record() {
            Ok(record) => {
                let expected = self.metrics.read_count() + 1;
                let record = record.map(|record| {
                    if record.header().number() == expected {
                        record
                    } else {
                        debug!(
                            "Renumbering record {} as {}",
                            record.header().number(),
                            expected
                        );
                        record.renumber(expected)
                    }
                });
                self.reader_listener.after_record_reading(record.as_ref());
                Ok(record)
            }
            Err(error) => {
                error!("Unable to read next record: {}", error);
                self.reader_listener.on_record_reading_exception(&error);
                Err(error)
            }
        }
    }

    fn filter_record(&self, record: &Record<I>) -> FilterDecision {
        self.filters
            .iter()
            .map(|filter| filter.filter(record))
            .find(|decision| *decision != FilterDecision::Keep)
            .unwrap_or(FilterDecision::Keep)
    }

    /// Maps, validates and processes a record that passed the filters.
    ///
    /// Returns an error only when the job must stop.
    fn process_record(&mut self, record: &Record<I>) -> Result<RecordOutcome<O>, BatchError> {
        let number = record.header().number();

        match self.chain.run(record) {
            Ok(Some(processed)) => {
                self.pipeline_listener
                    .after_record_processing(record, Some(&processed));
                Ok(RecordOutcome::Processed(processed))
            }
            Ok(None) => {
                debug!("Record {} has been filtered", number);
                self.metrics.increment_filtered_count();
                self.pipeline_listener.after_record_processing(record, None);
                Ok(RecordOutcome::Skipped)
            }
            Err(StageError::Mapping(error)) => {
                self.on_record_error(record, &error)?;
                warn!("Unable to map record {}: {}", number, error);
                self.metrics.increment_mapping_error_count();
                Ok(RecordOutcome::Skipped)
            }
            Err(StageError::Validation(error)) => {
                self.on_record_error(record, &error)?;
                warn!("Record {} is not valid: {}", number, error);
                self.metrics.increment_validation_error_count();
                Ok(RecordOutcome::Skipped)
            }
            Err(StageError::Processing(error)) if error.is_fatal() => {
                error!("Fatal error while processing record {}: {}", number, error);
                self.pipeline_listener
                    .on_record_processing_exception(record, &error);
                Err(error)
            }
            Err(StageError::Processing(error)) => {
                self.on_record_error(record, &error)?;
                warn!("Unable to process record {}: {}", number, error);
                self.metrics.increment_processing_error_count();
                Ok(RecordOutcome::Skipped)
            }
        }
    }

    /// Notifies listeners of a record level error and decides whether it stops the job.
    fn on_record_error(&mut self, record: &Record<I>, error: &BatchError) -> Result<(), BatchError> {
        self.pipeline_listener
            .on_record_processing_exception(record, error);
        if self.parameters.strict_mode {
            error!(
                "Strict mode enabled, aborting on record {}: {}",
                record.header().number(),
                error
            );
            return Err(error.clone());
        }
        Ok(())
    }

    fn write_batch(&mut self, batch: &Batch<O>) -> Result<(), BatchError> {
        debug!("Writing batch of {} record(s)", batch.len());
        self.writer_listener.before_batch_writing(batch);

        match self.writer.write_batch(batch) {
            Ok(()) => {
                self.metrics.increment_write_count(batch.len());
                self.writer_listener.after_batch_writing(batch);
                Ok(())
            }
            Err(error) => {
                error!("Unable to write records: {}", error);
                self.writer_listener.on_batch_writing_exception(batch, &error);
                Err(error)
            }
        }
    }

    fn publish_progress(&mut self) {
        let mut metrics = self.metrics.clone();
        metrics.set_custom_metrics(self.custom_metrics.snapshot());
        self.monitor.publish(|progress| progress.metrics = metrics);
    }

    fn teardown(
        &mut self,
        status: JobStatus,
        start_time: DateTime<Utc>,
        data_source: String,
        last_error: Option<BatchError>,
    ) -> JobReport {
        let end_time = Utc::now();
        self.metrics
            .set_custom_metrics(self.custom_metrics.snapshot());
        let results = self.chain.results();

        self.set_status(status);

        let report = JobReport::new(
            self.id,
            self.parameters.clone(),
            self.status,
            self.metrics.clone(),
            start_time,
            end_time,
            results,
            last_error,
            data_source,
        );

        let metrics = self.metrics.clone();
        let error = report.last_error().map(ToString::to_string);
        self.monitor.freeze(|progress| {
            progress.metrics = metrics;
            progress.end_time = Some(end_time);
            progress.last_error = error;
        });

        info!(
            "End of job: {}, id: {}, status: {}, duration: {}ms",
            self.parameters.name,
            self.id,
            report.status(),
            report.duration().num_milliseconds()
        );
        if !self.parameters.silent_mode {
            info!("{}", report);
        }

        self.job_listener.after_job_end(&report);
        self.report = Some(report.clone());
        report
    }
}

/// Builder for creating a job instance.
///
/// Stages are stored in registration order. When the payload type does not change, the
/// mapper is optional and records go through unchanged; use [`JobBuilder::with_mapper`] to
/// build a pipeline whose output payload type differs from its input.
///
/// `O` is the payload type handed to the writer and `M` the one produced by the mapper and
/// checked by the validators. They differ once [`JobBuilder::marshaller`] appends a
/// processor changing the payload type. The writer and the listeners typed on `O` must be
/// registered after the last marshaller.
///
/// # Example
///
/// ```
/// use easy_batch_rs::core::{
///     item::FilterDecision,
///     job::{Job, JobBuilder},
///     record::Record,
///     report::JobStatus,
/// };
/// use easy_batch_rs::item::{iterator::IteratorRecordReader, vec::VecRecordWriter};
/// use easy_batch_rs::BatchError;
///
/// let writer = VecRecordWriter::new();
///
/// let lines = vec!["42", "# comment", "x", "17"];
///
/// let mut job = JobBuilder::with_mapper(|record: &Record<String>| {
///         record
///             .payload()
///             .trim()
///             .parse::<u32>()
///             .map(|age| record.with_payload(age))
///             .map_err(|error| BatchError::RecordMapper(error.to_string()))
///     })
///     .name("ages")
///     .reader(IteratorRecordReader::new("ages", lines.into_iter().map(String::from)))
///     .filter(|record: &Record<String>| FilterDecision::from(!record.payload().starts_with('#')))
///     .writer(writer.clone())
///     .build()
///     .unwrap();
///
/// let report = job.call();
///
/// assert_eq!(report.status(), JobStatus::Completed);
/// assert_eq!(report.metrics().filtered_count(), 1);
/// assert_eq!(report.metrics().mapping_error_count(), 1);
/// assert_eq!(writer.payloads(), vec![42, 17]);
/// ```
pub struct JobBuilder<I, O, M = O> {
    /// Optional name for the job (generated randomly if not specified)
    name: Option<String>,
    parameters: JobParameters,
    reader: Option<Box<dyn RecordReader<I> + Send>>,
    filters: Vec<Box<dyn RecordFilter<I> + Send>>,
    mapper: Box<dyn RecordMapper<I, M> + Send>,
    validators: Vec<Box<dyn RecordValidator<M> + Send>>,
    processors: Box<dyn ProcessorChain<M, O> + Send>,
    writer: Option<Box<dyn RecordWriter<O> + Send>>,
    job_listener: CompositeJobListener,
    pipeline_listener: CompositePipelineListener<I, O>,
    reader_listener: CompositeRecordReaderListener<I>,
    writer_listener: CompositeRecordWriterListener<O>,
    custom_metrics: CustomMetrics,
    /// Collaborators typed on a payload that a marshaller replaced
    misplaced: Vec<&'static str>,
}

impl<P: Clone + 'static> JobBuilder<P, P> {
    /// Creates a builder for a pipeline that keeps the payload type.
    pub fn new() -> Self {
        Self::with_mapper(IdentityMapper::default())
    }
}

impl<P: Clone + 'static> Default for JobBuilder<P, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: 'static, O: 'static> JobBuilder<I, O> {
    /// Creates a builder for a pipeline mapping `I` payloads to `O` payloads.
    pub fn with_mapper(mapper: impl RecordMapper<I, O> + Send + 'static) -> Self {
        Self {
            name: None,
            parameters: JobParameters::default(),
            reader: None,
            filters: Vec::new(),
            mapper: Box::new(mapper),
            validators: Vec::new(),
            processors: Box::new(NoProcessor::default()),
            writer: None,
            job_listener: CompositeJobListener::default(),
            pipeline_listener: CompositePipelineListener::default(),
            reader_listener: CompositeRecordReaderListener::default(),
            writer_listener: CompositeRecordWriterListener::default(),
            custom_metrics: CustomMetrics::default(),
            misplaced: Vec::new(),
        }
    }
}

impl<I: 'static, O: 'static, M: 'static> JobBuilder<I, O, M> {
    /// Handle to the custom metrics of the job being built, to hand to its collaborators.
    pub fn custom_metrics(&self) -> CustomMetrics {
        self.custom_metrics.clone()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replaces all parameters at once, for example parameters loaded from a file.
    pub fn parameters(mut self, parameters: JobParameters) -> Self {
        self.name = Some(parameters.name.clone());
        self.parameters = parameters;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.parameters.batch_size = batch_size;
        self
    }

    pub fn strict_mode(mut self, strict_mode: bool) -> Self {
        self.parameters.strict_mode = strict_mode;
        self
    }

    pub fn silent_mode(mut self, silent_mode: bool) -> Self {
        self.parameters.silent_mode = silent_mode;
        self
    }

    pub fn reader(mut self, reader: impl RecordReader<I> + Send + 'static) -> Self {
        self.reader = Some(Box::new(reader));
        self
    }

    pub fn filter(mut self, filter: impl RecordFilter<I> + Send + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Replaces the mapper.
    pub fn mapper(mut self, mapper: impl RecordMapper<I, M> + Send + 'static) -> Self {
        self.mapper = Box::new(mapper);
        self
    }

    /// Adds a validator. Validators always run right after the mapper, before any processor.
    pub fn validator(mut self, validator: impl RecordValidator<M> + Send + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    pub fn processor(mut self, processor: impl RecordProcessor<O> + Send + 'static) -> Self {
        self.processors = Box::new(Then::new(self.processors, Box::new(processor)));
        self
    }

    /// Appends a processor that changes the payload type, for example to marshal records
    /// into the format expected by the writer.
    ///
    /// A writer, pipeline listener or writer listener registered before this call is typed on
    /// the previous payload: [`JobBuilder::build`] then fails.
    ///
    /// # Example
    ///
    /// ```
    /// use easy_batch_rs::core::{job::{Job, JobBuilder}, record::Record};
    /// use easy_batch_rs::item::{iterator::IteratorRecordReader, vec::VecRecordWriter};
    /// use easy_batch_rs::BatchError;
    ///
    /// let writer = VecRecordWriter::new();
    ///
    /// let mut job = JobBuilder::new()
    ///     .reader(IteratorRecordReader::new("points", vec![(1, 2), (3, 4)]))
    ///     .marshaller(|record: Record<(i32, i32)>| {
    ///         let (x, y) = *record.payload();
    ///         Ok::<_, BatchError>(Some(record.with_payload(format!("{};{}", x, y))))
    ///     })
    ///     .writer(writer.clone())
    ///     .build()
    ///     .unwrap();
    /// job.call();
    ///
    /// assert_eq!(writer.payloads(), vec!["1;2", "3;4"]);
    /// ```
    pub fn marshaller<N: 'static>(
        self,
        marshaller: impl RecordProcessor<O, N> + Send + 'static,
    ) -> JobBuilder<I, N, M> {
        let mut misplaced = self.misplaced;
        if self.writer.is_some() {
            misplaced.push("record writer");
        }
        if !self.pipeline_listener.is_empty() {
            misplaced.push("pipeline listener");
        }
        if !self.writer_listener.is_empty() {
            misplaced.push("record writer listener");
        }

        JobBuilder {
            name: self.name,
            parameters: self.parameters,
            reader: self.reader,
            filters: self.filters,
            mapper: self.mapper,
            validators: self.validators,
            processors: Box::new(Then::new(self.processors, Box::new(marshaller))),
            writer: None,
            job_listener: self.job_listener,
            pipeline_listener: CompositePipelineListener::default(),
            reader_listener: self.reader_listener,
            writer_listener: CompositeRecordWriterListener::default(),
            custom_metrics: self.custom_metrics,
            misplaced,
        }
    }

    pub fn writer(mut self, writer: impl RecordWriter<O> + Send + 'static) -> Self {
        self.writer = Some(Box::new(writer));
        self
    }

    pub fn job_listener(mut self, listener: impl JobListener + Send + 'static) -> Self {
        self.job_listener.add(Box::new(listener));
        self
    }

    pub fn pipeline_listener(
        mut self,
        listener: impl PipelineListener<I, O> + Send + 'static,
    ) -> Self {
        self.pipeline_listener.add(Box::new(listener));
        self
    }

    pub fn reader_listener(mut self, listener: impl RecordReaderListener<I> + Send + 'static) -> Self {
        self.reader_listener.add(Box::new(listener));
        self
    }

    pub fn writer_listener(mut self, listener: impl RecordWriterListener<O> + Send + 'static) -> Self {
        self.writer_listener.add(Box::new(listener));
        self
    }

    /// Builds the job.
    ///
    /// # Errors
    /// `BatchError::Configuration` when the reader or the writer is missing, when the
    /// batch size is 0, when the job name is empty or when a collaborator was registered
    /// before a marshaller changed its payload type.
    pub fn build(self) -> Result<JobInstance<I, O>, BatchError> {
        if !self.misplaced.is_empty() {
            return Err(BatchError::Configuration(format!(
                "{} must be registered after the marshallers",
                self.misplaced.join(", ")
            )));
        }

        let mut parameters = self.parameters;
        if let Some(name) = self.name {
            parameters.name = name;
        }
        parameters.validate()?;

        let reader = self
            .reader
            .ok_or_else(|| BatchError::Configuration("a record reader is required".to_string()))?;
        let writer = self
            .writer
            .ok_or_else(|| BatchError::Configuration("a record writer is required".to_string()))?;

        let id = Uuid::new_v4();
        let monitor = JobMonitor::new(JobProgress::new(id, parameters.name.clone()));

        Ok(JobInstance {
            id,
            parameters,
            reader,
            filters: self.filters,
            chain: Box::new(Stages {
                mapper: self.mapper,
                validators: self.validators,
                processors: self.processors,
            }),
            writer,
            job_listener: self.job_listener,
            pipeline_listener: self.pipeline_listener,
            reader_listener: self.reader_listener,
            writer_listener: self.writer_listener,
            status: JobStatus::Starting,
            metrics: JobMetrics::default(),
            custom_metrics: self.custom_metrics,
            monitor,
            cancellation: CancellationToken::new(),
            report: None,
        })
    }
}
