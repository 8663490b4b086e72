use serde_json::Value;

use crate::BatchError;

use super::{
    item::{RecordMapper, RecordProcessor, RecordProcessorResult, RecordValidator},
    record::Record,
};

/// Stage that rejected a record, with the error it raised.
#[derive(Debug)]
pub(crate) enum StageError {
    Mapping(BatchError),
    Validation(BatchError),
    Processing(BatchError),
}

/// Mapper, validators and processors of a job, seen as a single `I -> O` step.
///
/// Hides the payload types in between, so a job is only generic over what it reads and
/// what it writes.
pub(crate) trait RecordChain<I, O> {
    /// Runs a record through every stage. `Ok(None)` means a processor vetoed it.
    fn run(&mut self, record: &Record<I>) -> Result<Option<Record<O>>, StageError>;

    /// Results computed by the processors, in registration order.
    fn results(&self) -> Vec<Value>;
}

/// Processors registered so far, composed from `I` to `O`.
pub(crate) trait ProcessorChain<I, O> {
    fn process(&mut self, record: Record<I>) -> RecordProcessorResult<O>;

    fn collect_results(&self, results: &mut Vec<Value>);
}

/// Chain without any processor.
#[derive(Default)]
pub(crate) struct NoProcessor {}

impl<P> ProcessorChain<P, P> for NoProcessor {
    fn process(&mut self, record: Record<P>) -> RecordProcessorResult<P> {
        Ok(Some(record))
    }

    fn collect_results(&self, _results: &mut Vec<Value>) {}
}

/// A processor appended to an existing chain.
pub(crate) struct Then<I, M, O> {
    head: Box<dyn ProcessorChain<I, M> + Send>,
    processor: Box<dyn RecordProcessor<M, O> + Send>,
}

impl<I, M, O> Then<I, M, O> {
    pub(crate) fn new(
        head: Box<dyn ProcessorChain<I, M> + Send>,
        processor: Box<dyn RecordProcessor<M, O> + Send>,
    ) -> Self {
        Self { head, processor }
    }
}

impl<I, M, O> ProcessorChain<I, O> for Then<I, M, O> {
    fn process(&mut self, record: Record<I>) -> RecordProcessorResult<O> {
        match self.head.process(record)? {
            Some(record) => self.processor.process(record),
            None => Ok(None),
        }
    }

    fn collect_results(&self, results: &mut Vec<Value>) {
        self.head.collect_results(results);
        results.extend(self.processor.result());
    }
}

/// Mapper, then validators, then processors.
pub(crate) struct Stages<I, M, O> {
    pub(crate) mapper: Box<dyn RecordMapper<I, M> + Send>,
    pub(crate) validators: Vec<Box<dyn RecordValidator<M> + Send>>,
    pub(crate) processors: Box<dyn ProcessorChain<M, O> + Send>,
}

impl<I, M, O> RecordChain<I, O> for Stages<I, M, O> {
    fn run(&mut self, record: &Record<I>) -> Result<Option<Record<O>>, StageError> {
        let mapped = self.mapper.map(record).map_err(StageError::Mapping)?;

        self.validators
            .iter()
            .try_for_each(|validator| validator.validate(&mapped))
            .map_err(StageError::Validation)?;

        self.processors
            .process(mapped)
            .map_err(StageError::Processing)
    }

    fn results(&self) -> Vec<Value> {
        let mut results = Vec::new();
        self.processors.collect_results(&mut results);
        results
    }
}
