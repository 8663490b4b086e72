use std::{
    marker::PhantomData,
    ops::RangeInclusive,
    sync::{Arc, Mutex, PoisonError},
};

use crate::core::{
    item::{FilterDecision, RecordFilter},
    record::Record,
};

/// Keeps the records whose payload matches a predicate and rejects the others.
///
/// # Examples
///
/// ```
/// use easy_batch_rs::core::{
///     item::{FilterDecision, RecordFilter},
///     record::{Header, Record},
/// };
/// use easy_batch_rs::item::filter::PayloadFilter;
///
/// let filter = PayloadFilter::new(|age: &u32| *age >= 18);
///
/// let adult = Record::new(Header::new(1, "people"), 42);
/// let child = Record::new(Header::new(2, "people"), 7);
///
/// assert_eq!(filter.filter(&adult), FilterDecision::Keep);
/// assert_eq!(filter.filter(&child), FilterDecision::Reject);
/// ```
pub struct PayloadFilter<P, F> {
    predicate: F,
    _payload: PhantomData<fn(&P)>,
}

impl<P, F> PayloadFilter<P, F>
where
    F: Fn(&P) -> bool,
{
    pub fn new(predicate: F) -> Self {
        Self {
            predicate,
            _payload: PhantomData,
        }
    }
}

impl<P, F> RecordFilter<P> for PayloadFilter<P, F>
where
    F: Fn(&P) -> bool,
{
    fn filter(&self, record: &Record<P>) -> FilterDecision {
        FilterDecision::from((self.predicate)(record.payload()))
    }
}

/// Flags the records matching a predicate as poison: the job ends when it meets one.
///
/// Useful when the data source carries its own end marker, such as a trailer line.
pub struct PoisonRecordFilter<P, F> {
    predicate: F,
    _payload: PhantomData<fn(&P)>,
}

impl<P, F> PoisonRecordFilter<P, F>
where
    F: Fn(&Record<P>) -> bool,
{
    pub fn new(predicate: F) -> Self {
        Self {
            predicate,
            _payload: PhantomData,
        }
    }
}

impl<P, F> RecordFilter<P> for PoisonRecordFilter<P, F>
where
    F: Fn(&Record<P>) -> bool,
{
    fn filter(&self, record: &Record<P>) -> FilterDecision {
        if (self.predicate)(record) {
            FilterDecision::Poison
        } else {
            FilterDecision::Keep
        }
    }
}

/// Rejects the records whose number lies within a range (bounds included).
///
/// Typically used to skip a header: `RecordNumberBetweenFilter::new(1..=1)`.
#[derive(Debug, Clone)]
pub struct RecordNumberBetweenFilter {
    range: RangeInclusive<u64>,
}

impl RecordNumberBetweenFilter {
    pub fn new(range: RangeInclusive<u64>) -> Self {
        Self { range }
    }
}

impl<P> RecordFilter<P> for RecordNumberBetweenFilter {
    fn filter(&self, record: &Record<P>) -> FilterDecision {
        FilterDecision::from(!self.range.contains(&record.header().number()))
    }
}

/// Rejects the records whose text payload is empty or made of whitespace only.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyRecordFilter;

impl<P: AsRef<str>> RecordFilter<P> for EmptyRecordFilter {
    fn filter(&self, record: &Record<P>) -> FilterDecision {
        FilterDecision::from(!record.payload().as_ref().trim().is_empty())
    }
}

/// Wraps a filter and keeps a copy of every record it rejects.
///
/// Clones share the saved records, so one clone can be registered on the job and the other
/// kept to inspect the rejected records afterwards.
pub struct FilteredRecordsSavingFilter<P, F> {
    delegate: Arc<F>,
    filtered: Arc<Mutex<Vec<Record<P>>>>,
}

impl<P, F> Clone for FilteredRecordsSavingFilter<P, F> {
    fn clone(&self) -> Self {
        Self {
            delegate: Arc::clone(&self.delegate),
            filtered: Arc::clone(&self.filtered),
        }
    }
}

impl<P: Clone, F: RecordFilter<P>> FilteredRecordsSavingFilter<P, F> {
    pub fn new(delegate: F) -> Self {
        Self {
            delegate: Arc::new(delegate),
            filtered: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn filtered_records(&self) -> Vec<Record<P>> {
        self.filtered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<P: Clone, F: RecordFilter<P>> RecordFilter<P> for FilteredRecordsSavingFilter<P, F> {
    fn filter(&self, record: &Record<P>) -> FilterDecision {
        let decision = self.delegate.filter(record);
        if decision == FilterDecision::Reject {
            self.filtered
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(record.clone());
        }
        decision
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        core::{
            item::{FilterDecision, RecordFilter},
            job::{Job, JobBuilder},
            record::{Header, Record},
            report::JobStatus,
        },
        item::{iterator::IteratorRecordReader, vec::VecRecordWriter},
    };

    use super::{
        EmptyRecordFilter, FilteredRecordsSavingFilter, PayloadFilter, PoisonRecordFilter,
        RecordNumberBetweenFilter,
    };

    fn record(number: u64, payload: &str) -> Record<String> {
        Record::new(Header::new(number, "test"), payload.to_string())
    }

    #[test]
    fn record_number_range_is_inclusive() {
        let filter = RecordNumberBetweenFilter::new(2..=3);

        let decisions: Vec<FilterDecision> = (1..=4)
            .map(|number| filter.filter(&record(number, "x")))
            .collect();

        assert_eq!(
            decisions,
            vec![
                FilterDecision::Keep,
                FilterDecision::Reject,
                FilterDecision::Reject,
                FilterDecision::Keep
            ]
        );
    }

    #[test]
    fn blank_payloads_are_rejected() {
        assert_eq!(EmptyRecordFilter.filter(&record(1, "  ")), FilterDecision::Reject);
        assert_eq!(EmptyRecordFilter.filter(&record(1, "a")), FilterDecision::Keep);
    }

    #[test]
    fn poison_filter_flags_matching_records() {
        let filter = PoisonRecordFilter::new(|record: &Record<String>| record.payload() == "EOF");
        assert_eq!(filter.filter(&record(1, "data")), FilterDecision::Keep);
        assert_eq!(filter.filter(&record(2, "EOF")), FilterDecision::Poison);
    }

    #[test]
    fn filtered_records_are_saved_and_counted() {
        let lines = ["ipsum", "", "consectetur", "", "Lorem"];
        let known = ["Lorem", "ipsum", "dolor", "sit", "amet"];
        let saving = FilteredRecordsSavingFilter::new(PayloadFilter::new(move |payload: &String| {
            known.contains(&payload.as_str())
        }));
        let writer = VecRecordWriter::new();

        let mut job = JobBuilder::new()
            .reader(IteratorRecordReader::new(
                "lines",
                lines.into_iter().map(String::from),
            ))
            .filter(saving.clone())
            .writer(writer.clone())
            .build()
            .unwrap();
        let report = job.call();

        assert_eq!(report.status(), JobStatus::Completed);
        assert_eq!(report.metrics().read_count(), 5);
        assert_eq!(report.metrics().filtered_count(), 3);
        assert_eq!(report.metrics().write_count(), 2);
        assert_eq!(writer.payloads(), vec!["ipsum", "Lorem"]);
        let saved: Vec<u64> = saving
            .filtered_records()
            .iter()
            .map(|record| record.header().number())
            .collect();
        assert_eq!(saved, vec![2, 3, 4]);
    }
}
