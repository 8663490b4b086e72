use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use uuid::Uuid;

use crate::error::BatchError;

use super::{metrics::JobMetrics, parameters::JobParameters};

/// Lifecycle of a job run.
///
/// `Starting -> Started -> Stopping -> Completed | Failed | Aborted`
///
/// Once a terminal status (`Completed`, `Failed`, `Aborted`) is reached it never changes.
/// A failure may happen from any non terminal status, skipping `Stopping`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Starting,
    Started,
    Stopping,
    Completed,
    Failed,
    Aborted,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Aborted
        )
    }

    /// Returns `true` when moving from `self` to `next` respects the lifecycle.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        match (self, next) {
            (JobStatus::Starting, JobStatus::Started) => true,
            (JobStatus::Started, JobStatus::Stopping) => true,
            (JobStatus::Stopping, JobStatus::Completed | JobStatus::Aborted) => true,
            (current, JobStatus::Failed) => !current.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            JobStatus::Starting => "STARTING",
            JobStatus::Started => "STARTED",
            JobStatus::Stopping => "STOPPING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
            JobStatus::Aborted => "ABORTED",
        };
        f.write_str(label)
    }
}

fn serialize_error<S>(error: &Option<BatchError>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match error {
        Some(error) => serializer.serialize_some(&error.to_string()),
        None => serializer.serialize_none(),
    }
}

/// Immutable summary of a job run.
///
/// The report is the single artifact a caller inspects to learn the outcome of a job:
/// its status, the metrics, timing, the results computed by processors and the error that
/// stopped the job, if any.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    job_id: Uuid,
    job_name: String,
    parameters: JobParameters,
    status: JobStatus,
    metrics: JobMetrics,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    results: Vec<Value>,
    #[serde(serialize_with = "serialize_error")]
    last_error: Option<BatchError>,
    data_source: String,
}

impl JobReport {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        job_id: Uuid,
        parameters: JobParameters,
        status: JobStatus,
        metrics: JobMetrics,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        results: Vec<Value>,
        last_error: Option<BatchError>,
        data_source: String,
    ) -> Self {
        Self {
            job_id,
            job_name: parameters.name.clone(),
            parameters,
            status,
            metrics,
            start_time,
            end_time,
            results,
            last_error,
            data_source,
        }
    }

    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn parameters(&self) -> &JobParameters {
        &self.parameters
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn metrics(&self) -> &JobMetrics {
        &self.metrics
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    /// Results computed by the processors, in processor registration order.
    pub fn results(&self) -> &[Value] {
        &self.results
    }

    /// The error that stopped the job, or the last close failure of a finished job.
    pub fn last_error(&self) -> Option<&BatchError> {
        self.last_error.as_ref()
    }

    /// Provenance of the records, one data source name per line.
    pub fn data_source(&self) -> &str {
        &self.data_source
    }

    pub fn to_json(&self) -> Result<String, BatchError> {
        serde_json::to_string(self).map_err(|error| BatchError::JobExecutor(error.to_string()))
    }

    /// Combines two reports, typically produced by jobs working on partitions of the same input.
    ///
    /// - counts (custom metrics included) are summed
    /// - the start time is the earliest one, the end time the latest one
    /// - the status is `Failed` if either report failed, `Completed` otherwise
    /// - results are concatenated, `self` first
    /// - data source names are joined with a line break, `self` first
    ///
    /// The numeric part is associative and commutative, the data source label and the
    /// results keep the call order. Name and parameters are taken from `self`.
    ///
    /// ```
    /// use easy_batch_rs::core::job::{Job, JobBuilder};
    /// use easy_batch_rs::item::{iterator::IteratorRecordReader, vec::VecRecordWriter};
    ///
    /// let mut first = JobBuilder::<u32, u32>::new()
    ///     .reader(IteratorRecordReader::new("part-1", vec![1, 2, 3]))
    ///     .writer(VecRecordWriter::new())
    ///     .build()
    ///     .unwrap();
    /// let mut second = JobBuilder::<u32, u32>::new()
    ///     .reader(IteratorRecordReader::new("part-2", vec![4, 5]))
    ///     .writer(VecRecordWriter::new())
    ///     .build()
    ///     .unwrap();
    ///
    /// let report = first.call().merge(&second.call());
    ///
    /// assert_eq!(report.metrics().read_count(), 5);
    /// assert_eq!(report.data_source(), "part-1\npart-2");
    /// ```
    pub fn merge(&self, other: &JobReport) -> JobReport {
        let status = if self.status == JobStatus::Failed || other.status == JobStatus::Failed {
            JobStatus::Failed
        } else {
            JobStatus::Completed
        };

        let mut results = self.results.clone();
        results.extend(other.results.iter().cloned());

        JobReport {
            job_id: Uuid::new_v4(),
            job_name: self.job_name.clone(),
            parameters: self.parameters.clone(),
            status,
            metrics: self.metrics.merge(&other.metrics),
            start_time: self.start_time.min(other.start_time),
            end_time: self.end_time.max(other.end_time),
            results,
            last_error: self.last_error.clone().or_else(|| other.last_error.clone()),
            data_source: format!("{}\n{}", self.data_source, other.data_source),
        }
    }

    /// Folds reports in iteration order. Returns `None` for an empty input.
    pub fn merge_all<I>(reports: I) -> Option<JobReport>
    where
        I: IntoIterator<Item = JobReport>,
    {
        reports
            .into_iter()
            .reduce(|merged, report| merged.merge(&report))
    }
}

impl fmt::Display for JobReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Job Report:")?;
        writeln!(f, "===========")?;
        writeln!(f, "Name: {}", self.job_name)?;
        writeln!(f, "Status: {}", self.status)?;
        writeln!(f, "Data source: {}", self.data_source.replace('\n', ", "))?;
        writeln!(f, "Parameters:")?;
        writeln!(f, "\tBatch size = {}", self.parameters.batch_size)?;
        writeln!(f, "\tStrict mode = {}", self.parameters.strict_mode)?;
        writeln!(f, "\tSilent mode = {}", self.parameters.silent_mode)?;
        writeln!(f, "Metrics:")?;
        writeln!(f, "\tStart time = {}", self.start_time.to_rfc3339())?;
        writeln!(f, "\tEnd time = {}", self.end_time.to_rfc3339())?;
        writeln!(f, "\tDuration = {}ms", self.duration().num_milliseconds())?;
        writeln!(f, "\tRead count = {}", self.metrics.read_count())?;
        writeln!(f, "\tFiltered count = {}", self.metrics.filtered_count())?;
        writeln!(f, "\tMapping error count = {}", self.metrics.mapping_error_count())?;
        writeln!(
            f,
            "\tValidation error count = {}",
            self.metrics.validation_error_count()
        )?;
        writeln!(
            f,
            "\tProcessing error count = {}",
            self.metrics.processing_error_count()
        )?;
        write!(f, "\tWrite count = {}", self.metrics.write_count())?;
        for (name, value) in self.metrics.custom_metrics() {
            write!(f, "\n\t{} = {}", name, value)?;
        }
        if let Some(error) = &self.last_error {
            write!(f, "\nLast error: {}", error)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;
    use uuid::Uuid;

    use crate::{
        core::{metrics::JobMetrics, parameters::JobParameters},
        error::BatchError,
    };

    use super::{JobReport, JobStatus};

    fn report(read: u64, start: i64, end: i64, status: JobStatus, source: &str) -> JobReport {
        let mut metrics = JobMetrics::default();
        for _ in 0..read {
            metrics.increment_read_count();
        }
        metrics.increment_write_count(read as usize);

        JobReport::new(
            Uuid::new_v4(),
            JobParameters {
                name: "partition".to_string(),
                ..JobParameters::default()
            },
            status,
            metrics,
            Utc.timestamp_opt(start, 0).unwrap(),
            Utc.timestamp_opt(end, 0).unwrap(),
            vec![json!(source)],
            None,
            source.to_string(),
        )
    }

    #[test]
    fn status_transitions_follow_the_lifecycle() {
        assert!(JobStatus::Starting.can_transition_to(JobStatus::Started));
        assert!(JobStatus::Started.can_transition_to(JobStatus::Stopping));
        assert!(JobStatus::Stopping.can_transition_to(JobStatus::Completed));
        assert!(JobStatus::Stopping.can_transition_to(JobStatus::Aborted));
        assert!(JobStatus::Started.can_transition_to(JobStatus::Failed));
        assert!(!JobStatus::Completed.can_transition_to(JobStatus::Failed));
        assert!(!JobStatus::Failed.can_transition_to(JobStatus::Completed));
        assert!(!JobStatus::Started.can_transition_to(JobStatus::Completed));
    }

    #[test]
    fn merge_combines_counts_times_and_labels() {
        let a = report(6, 1, 10, JobStatus::Completed, "datasource1");
        let b = report(6, 2, 11, JobStatus::Aborted, "datasource2");

        let merged = a.merge(&b);

        assert_eq!(merged.metrics().read_count(), 12);
        assert_eq!(merged.metrics().write_count(), 12);
        assert_eq!(merged.start_time(), a.start_time());
        assert_eq!(merged.end_time(), b.end_time());
        assert_eq!(merged.duration(), Duration::seconds(10));
        assert_eq!(merged.status(), JobStatus::Completed);
        assert_eq!(merged.results(), &[json!("datasource1"), json!("datasource2")]);
        assert_eq!(merged.data_source(), "datasource1\ndatasource2");
        assert_eq!(b.merge(&a).data_source(), "datasource2\ndatasource1");
    }

    #[test]
    fn merge_is_failed_when_any_input_failed() {
        let a = report(1, 1, 2, JobStatus::Completed, "a");
        let b = report(1, 1, 2, JobStatus::Failed, "b");

        assert_eq!(a.merge(&b).status(), JobStatus::Failed);
        assert_eq!(b.merge(&a).status(), JobStatus::Failed);
    }

    #[test]
    fn merge_all_is_order_independent_for_numbers() {
        let reports = vec![
            report(1, 5, 6, JobStatus::Completed, "a"),
            report(2, 3, 9, JobStatus::Completed, "b"),
            report(3, 4, 7, JobStatus::Completed, "c"),
        ];
        let forward = JobReport::merge_all(reports.clone()).unwrap();
        let backward = JobReport::merge_all(reports.into_iter().rev()).unwrap();

        assert_eq!(forward.metrics(), backward.metrics());
        assert_eq!(forward.start_time(), backward.start_time());
        assert_eq!(forward.end_time(), backward.end_time());
        assert_eq!(forward.data_source(), "a\nb\nc");
        assert_eq!(backward.data_source(), "c\nb\na");
        assert!(JobReport::merge_all(Vec::new()).is_none());
    }

    #[test]
    fn report_is_rendered_as_text_and_json() {
        let mut report = report(2, 0, 1, JobStatus::Completed, "input");
        report.last_error = Some(BatchError::RecordWriter("disk full".to_string()));

        let text = report.to_string();
        assert!(text.starts_with("Job Report:\n===========\nName: partition\nStatus: COMPLETED"));
        assert!(text.contains("\tRead count = 2"));
        assert!(text.contains("\tDuration = 1000ms"));
        assert!(text.ends_with("Last error: RecordWriter: disk full"));

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["status"], "COMPLETED");
        assert_eq!(json["last_error"], "RecordWriter: disk full");
        assert_eq!(json["metrics"]["read_count"], 2);
    }
}
