//! Live view of a running job.
//!
//! A [`JobMonitor`] is created with its job and publishes a [`JobProgress`] snapshot after
//! each record and each status change. External consoles either poll the latest snapshot
//! (`Receiver::borrow`) or await pushes (`Receiver::changed`). Once the job reaches a terminal
//! status the monitor is frozen and publishes nothing more.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use uuid::Uuid;

use super::{metrics::JobMetrics, report::JobStatus};

/// Read-only snapshot of a job's state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobProgress {
    pub job_id: Uuid,
    pub job_name: String,
    pub status: JobStatus,
    pub metrics: JobMetrics,
    pub total_records: Option<u64>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl JobProgress {
    pub(crate) fn new(job_id: Uuid, job_name: String) -> Self {
        Self {
            job_id,
            job_name,
            status: JobStatus::Starting,
            metrics: JobMetrics::default(),
            total_records: None,
            start_time: None,
            end_time: None,
            last_error: None,
        }
    }

    /// e.g. `Job 'import' is STARTED`
    pub fn status_text(&self) -> String {
        match &self.last_error {
            Some(error) if self.status == JobStatus::Failed => {
                format!("Job '{}' is {}: {}", self.job_name, self.status, error)
            }
            _ => format!("Job '{}' is {}", self.job_name, self.status),
        }
    }

    /// Records read so far, against the total when the reader knows it: `3/10 (30%)` or `3/?`.
    pub fn progress_text(&self) -> String {
        let read = self.metrics.read_count();
        match self.total_records {
            Some(0) => "0/0 (100%)".to_string(),
            Some(total) => format!("{}/{} ({}%)", read, total, read * 100 / total),
            None => format!("{}/?", read),
        }
    }
}

/// Publisher side of the monitoring surface, owned by the job.
#[derive(Debug)]
pub struct JobMonitor {
    sender: watch::Sender<JobProgress>,
    frozen: bool,
}

impl JobMonitor {
    pub(crate) fn new(progress: JobProgress) -> Self {
        let (sender, _) = watch::channel(progress);
        Self {
            sender,
            frozen: false,
        }
    }

    /// Returns a receiver that always holds the latest snapshot.
    pub fn subscribe(&self) -> watch::Receiver<JobProgress> {
        self.sender.subscribe()
    }

    pub fn snapshot(&self) -> JobProgress {
        self.sender.borrow().clone()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub(crate) fn publish<F>(&mut self, update: F)
    where
        F: FnOnce(&mut JobProgress),
    {
        if self.frozen {
            return;
        }
        self.sender.send_modify(update);
    }

    /// Publishes a last snapshot and stops accepting updates.
    pub(crate) fn freeze<F>(&mut self, update: F)
    where
        F: FnOnce(&mut JobProgress),
    {
        self.publish(update);
        self.frozen = true;
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use crate::core::{metrics::JobMetrics, report::JobStatus};

    use super::{JobMonitor, JobProgress};

    fn metrics_with_reads(reads: u64) -> JobMetrics {
        let mut metrics = JobMetrics::default();
        for _ in 0..reads {
            metrics.increment_read_count();
        }
        metrics
    }

    #[test]
    fn progress_text_with_and_without_total() {
        let mut progress = JobProgress::new(Uuid::new_v4(), "import".to_string());
        progress.metrics = metrics_with_reads(3);

        assert_eq!(progress.progress_text(), "3/?");
        progress.total_records = Some(10);
        assert_eq!(progress.progress_text(), "3/10 (30%)");
        assert_eq!(progress.status_text(), "Job 'import' is STARTING");
    }

    #[test]
    fn subscribers_see_updates_until_frozen() {
        let mut monitor = JobMonitor::new(JobProgress::new(Uuid::new_v4(), "job".to_string()));
        let receiver = monitor.subscribe();

        monitor.publish(|progress| progress.status = JobStatus::Started);
        assert_eq!(receiver.borrow().status, JobStatus::Started);

        monitor.freeze(|progress| {
            progress.status = JobStatus::Failed;
            progress.last_error = Some("boom".to_string());
        });
        monitor.publish(|progress| progress.status = JobStatus::Completed);

        assert!(monitor.is_frozen());
        assert_eq!(monitor.snapshot().status, JobStatus::Failed);
        assert_eq!(receiver.borrow().status_text(), "Job 'job' is FAILED: boom");
    }
}
