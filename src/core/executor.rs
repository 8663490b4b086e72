use std::{
    num::NonZeroUsize,
    sync::{Mutex, PoisonError},
    thread,
};

use log::{debug, info};
use tokio::{
    runtime::{Builder, Handle, Runtime},
    task::JoinHandle,
};
use tokio_util::task::TaskTracker;

use crate::BatchError;

use super::{job::Job, report::JobReport};

/// Runs jobs on a pool of worker threads.
///
/// Jobs share no state, so they run side by side without any synchronization between them.
/// At most `workers` jobs run at the same time; the others wait for a free worker.
///
/// The executor must not be used from inside an asynchronous context: its blocking methods
/// (`execute`, `JobHandle::wait`, `shutdown`) drive its own runtime. Use [`JobHandle::join`]
/// from async code.
///
/// # Example
///
/// ```
/// use easy_batch_rs::core::{executor::JobExecutor, job::JobBuilder, report::JobStatus};
/// use easy_batch_rs::item::{iterator::IteratorRecordReader, vec::VecRecordWriter};
///
/// let executor = JobExecutor::with_workers(2).unwrap();
///
/// let jobs = (0..3).map(|partition| {
///     JobBuilder::new()
///         .name(format!("partition-{}", partition))
///         .reader(IteratorRecordReader::new(format!("part-{}", partition), 0..10))
///         .writer(VecRecordWriter::new())
///         .build()
///         .unwrap()
/// });
///
/// let reports = executor.execute_all(jobs).unwrap();
/// executor.shutdown();
///
/// assert_eq!(reports.len(), 3);
/// assert!(reports.iter().all(|report| report.status() == JobStatus::Completed));
/// assert_eq!(reports[2].job_name(), "partition-2");
/// ```
pub struct JobExecutor {
    runtime: Runtime,
    tracker: TaskTracker,
    /// Held while checking for shutdown and spawning, and while closing the tracker
    admission: Mutex<()>,
    workers: usize,
}

impl JobExecutor {
    /// Creates an executor with one worker per available processor.
    pub fn new() -> Result<Self, BatchError> {
        let workers = thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1);
        Self::with_workers(workers)
    }

    /// Creates an executor with the given number of workers.
    ///
    /// # Errors
    /// `BatchError::Configuration` when `workers` is 0, `BatchError::JobExecutor` when the
    /// thread pool cannot be started.
    pub fn with_workers(workers: usize) -> Result<Self, BatchError> {
        if workers == 0 {
            return Err(BatchError::Configuration(
                "a job executor needs at least one worker".to_string(),
            ));
        }

        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(workers)
            .thread_name("job-executor")
            .enable_all()
            .build()
            .map_err(|error| BatchError::JobExecutor(error.to_string()))?;

        debug!("Job executor started with {} worker(s)", workers);

        Ok(Self {
            runtime,
            tracker: TaskTracker::new(),
            admission: Mutex::new(()),
            workers,
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Number of submitted jobs that have not finished yet.
    pub fn pending_jobs(&self) -> usize {
        self.tracker.len()
    }

    /// Submits a job for asynchronous execution.
    ///
    /// # Errors
    /// `BatchError::JobExecutor` when the executor has been shut down.
    pub fn submit<J>(&self, mut job: J) -> Result<JobHandle, BatchError>
    where
        J: Job + Send + 'static,
    {
        let _admission = self
            .admission
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if self.tracker.is_closed() {
            return Err(BatchError::JobExecutor(format!(
                "Unable to execute job {}: executor is shut down",
                job.name()
            )));
        }

        let job_name = job.name().to_string();
        debug!("Submitting job '{}'", job_name);
        let inner = self
            .tracker
            .spawn_blocking_on(move || job.call(), self.runtime.handle());

        Ok(JobHandle {
            job_name,
            inner,
            runtime: self.runtime.handle().clone(),
        })
    }

    /// Executes a job and blocks until its report is available.
    pub fn execute<J>(&self, job: J) -> Result<JobReport, BatchError>
    where
        J: Job + Send + 'static,
    {
        self.submit(job)?.wait()
    }

    /// Submits jobs for execution. Handles are returned in submission order.
    pub fn submit_all<J, It>(&self, jobs: It) -> Result<Vec<JobHandle>, BatchError>
    where
        J: Job + Send + 'static,
        It: IntoIterator<Item = J>,
    {
        jobs.into_iter().map(|job| self.submit(job)).collect()
    }

    /// Executes jobs concurrently and returns their reports in submission order.
    pub fn execute_all<J, It>(&self, jobs: It) -> Result<Vec<JobReport>, BatchError>
    where
        J: Job + Send + 'static,
        It: IntoIterator<Item = J>,
    {
        self.submit_all(jobs)?
            .into_iter()
            .map(JobHandle::wait)
            .collect()
    }

    /// Stops accepting new jobs and waits for the running and queued ones to finish.
    ///
    /// A job accepted by `submit` is always waited for, even when `submit` runs concurrently
    /// on another thread.
    pub fn shutdown(&self) {
        {
            let _admission = self
                .admission
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            info!(
                "Shutting down job executor, waiting for {} job(s)",
                self.tracker.len()
            );
            self.tracker.close();
        }
        self.runtime.block_on(self.tracker.wait());
        info!("Job executor shut down");
    }

    pub fn is_shutdown(&self) -> bool {
        self.tracker.is_closed()
    }
}

/// Handle to a submitted job.
pub struct JobHandle {
    job_name: String,
    inner: JoinHandle<JobReport>,
    runtime: Handle,
}

impl JobHandle {
    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }

    /// Blocks until the job report is available.
    ///
    /// # Errors
    /// `BatchError::JobExecutor` when the job panicked.
    pub fn wait(self) -> Result<JobReport, BatchError> {
        let runtime = self.runtime.clone();
        runtime.block_on(self.join())
    }

    /// Waits asynchronously for the job report.
    pub async fn join(self) -> Result<JobReport, BatchError> {
        let job_name = self.job_name;
        self.inner.await.map_err(|error| {
            BatchError::JobExecutor(format!("Unable to execute job {}: {}", job_name, error))
        })
    }
}
