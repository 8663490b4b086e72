use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
/// Batch error
///
/// Every stage of the pipeline reports failures through this type. Whether an error
/// is skipped or stops the job depends on its variant and on the job's strict mode:
///
/// - `RecordMapper`, `Validation` and recoverable `RecordProcessor` errors skip the record
/// - `RecordReader`, `RecordWriter` and fatal `RecordProcessor` errors fail the job
/// - `Configuration` is raised at build time, before any record is read
pub enum BatchError {
    #[error("RecordReader: {0}")]
    RecordReader(String),

    #[error("RecordWriter: {0}")]
    RecordWriter(String),

    #[error("RecordMapper: {0}")]
    RecordMapper(String),

    #[error("RecordValidator: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("RecordProcessor: {message}")]
    RecordProcessor { message: String, fatal: bool },

    #[error("Listener: {0}")]
    Listener(String),

    #[error("Configuration: {0}")]
    Configuration(String),

    #[error("JobExecutor: {0}")]
    JobExecutor(String),
}

impl BatchError {
    /// Processing error after which the job moves on to the next record.
    pub fn recoverable(message: impl Into<String>) -> Self {
        BatchError::RecordProcessor {
            message: message.into(),
            fatal: false,
        }
    }

    /// Processing error that stops the job.
    pub fn fatal(message: impl Into<String>) -> Self {
        BatchError::RecordProcessor {
            message: message.into(),
            fatal: true,
        }
    }

    /// Returns `true` when this error stops the job regardless of strict mode.
    pub fn is_fatal(&self) -> bool {
        match self {
            BatchError::RecordReader(_) | BatchError::RecordWriter(_) => true,
            BatchError::RecordProcessor { fatal, .. } => *fatal,
            _ => false,
        }
    }
}
