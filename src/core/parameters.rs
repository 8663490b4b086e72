use serde::{Deserialize, Serialize};

use crate::error::BatchError;

use super::build_name;

/// Default number of records written together.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Configuration snapshot of a job, immutable once the job starts.
///
/// Parameters are usually set through [`JobBuilder`](super::job::JobBuilder), but can also be
/// loaded from JSON:
///
/// ```
/// use easy_batch_rs::core::parameters::JobParameters;
///
/// let parameters = JobParameters::from_json(r#"{"name": "import", "batch_size": 50}"#).unwrap();
///
/// assert_eq!(parameters.name, "import");
/// assert_eq!(parameters.batch_size, 50);
/// assert!(!parameters.strict_mode);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobParameters {
    /// Name of the job, used in logs and reports
    pub name: String,
    /// Number of records written together, at least 1
    pub batch_size: usize,
    /// When enabled, any mapping, validation or processing error fails the job
    pub strict_mode: bool,
    /// When enabled, the report is not logged at the end of the run
    pub silent_mode: bool,
}

impl Default for JobParameters {
    fn default() -> Self {
        Self {
            name: build_name(),
            batch_size: DEFAULT_BATCH_SIZE,
            strict_mode: false,
            silent_mode: false,
        }
    }
}

impl JobParameters {
    /// Parses and validates parameters from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, BatchError> {
        let parameters: JobParameters = serde_json::from_str(json)
            .map_err(|error| BatchError::Configuration(error.to_string()))?;
        parameters.validate()?;
        Ok(parameters)
    }

    pub fn validate(&self) -> Result<(), BatchError> {
        if self.batch_size == 0 {
            return Err(BatchError::Configuration(
                "batch size must be greater than or equal to 1".to_string(),
            ));
        }
        if self.name.trim().is_empty() {
            return Err(BatchError::Configuration(
                "job name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::BatchError;

    use super::{DEFAULT_BATCH_SIZE, JobParameters};

    #[test]
    fn defaults_are_valid() {
        let parameters = JobParameters::default();
        assert_eq!(parameters.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(parameters.name.len(), 8);
        assert!(parameters.validate().is_ok());
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let result = JobParameters::from_json(r#"{"batch_size": 0}"#);
        assert!(matches!(result, Err(BatchError::Configuration(_))));
    }

    #[test]
    fn malformed_json_is_a_configuration_error() {
        let result = JobParameters::from_json("{batch_size");
        assert!(matches!(result, Err(BatchError::Configuration(_))));
    }

    #[test]
    fn flags_are_read_from_json() {
        let parameters =
            JobParameters::from_json(r#"{"strict_mode": true, "silent_mode": true}"#).unwrap();
        assert!(parameters.strict_mode);
        assert!(parameters.silent_mode);
    }
}
