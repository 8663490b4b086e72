use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use serde::{Deserialize, Serialize};

/// Counters accumulated by a job while it runs.
///
/// Every record read ends up in exactly one bucket: filtered, one of the three error
/// kinds, or written. For a completed job:
///
/// `read == filtered + mapping_errors + validation_errors + processing_errors + write`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobMetrics {
    read_count: u64,
    filtered_count: u64,
    mapping_error_count: u64,
    validation_error_count: u64,
    processing_error_count: u64,
    write_count: u64,
    custom_metrics: BTreeMap<String, f64>,
}

impl JobMetrics {
    pub fn read_count(&self) -> u64 {
        self.read_count
    }

    pub fn filtered_count(&self) -> u64 {
        self.filtered_count
    }

    pub fn mapping_error_count(&self) -> u64 {
        self.mapping_error_count
    }

    pub fn validation_error_count(&self) -> u64 {
        self.validation_error_count
    }

    pub fn processing_error_count(&self) -> u64 {
        self.processing_error_count
    }

    pub fn write_count(&self) -> u64 {
        self.write_count
    }

    /// Sum of the mapping, validation and processing error counts.
    pub fn error_count(&self) -> u64 {
        self.mapping_error_count + self.validation_error_count + self.processing_error_count
    }

    pub fn custom_metrics(&self) -> &BTreeMap<String, f64> {
        &self.custom_metrics
    }

    pub fn custom_metric(&self, name: &str) -> Option<f64> {
        self.custom_metrics.get(name).copied()
    }

    /// Number of records that reached a final bucket.
    pub fn accounted_count(&self) -> u64 {
        self.filtered_count + self.error_count() + self.write_count
    }

    pub(crate) fn increment_read_count(&mut self) {
        self.read_count += 1;
    }

    pub(crate) fn increment_filtered_count(&mut self) {
        self.filtered_count += 1;
    }

    pub(crate) fn increment_mapping_error_count(&mut self) {
        self.mapping_error_count += 1;
    }

    pub(crate) fn increment_validation_error_count(&mut self) {
        self.validation_error_count += 1;
    }

    pub(crate) fn increment_processing_error_count(&mut self) {
        self.processing_error_count += 1;
    }

    pub(crate) fn increment_write_count(&mut self, count: usize) {
        self.write_count += count as u64;
    }

    pub(crate) fn set_custom_metrics(&mut self, custom_metrics: BTreeMap<String, f64>) {
        self.custom_metrics = custom_metrics;
    }

    /// Adds up two sets of metrics. Custom metrics with the same name are summed.
    pub fn merge(&self, other: &JobMetrics) -> JobMetrics {
        let mut custom_metrics = self.custom_metrics.clone();
        for (name, value) in &other.custom_metrics {
            *custom_metrics.entry(name.clone()).or_insert(0.0) += value;
        }

        JobMetrics {
            read_count: self.read_count + other.read_count,
            filtered_count: self.filtered_count + other.filtered_count,
            mapping_error_count: self.mapping_error_count + other.mapping_error_count,
            validation_error_count: self.validation_error_count + other.validation_error_count,
            processing_error_count: self.processing_error_count + other.processing_error_count,
            write_count: self.write_count + other.write_count,
            custom_metrics,
        }
    }
}

/// Shared handle through which collaborators record named metrics during a run.
///
/// The handle is cheap to clone and can be moved into readers, processors or writers.
/// Its content is copied into the job report when the job ends.
///
/// ```
/// use easy_batch_rs::core::metrics::CustomMetrics;
///
/// let metrics = CustomMetrics::default();
/// let handle = metrics.clone();
///
/// handle.increment("bytes", 512.0);
/// handle.increment("bytes", 256.0);
/// metrics.set("ratio", 0.5);
///
/// assert_eq!(metrics.get("bytes"), Some(768.0));
/// assert_eq!(handle.get("ratio"), Some(0.5));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CustomMetrics {
    values: Arc<Mutex<BTreeMap<String, f64>>>,
}

impl CustomMetrics {
    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, f64>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set(&self, name: impl Into<String>, value: f64) {
        self.lock().insert(name.into(), value);
    }

    pub fn increment(&self, name: impl Into<String>, delta: f64) {
        *self.lock().entry(name.into()).or_insert(0.0) += delta;
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.lock().get(name).copied()
    }

    pub fn snapshot(&self) -> BTreeMap<String, f64> {
        self.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::JobMetrics;

    fn metrics(read: u64, filtered: u64, written: usize) -> JobMetrics {
        let mut metrics = JobMetrics::default();
        for _ in 0..read {
            metrics.increment_read_count();
        }
        for _ in 0..filtered {
            metrics.increment_filtered_count();
        }
        metrics.increment_write_count(written);
        metrics
    }

    #[test]
    fn counts_add_up() {
        let mut metrics = metrics(6, 1, 2);
        metrics.increment_mapping_error_count();
        metrics.increment_validation_error_count();
        metrics.increment_processing_error_count();

        assert_eq!(metrics.error_count(), 3);
        assert_eq!(metrics.accounted_count(), metrics.read_count());
    }

    #[test]
    fn merge_sums_counts_and_custom_metrics() {
        let mut a = metrics(3, 1, 2);
        a.set_custom_metrics([("bytes".to_string(), 10.0)].into());
        let mut b = metrics(4, 0, 4);
        b.set_custom_metrics(
            [("bytes".to_string(), 5.0), ("files".to_string(), 1.0)].into(),
        );

        let merged = a.merge(&b);

        assert_eq!(merged.read_count(), 7);
        assert_eq!(merged.filtered_count(), 1);
        assert_eq!(merged.write_count(), 6);
        assert_eq!(merged.custom_metric("bytes"), Some(15.0));
        assert_eq!(merged.custom_metric("files"), Some(1.0));
        assert_eq!(merged, b.merge(&a));
    }
}
