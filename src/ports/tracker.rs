//! Experiment tracker port: Trait for recording training runs.

use std::collections::BTreeMap;

/// A run as read back from the tracker.
#[derive(Debug, Clone)]
pub struct TrackedRun {
    pub id: String,
    pub experiment: String,
    pub run_name: String,
    pub params: BTreeMap<String, String>,
    pub metrics: BTreeMap<String, f64>,
    /// Size of the stored model blob in bytes
    pub model_size: usize,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Trait for experiment tracking sinks.
///
/// The serving path never reads from the tracker.
pub trait ExperimentTracker: Send + Sync {
    /// Error type for tracker operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Record one training run.
    ///
    /// # Returns
    /// The id assigned to the run.
    ///
    /// # Errors
    /// Returns error if the run cannot be persisted.
    fn record(
        &self,
        run_name: &str,
        params: &BTreeMap<String, String>,
        metrics: &BTreeMap<String, f64>,
        model_blob: &[u8],
    ) -> Result<String, Self::Error>;

    /// Load all runs of the current experiment, oldest first.
    ///
    /// # Errors
    /// Returns error if the tracker cannot be read.
    fn list_runs(&self) -> Result<Vec<TrackedRun>, Self::Error>;
}
