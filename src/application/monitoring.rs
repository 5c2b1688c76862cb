//! Drift monitor: Threshold guard on model AUC.

/// AUC below which a model is considered drifted.
pub const DEFAULT_DRIFT_THRESHOLD: f64 = 0.7;

/// Returns true (and logs a warning) when `auc` is strictly below `threshold`.
#[must_use]
pub fn check_model_drift(auc: f64, threshold: f64) -> bool {
    if auc < threshold {
        tracing::warn!(auc, threshold, "Model drift detected: ROC-AUC below threshold");
        true
    } else {
        false
    }
}
