//! Classifier port: Trait for candidate models.
//!
//! This trait abstracts the ML library (linfa) from the training and
//! inference services.

use std::collections::BTreeMap;

use ndarray::{Array1, Array2};

/// Errors that can occur while fitting, scoring or serializing a model.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelError {
    #[error("Model fitting failed: {0}")]
    Fit(String),

    #[error("Model serialization failed: {0}")]
    Serialization(String),

    #[error("Feature count mismatch: model expects {expected}, input has {got}")]
    FeatureMismatch { expected: usize, got: usize },

    #[error("ROC-AUC undefined: {0}")]
    UndefinedAuc(String),

    #[error("Model returned no probability for the input row")]
    EmptyOutput,
}

/// An unfitted candidate model with fixed hyperparameters.
///
/// Implementations must be deterministic: fitting twice on the same data
/// yields the same model.
pub trait Classifier: Send + Sync {
    /// Stable candidate name, used as the tracker run name.
    fn name(&self) -> &str;

    /// Hyperparameters recorded alongside each run.
    fn params(&self) -> BTreeMap<String, String>;

    /// Fit on scaled features `x` and binary labels `y`.
    ///
    /// # Errors
    /// Returns `ModelError::Fit` if the underlying library rejects the data.
    fn fit(&self, x: &Array2<f64>, y: &Array1<usize>)
        -> Result<Box<dyn FittedClassifier>, ModelError>;
}

/// A fitted model producing positive-class probabilities.
pub trait FittedClassifier: Send + Sync {
    /// Model family name, e.g. `"LogisticRegression"`.
    fn kind(&self) -> &'static str;

    /// Number of input columns the model was fitted on.
    fn n_features(&self) -> usize;

    /// Probability of label 1 for each row of `x`.
    ///
    /// # Errors
    /// Returns `ModelError::FeatureMismatch` if `x` has the wrong width.
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError>;

    /// Serialize to an opaque, lossless blob.
    ///
    /// # Errors
    /// Returns `ModelError::Serialization` if encoding fails.
    fn to_blob(&self) -> Result<Vec<u8>, ModelError>;
}
