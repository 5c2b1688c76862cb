//! Prediction result types.

use serde::{Deserialize, Serialize};

/// Class label meaning "disease present".
pub const POSITIVE_LABEL: usize = 1;

/// Probability above which a prediction is positive. Not calibrated.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Result of a single prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Binary prediction (0 = no disease, 1 = disease present)
    pub prediction: u8,

    /// Model probability of the positive class (0.0 to 1.0)
    pub confidence: f64,
}

impl Prediction {
    /// Create a prediction from the positive-class probability.
    ///
    /// `prediction` is 1 iff the probability is strictly above
    /// [`DECISION_THRESHOLD`].
    #[must_use]
    pub fn from_probability(probability: f64) -> Self {
        let confidence = probability.clamp(0.0, 1.0);
        Self {
            prediction: u8::from(confidence > DECISION_THRESHOLD),
            confidence,
        }
    }

    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.prediction == 1
    }
}
