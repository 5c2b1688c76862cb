//! Domain layer: Core types and pure logic.
//!
//! Patient records, the fitted scaler, prediction results and evaluation
//! metrics. Nothing in here performs IO.

pub mod metrics;
mod patient;
mod prediction;
mod scaler;

pub use metrics::ClassificationMetrics;
pub use patient::{
    Dataset, InvalidPayload, PatientFeatures, Record, FEATURE_NAMES, NUM_FEATURES, TARGET_COLUMN,
};
pub use prediction::{Prediction, DECISION_THRESHOLD, POSITIVE_LABEL};
pub use scaler::{ScalerError, StandardScaler};
