//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases of the application:
//! - feature preparation (split + scaling)
//! - candidate training and selection
//! - drift monitoring
//! - online inference

mod features;
mod inference;
mod monitoring;
mod training;

pub use features::{prepare_features, split_indices, FeatureError, FeatureSet, SplitConfig};
pub use inference::InferenceService;
pub use monitoring::{check_model_drift, DEFAULT_DRIFT_THRESHOLD};
pub use training::{
    cross_validate, select_best, stratified_folds, CandidateReport, TrainingReport,
    TrainingService, DEFAULT_CV_FOLDS,
};
