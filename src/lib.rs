//! # Heartwatch
//!
//! Heart disease risk model: offline training pipeline and online prediction API.
//!
//! This crate provides:
//! - Loading and cleaning of the UCI Cleveland heart-disease dataset
//! - Stratified train/test split with a training-only standard scaler
//! - Candidate model training (logistic regression, random forest) with
//!   k-fold cross-validation and held-out evaluation
//! - Experiment tracking and artifact persistence for the best model
//! - A threshold-based drift guard
//! - An HTTP prediction service over the persisted artifacts
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (patient features, scaler, predictions, metrics)
//! - `ports`: Trait definitions for classifiers, experiment tracking and artifact storage
//! - `adapters`: Concrete implementations (CSV loader, linfa models, filesystem, SQLite)
//! - `application`: Feature engineering, training/selection, drift monitoring, inference
//! - `api`: HTTP surface (axum)

pub mod adapters;
pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod test_support;

pub use domain::{Dataset, PatientFeatures, Prediction, Record, StandardScaler, FEATURE_NAMES};

/// Result type for Heartwatch operations
pub type Result<T> = std::result::Result<T, HeartwatchError>;

/// Main error type for Heartwatch
#[derive(Debug, thiserror::Error)]
pub enum HeartwatchError {
    #[error("Invalid source data: {0}")]
    Data(#[from] adapters::DataError),

    #[error("Feature preparation failed: {0}")]
    Features(#[from] application::FeatureError),

    #[error("Scaler error: {0}")]
    Scaler(#[from] domain::ScalerError),

    #[error("Model error: {0}")]
    Model(#[from] ports::ModelError),

    #[error("Artifact store error: {0}")]
    Artifact(#[from] adapters::ArtifactError),

    #[error("Experiment tracking error: {0}")]
    Tracker(#[from] adapters::TrackerError),
}
