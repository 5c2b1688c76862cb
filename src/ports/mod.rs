//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and external systems (ML library, experiment
//! tracker, artifact storage).

mod artifacts;
mod classifier;
mod tracker;

pub use artifacts::{ArtifactBundle, ArtifactStore};
pub use classifier::{Classifier, FittedClassifier, ModelError};
pub use tracker::{ExperimentTracker, TrackedRun};
