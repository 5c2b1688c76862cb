//! Artifact store port: Trait for persisting the served model and scaler.

use crate::domain::StandardScaler;

/// A model blob together with the scaler it was trained behind.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactBundle {
    /// Candidate name of the model, e.g. `"RandomForest"`
    pub model_name: String,
    /// Opaque serialized model
    pub model_blob: Vec<u8>,
    pub scaler: StandardScaler,
}

/// Trait for durable artifact storage.
///
/// A store holds at most one bundle; saving overwrites the previous one.
pub trait ArtifactStore: Send + Sync {
    /// Error type for store operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist a bundle, replacing any existing one.
    ///
    /// # Errors
    /// Returns error if the bundle cannot be written.
    fn save(&self, bundle: &ArtifactBundle) -> Result<(), Self::Error>;

    /// Load the current bundle.
    ///
    /// # Errors
    /// Returns error if no bundle exists or it is malformed.
    fn load(&self) -> Result<ArtifactBundle, Self::Error>;
}
