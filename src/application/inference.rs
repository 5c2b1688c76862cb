//! Inference service: Serves predictions from the persisted model.
//!
//! The model and scaler are loaded once at startup and never mutated, so a
//! single service can be shared across request handlers behind an `Arc`.

use ndarray::Array2;

use crate::adapters::models::load_model;
use crate::adapters::ArtifactError;
use crate::domain::{PatientFeatures, Prediction, ScalerError, StandardScaler, NUM_FEATURES};
use crate::ports::{ArtifactStore, FittedClassifier, ModelError};
use crate::{HeartwatchError, Result};

/// Read-only prediction service.
pub struct InferenceService {
    model: Box<dyn FittedClassifier>,
    scaler: StandardScaler,
    model_name: String,
}

impl InferenceService {
    /// Build a service from an in-memory model and scaler.
    ///
    /// # Errors
    /// Returns error if the scaler or model width is not the canonical
    /// feature count.
    pub fn new(
        model: Box<dyn FittedClassifier>,
        scaler: StandardScaler,
        model_name: impl Into<String>,
    ) -> Result<Self> {
        if scaler.n_features() != NUM_FEATURES {
            return Err(ScalerError::DimensionMismatch {
                expected: NUM_FEATURES,
                got: scaler.n_features(),
            }
            .into());
        }
        if model.n_features() != NUM_FEATURES {
            return Err(ModelError::FeatureMismatch {
                expected: NUM_FEATURES,
                got: model.n_features(),
            }
            .into());
        }

        Ok(Self {
            model,
            scaler,
            model_name: model_name.into(),
        })
    }

    /// Load the persisted model and scaler.
    ///
    /// # Errors
    /// Returns error if the artifacts are missing, fail verification, or
    /// cannot be decoded.
    pub fn load<A>(store: &A) -> Result<Self>
    where
        A: ArtifactStore,
        A::Error: Into<ArtifactError>,
    {
        let bundle = store
            .load()
            .map_err(|e| HeartwatchError::Artifact(e.into()))?;
        let model = load_model(&bundle.model_blob)?;

        tracing::info!(
            model = %bundle.model_name,
            kind = model.kind(),
            "Loaded inference artifacts"
        );

        Self::new(model, bundle.scaler, bundle.model_name)
    }

    /// Candidate name of the served model.
    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Scale one patient in canonical order and score it.
    ///
    /// # Errors
    /// Returns error if the model produces no usable probability.
    pub fn predict(&self, patient: &PatientFeatures) -> Result<Prediction> {
        let scaled = self.scaler.transform_row(&patient.to_array())?;
        let x = Array2::from_shape_vec((1, NUM_FEATURES), scaled).map_err(|_| {
            ModelError::FeatureMismatch {
                expected: NUM_FEATURES,
                got: self.scaler.n_features(),
            }
        })?;

        let probability = self
            .model
            .predict_proba(&x)?
            .first()
            .copied()
            .filter(|p| p.is_finite())
            .ok_or(ModelError::EmptyOutput)?;

        let prediction = Prediction::from_probability(probability);
        tracing::debug!(
            prediction = prediction.prediction,
            confidence = prediction.confidence,
            "Scored patient"
        );
        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::models::LogisticRegressionClassifier;
    use crate::adapters::FsArtifactStore;
    use crate::application::{prepare_features, SplitConfig};
    use crate::ports::{ArtifactBundle, Classifier};
    use crate::test_support::synthetic_dataset;

    fn documented_patient() -> PatientFeatures {
        PatientFeatures {
            age: 60.0,
            sex: 1.0,
            cp: 3.0,
            trestbps: 140.0,
            chol: 289.0,
            fbs: 0.0,
            restecg: 0.0,
            thalach: 150.0,
            exang: 0.0,
            oldpeak: 1.2,
            slope: 2.0,
            ca: 0.0,
            thal: 2.0,
        }
    }

    #[test]
    fn test_persisted_pair_matches_in_memory() {
        let dataset = synthetic_dataset(120, 9);
        let features = prepare_features(&dataset, &SplitConfig::default()).expect("Should prepare");
        let fitted = LogisticRegressionClassifier::default()
            .fit(&features.x_train, &features.y_train)
            .expect("Should fit");
        let blob = fitted.to_blob().expect("Should serialize");

        let in_memory = InferenceService::new(fitted, features.scaler.clone(), "LogisticRegression")
            .expect("Should build");

        let dir = tempfile::tempdir().expect("Should create tempdir");
        let store = FsArtifactStore::new(dir.path());
        store
            .save(&ArtifactBundle {
                model_name: "LogisticRegression".to_string(),
                model_blob: blob,
                scaler: features.scaler,
            })
            .expect("Should save");
        let loaded = InferenceService::load(&store).expect("Should load");

        let patient = documented_patient();
        let a = in_memory.predict(&patient).expect("Should predict");
        let b = loaded.predict(&patient).expect("Should predict");

        assert_eq!(a, b);
        assert!((0.0..=1.0).contains(&b.confidence));
        assert_eq!(b.prediction, u8::from(b.confidence > 0.5));
        assert_eq!(loaded.model_name(), "LogisticRegression");
    }

    #[test]
    fn test_load_fails_without_artifacts() {
        let dir = tempfile::tempdir().expect("Should create tempdir");
        let store = FsArtifactStore::new(dir.path());
        assert!(matches!(
            InferenceService::load(&store),
            Err(HeartwatchError::Artifact(ArtifactError::Missing(_)))
        ));
    }

    #[test]
    fn test_rejects_narrow_scaler() {
        let dataset = synthetic_dataset(40, 2);
        let features = prepare_features(&dataset, &SplitConfig::default()).expect("Should prepare");
        let fitted = LogisticRegressionClassifier::default()
            .fit(&features.x_train, &features.y_train)
            .expect("Should fit");

        let narrow = StandardScaler::fit(features.x_train.slice(ndarray::s![.., ..3]))
            .expect("Should fit scaler");
        assert!(matches!(
            InferenceService::new(fitted, narrow, "x"),
            Err(HeartwatchError::Scaler(_))
        ));
    }

    #[test]
    fn test_load_rejects_model_of_wrong_width() {
        let dataset = synthetic_dataset(80, 4);
        let features = prepare_features(&dataset, &SplitConfig::default()).expect("Should prepare");
        let narrow_x = features.x_train.slice(ndarray::s![.., ..12]).to_owned();
        let blob = LogisticRegressionClassifier::default()
            .fit(&narrow_x, &features.y_train)
            .expect("Should fit")
            .to_blob()
            .expect("Should serialize");

        let dir = tempfile::tempdir().expect("Should create tempdir");
        let store = FsArtifactStore::new(dir.path());
        store
            .save(&ArtifactBundle {
                model_name: "LogisticRegression".to_string(),
                model_blob: blob,
                scaler: features.scaler,
            })
            .expect("Should save");

        assert!(matches!(
            InferenceService::load(&store),
            Err(HeartwatchError::Model(ModelError::FeatureMismatch {
                expected: 13,
                got: 12
            }))
        ));
    }
}
