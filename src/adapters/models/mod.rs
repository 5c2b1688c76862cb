//! linfa adapter: Candidate classifiers implementing the `Classifier` port.
//!
//! Two candidates are trained, in this order:
//! - `LogisticRegression` (linfa-logistic)
//! - `RandomForest` (bagged linfa-trees decision trees)
//!
//! Fitted models serialize to JSON tagged with their family, so the
//! serving process can restore either kind from the same opaque blob.

mod forest;
mod logistic;

use serde::{Deserialize, Serialize};

use crate::ports::{Classifier, FittedClassifier, ModelError};

pub use forest::{ForestModel, RandomForestClassifier};
pub use logistic::{LogisticModel, LogisticRegressionClassifier};

/// Name of the logistic regression candidate.
pub const LOGISTIC_REGRESSION: &str = "LogisticRegression";

/// Name of the random forest candidate.
pub const RANDOM_FOREST: &str = "RandomForest";

/// The candidate list used by the training pipeline, in iteration order.
#[must_use]
pub fn default_candidates() -> Vec<Box<dyn Classifier>> {
    vec![
        Box::new(LogisticRegressionClassifier::default()),
        Box::new(RandomForestClassifier::default()),
    ]
}

#[derive(Serialize)]
#[serde(tag = "kind", content = "model")]
enum PersistedModelRef<'a> {
    LogisticRegression(&'a LogisticModel),
    RandomForest(&'a ForestModel),
}

#[derive(Deserialize)]
#[serde(tag = "kind", content = "model")]
enum PersistedModel {
    LogisticRegression(LogisticModel),
    RandomForest(ForestModel),
}

fn encode(model: PersistedModelRef<'_>) -> Result<Vec<u8>, ModelError> {
    serde_json::to_vec(&model).map_err(|e| ModelError::Serialization(e.to_string()))
}

/// Restore a fitted model from a blob produced by [`FittedClassifier::to_blob`].
///
/// # Errors
/// Returns `ModelError::Serialization` if the blob is not a known model or
/// is structurally inconsistent.
pub fn load_model(blob: &[u8]) -> Result<Box<dyn FittedClassifier>, ModelError> {
    let persisted: PersistedModel =
        serde_json::from_slice(blob).map_err(|e| ModelError::Serialization(e.to_string()))?;

    Ok(match persisted {
        PersistedModel::LogisticRegression(model) => Box::new(model),
        PersistedModel::RandomForest(model) => {
            model.validate()?;
            Box::new(model)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::scaled_synthetic;

    #[test]
    fn test_default_candidate_order() {
        let names: Vec<String> = default_candidates()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(names, vec![LOGISTIC_REGRESSION, RANDOM_FOREST]);
    }

    #[test]
    fn test_blob_roundtrip_preserves_probabilities() {
        let (x, y) = scaled_synthetic(120, 11);
        let fast_forest = RandomForestClassifier {
            n_trees: 15,
            ..RandomForestClassifier::default()
        };
        let candidates: Vec<Box<dyn Classifier>> = vec![
            Box::new(LogisticRegressionClassifier::default()),
            Box::new(fast_forest),
        ];

        for candidate in candidates {
            let fitted = candidate.fit(&x, &y).expect("Should fit");
            let before = fitted.predict_proba(&x).expect("Should predict");

            let blob = fitted.to_blob().expect("Should serialize");
            let restored = load_model(&blob).expect("Should restore");
            let after = restored.predict_proba(&x).expect("Should predict");

            assert_eq!(restored.kind(), fitted.kind());
            assert_eq!(before, after, "{} changed after round-trip", candidate.name());
        }
    }

    #[test]
    fn test_load_model_rejects_garbage() {
        assert!(load_model(b"not a model").is_err());
        assert!(load_model(br#"{"kind":"Svm","model":{}}"#).is_err());
    }
}
