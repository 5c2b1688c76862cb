//! Logistic regression candidate.

use std::collections::BTreeMap;

use linfa::prelude::*;
use linfa_logistic::{FittedLogisticRegression, LogisticRegression};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::{encode, PersistedModelRef, LOGISTIC_REGRESSION};
use crate::domain::POSITIVE_LABEL;
use crate::ports::{Classifier, FittedClassifier, ModelError};

/// L2-regularized logistic regression.
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticRegressionClassifier {
    pub max_iterations: u64,
    /// L2 penalty strength
    pub alpha: f64,
}

impl Default for LogisticRegressionClassifier {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            alpha: 1.0,
        }
    }
}

impl Classifier for LogisticRegressionClassifier {
    fn name(&self) -> &str {
        LOGISTIC_REGRESSION
    }

    fn params(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("model_name".to_string(), LOGISTIC_REGRESSION.to_string()),
            ("max_iterations".to_string(), self.max_iterations.to_string()),
            ("alpha".to_string(), self.alpha.to_string()),
        ])
    }

    fn fit(
        &self,
        x: &Array2<f64>,
        y: &Array1<usize>,
    ) -> Result<Box<dyn FittedClassifier>, ModelError> {
        let dataset = Dataset::new(x.clone(), y.clone());
        let inner = LogisticRegression::default()
            .alpha(self.alpha)
            .max_iterations(self.max_iterations)
            .fit(&dataset)
            .map_err(|e| ModelError::Fit(e.to_string()))?;

        tracing::debug!(
            intercept = inner.intercept(),
            n_features = x.ncols(),
            "Fitted logistic regression"
        );

        Ok(Box::new(LogisticModel { inner }))
    }
}

/// Fitted logistic regression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    inner: FittedLogisticRegression<f64, usize>,
}

impl FittedClassifier for LogisticModel {
    fn kind(&self) -> &'static str {
        LOGISTIC_REGRESSION
    }

    fn n_features(&self) -> usize {
        self.inner.params().len()
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        let expected = self.n_features();
        if x.ncols() != expected {
            return Err(ModelError::FeatureMismatch {
                expected,
                got: x.ncols(),
            });
        }

        // linfa reports the probability of whichever class it chose as positive
        let probabilities = self.inner.predict_probabilities(x);
        if self.inner.labels().pos.class == POSITIVE_LABEL {
            Ok(probabilities)
        } else {
            Ok(probabilities.mapv(|p| 1.0 - p))
        }
    }

    fn to_blob(&self) -> Result<Vec<u8>, ModelError> {
        encode(PersistedModelRef::LogisticRegression(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metrics::roc_auc;
    use crate::test_support::scaled_synthetic;

    #[test]
    fn test_fit_separates_synthetic_classes() {
        let (x, y) = scaled_synthetic(200, 3);
        let fitted = LogisticRegressionClassifier::default()
            .fit(&x, &y)
            .expect("Should fit");

        let probs = fitted.predict_proba(&x).expect("Should predict");
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));

        let auc = roc_auc(y.as_slice().expect("Contiguous"), probs.as_slice().expect("Contiguous"))
            .expect("Defined");
        assert!(auc > 0.85, "auc={auc}");
    }

    #[test]
    fn test_fit_rejects_single_class() {
        let (x, _) = scaled_synthetic(20, 3);
        let y = Array1::from_elem(20, 1usize);
        assert!(LogisticRegressionClassifier::default().fit(&x, &y).is_err());
    }

    #[test]
    fn test_feature_mismatch() {
        let (x, y) = scaled_synthetic(60, 5);
        let fitted = LogisticRegressionClassifier::default()
            .fit(&x, &y)
            .expect("Should fit");
        let narrow = Array2::<f64>::zeros((1, 4));
        assert!(matches!(
            fitted.predict_proba(&narrow),
            Err(ModelError::FeatureMismatch { expected: 13, got: 4 })
        ));
    }
}
