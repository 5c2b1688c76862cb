//! Random forest candidate: bagged linfa decision trees.
//!
//! Each tree sees a bootstrap sample of the rows and a random subset of
//! the feature columns. The positive-class probability is the share of
//! trees voting for the positive label.

use std::collections::BTreeMap;

use linfa::prelude::*;
use linfa_trees::DecisionTree;
use ndarray::{Array1, Array2, Axis};
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::{encode, PersistedModelRef, RANDOM_FOREST};
use crate::domain::POSITIVE_LABEL;
use crate::ports::{Classifier, FittedClassifier, ModelError};

/// Bagged decision-tree ensemble.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomForestClassifier {
    pub n_trees: usize,
    /// `None` grows trees until leaves are pure
    pub max_depth: Option<usize>,
    /// Share of feature columns each tree may split on, in `(0, 1]`
    pub feature_fraction: f64,
    pub seed: u64,
}

impl Default for RandomForestClassifier {
    fn default() -> Self {
        Self {
            n_trees: 200,
            max_depth: None,
            feature_fraction: 0.7,
            seed: 42,
        }
    }
}

impl RandomForestClassifier {
    fn features_per_tree(&self, n_features: usize) -> usize {
        let k = (self.feature_fraction * n_features as f64).ceil() as usize;
        k.clamp(1, n_features)
    }
}

impl Classifier for RandomForestClassifier {
    fn name(&self) -> &str {
        RANDOM_FOREST
    }

    fn params(&self) -> BTreeMap<String, String> {
        let depth = self
            .max_depth
            .map_or_else(|| "none".to_string(), |d| d.to_string());
        BTreeMap::from([
            ("model_name".to_string(), RANDOM_FOREST.to_string()),
            ("n_estimators".to_string(), self.n_trees.to_string()),
            ("max_depth".to_string(), depth),
            ("feature_fraction".to_string(), self.feature_fraction.to_string()),
            ("random_state".to_string(), self.seed.to_string()),
        ])
    }

    fn fit(
        &self,
        x: &Array2<f64>,
        y: &Array1<usize>,
    ) -> Result<Box<dyn FittedClassifier>, ModelError> {
        let (n_rows, n_features) = x.dim();
        if n_rows == 0 || n_features == 0 || self.n_trees == 0 {
            return Err(ModelError::Fit(format!(
                "cannot grow {} trees on a {n_rows}x{n_features} matrix",
                self.n_trees
            )));
        }
        if y.len() != n_rows {
            return Err(ModelError::Fit(format!(
                "{} labels for {n_rows} rows",
                y.len()
            )));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let k = self.features_per_tree(n_features);
        let mut trees = Vec::with_capacity(self.n_trees);

        for _ in 0..self.n_trees {
            let rows: Vec<usize> = (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect();
            let mut features = index::sample(&mut rng, n_features, k).into_vec();
            features.sort_unstable();

            let sample_x = x.select(Axis(0), &rows).select(Axis(1), &features);
            let sample_y = y.select(Axis(0), &rows);

            let tree = DecisionTree::params()
                .max_depth(self.max_depth)
                .fit(&Dataset::new(sample_x, sample_y))
                .map_err(|e| ModelError::Fit(e.to_string()))?;

            trees.push(ForestTree { features, tree });
        }

        tracing::debug!(trees = trees.len(), features_per_tree = k, "Fitted random forest");

        Ok(Box::new(ForestModel { n_features, trees }))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ForestTree {
    /// Column indices this tree was trained on
    features: Vec<usize>,
    tree: DecisionTree<f64, usize>,
}

/// Fitted random forest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestModel {
    n_features: usize,
    trees: Vec<ForestTree>,
}

impl ForestModel {
    /// Check a deserialized forest before it is scored.
    ///
    /// # Errors
    /// Returns `ModelError::Serialization` if the forest has no trees or a
    /// tree references a column outside the input width.
    pub(super) fn validate(&self) -> Result<(), ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::Serialization("forest has no trees".to_string()));
        }
        for (i, member) in self.trees.iter().enumerate() {
            if member.features.is_empty() {
                return Err(ModelError::Serialization(format!("tree {i} has no features")));
            }
            if let Some(&column) = member.features.iter().find(|&&c| c >= self.n_features) {
                return Err(ModelError::Serialization(format!(
                    "tree {i} uses column {column} of {}",
                    self.n_features
                )));
            }
        }
        Ok(())
    }
}

impl FittedClassifier for ForestModel {
    fn kind(&self) -> &'static str {
        RANDOM_FOREST
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        if x.ncols() != self.n_features {
            return Err(ModelError::FeatureMismatch {
                expected: self.n_features,
                got: x.ncols(),
            });
        }
        if self.trees.is_empty() {
            return Err(ModelError::EmptyOutput);
        }

        let mut votes = Array1::<f64>::zeros(x.nrows());
        for member in &self.trees {
            let view = x.select(Axis(1), &member.features);
            let predicted: Array1<usize> = member.tree.predict(&view);
            votes.zip_mut_with(&predicted, |v, &label| {
                if label == POSITIVE_LABEL {
                    *v += 1.0;
                }
            });
        }

        Ok(votes / self.trees.len() as f64)
    }

    fn to_blob(&self) -> Result<Vec<u8>, ModelError> {
        encode(PersistedModelRef::RandomForest(self))
    }
}
