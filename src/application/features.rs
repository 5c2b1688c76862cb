//! Feature engineering: Stratified split and training-only scaling.

use ndarray::{Array1, Array2};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::domain::{Dataset, ScalerError, StandardScaler, NUM_FEATURES};

/// Parameters of the train/test split.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitConfig {
    /// Share of each class held out for testing
    pub test_ratio: f64,
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_ratio: 0.2,
            seed: 42,
        }
    }
}

/// Error type for feature preparation.
#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    #[error("Test ratio must be in (0, 1), got {0}")]
    InvalidRatio(f64),

    #[error("Split left {partition} partition without both classes")]
    DegenerateSplit { partition: &'static str },

    #[error(transparent)]
    Scaler(#[from] ScalerError),
}

/// Scaled train/test partitions plus the scaler fitted on the training rows.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array1<usize>,
    pub y_test: Array1<usize>,
    pub scaler: StandardScaler,
}

/// Stratified row indices: `(train, test)`.
///
/// Each class is shuffled independently and `round(n_class * test_ratio)`
/// of its rows go to the test partition. Both index lists are sorted.
#[must_use]
pub fn split_indices(labels: &[u8], config: &SplitConfig) -> (Vec<usize>, Vec<usize>) {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for class in [0u8, 1] {
        let mut members: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, &label)| label == class)
            .map(|(i, _)| i)
            .collect();
        members.shuffle(&mut rng);

        let n_test = (members.len() as f64 * config.test_ratio).round() as usize;
        test.extend_from_slice(&members[..n_test]);
        train.extend_from_slice(&members[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    (train, test)
}

fn to_matrix(dataset: &Dataset, rows: &[usize]) -> (Array2<f64>, Array1<usize>) {
    let records = dataset.records();
    let mut x = Array2::<f64>::zeros((rows.len(), NUM_FEATURES));
    let mut y = Array1::<usize>::zeros(rows.len());

    for (i, &row) in rows.iter().enumerate() {
        let record = &records[row];
        for (j, value) in record.features.to_array().into_iter().enumerate() {
            x[[i, j]] = value;
        }
        y[i] = usize::from(record.label);
    }
    (x, y)
}

fn has_both_classes(y: &Array1<usize>) -> bool {
    y.iter().any(|&l| l == 0) && y.iter().any(|&l| l == 1)
}

/// Split, fit the scaler on the training partition, and scale both.
///
/// # Errors
/// Returns `FeatureError` if the ratio is out of range or either partition
/// lacks one of the classes.
pub fn prepare_features(dataset: &Dataset, config: &SplitConfig) -> Result<FeatureSet, FeatureError> {
    if !(config.test_ratio > 0.0 && config.test_ratio < 1.0) {
        return Err(FeatureError::InvalidRatio(config.test_ratio));
    }

    let (train_rows, test_rows) = split_indices(&dataset.labels(), config);
    let (x_train_raw, y_train) = to_matrix(dataset, &train_rows);
    let (x_test_raw, y_test) = to_matrix(dataset, &test_rows);

    if !has_both_classes(&y_train) {
        return Err(FeatureError::DegenerateSplit { partition: "train" });
    }
    if !has_both_classes(&y_test) {
        return Err(FeatureError::DegenerateSplit { partition: "test" });
    }

    let scaler = StandardScaler::fit(x_train_raw.view())?;
    let x_train = scaler.transform(x_train_raw.view())?;
    let x_test = scaler.transform(x_test_raw.view())?;

    tracing::info!(
        train = train_rows.len(),
        test = test_rows.len(),
        seed = config.seed,
        "Prepared features"
    );

    Ok(FeatureSet {
        x_train,
        x_test,
        y_train,
        y_test,
        scaler,
    })
}
