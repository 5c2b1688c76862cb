//! Per-attribute standardization fitted on training data.

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Errors raised when fitting or applying a scaler.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScalerError {
    #[error("Cannot fit scaler on an empty matrix")]
    Empty,

    #[error("Feature count mismatch: scaler has {expected}, input has {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// Standard scaler: `(x - mean) / std` per column.
///
/// Uses the population standard deviation. Columns with zero variance are
/// left centred but unscaled. Immutable once fitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit the scaler on the rows of `x`.
    ///
    /// # Errors
    /// Returns `ScalerError::Empty` if `x` has no rows or no columns.
    pub fn fit(x: ArrayView2<'_, f64>) -> Result<Self, ScalerError> {
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(ScalerError::Empty);
        }

        let mean = x.mean_axis(Axis(0)).ok_or(ScalerError::Empty)?;
        let scale = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > 0.0 && s.is_finite() { s } else { 1.0 });

        Ok(Self {
            mean: mean.to_vec(),
            scale: scale.to_vec(),
        })
    }

    /// Number of features this scaler was fitted on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    #[must_use]
    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    #[must_use]
    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    /// Transform every row of `x`.
    ///
    /// # Errors
    /// Returns `ScalerError::DimensionMismatch` if the column count differs.
    pub fn transform(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, ScalerError> {
        self.check_width(x.ncols())?;
        let mean = ArrayView1::from(&self.mean[..]);
        let scale = ArrayView1::from(&self.scale[..]);
        Ok((&x - &mean) / &scale)
    }

    /// Transform a single row.
    ///
    /// # Errors
    /// Returns `ScalerError::DimensionMismatch` if the length differs.
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>, ScalerError> {
        self.check_width(row.len())?;
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| (x - m) / s)
            .collect())
    }

    fn check_width(&self, got: usize) -> Result<(), ScalerError> {
        if got != self.n_features() {
            return Err(ScalerError::DimensionMismatch {
                expected: self.n_features(),
                got,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_fit_computes_population_statistics() {
        let x = array![[1.0, 10.0], [3.0, 10.0]];
        let scaler = StandardScaler::fit(x.view()).expect("Should fit");

        assert_eq!(scaler.mean(), &[2.0, 10.0]);
        assert!((scaler.scale()[0] - 1.0).abs() < 1e-12);
        // Constant column keeps unit scale
        assert!((scaler.scale()[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_transform_standardizes_training_data() {
        let x = array![[1.0, 2.0], [2.0, 4.0], [3.0, 9.0], [6.0, 1.0]];
        let scaler = StandardScaler::fit(x.view()).expect("Should fit");
        let z = scaler.transform(x.view()).expect("Should transform");

        for col in z.columns() {
            let mean = col.mean().expect("Non-empty");
            let std = col.std(0.0);
            assert!(mean.abs() < 1e-9);
            assert!((std - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_transform_row_matches_matrix_transform() {
        let x = array![[1.0, 2.0], [2.0, 4.0], [3.0, 9.0]];
        let scaler = StandardScaler::fit(x.view()).expect("Should fit");
        let z = scaler.transform(x.view()).expect("Should transform");
        let row = scaler.transform_row(&[3.0, 9.0]).expect("Should transform");

        assert!((row[0] - z[[2, 0]]).abs() < 1e-12);
        assert!((row[1] - z[[2, 1]]).abs() < 1e-12);
    }

    #[test]
    fn test_dimension_mismatch() {
        let x = array![[1.0, 2.0], [2.0, 4.0]];
        let scaler = StandardScaler::fit(x.view()).expect("Should fit");
        assert_eq!(
            scaler.transform_row(&[1.0]),
            Err(ScalerError::DimensionMismatch {
                expected: 2,
                got: 1
            })
        );
    }

    #[test]
    fn test_fit_rejects_empty() {
        let x = Array2::<f64>::zeros((0, 3));
        assert_eq!(StandardScaler::fit(x.view()), Err(ScalerError::Empty));
    }
}
