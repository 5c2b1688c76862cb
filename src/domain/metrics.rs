//! Binary classification metrics.
//!
//! Labels use 1 = disease present, 0 = absent. Hard predictions use
//! [`DECISION_THRESHOLD`](super::DECISION_THRESHOLD).

use serde::{Deserialize, Serialize};

use super::prediction::{DECISION_THRESHOLD, POSITIVE_LABEL};

/// Held-out evaluation metrics for one fitted model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub roc_auc: f64,
}

impl ClassificationMetrics {
    /// Compute metrics from true labels and positive-class probabilities.
    ///
    /// Returns `None` when AUC is undefined (only one class present) or
    /// the slices differ in length.
    #[must_use]
    pub fn compute(labels: &[usize], probabilities: &[f64]) -> Option<Self> {
        let roc_auc = roc_auc(labels, probabilities)?;

        let mut tp = 0usize;
        let mut fp = 0usize;
        let mut tn = 0usize;
        let mut fn_count = 0usize;
        for (&label, &p) in labels.iter().zip(probabilities) {
            let predicted = p > DECISION_THRESHOLD;
            let actual = label == POSITIVE_LABEL;
            match (predicted, actual) {
                (true, true) => tp += 1,
                (true, false) => fp += 1,
                (false, false) => tn += 1,
                (false, true) => fn_count += 1,
            }
        }

        let total = (tp + fp + tn + fn_count) as f64;
        let accuracy = (tp + tn) as f64 / total;
        let precision = if tp + fp > 0 {
            tp as f64 / (tp + fp) as f64
        } else {
            0.0
        };
        let recall = if tp + fn_count > 0 {
            tp as f64 / (tp + fn_count) as f64
        } else {
            0.0
        };

        Some(Self {
            accuracy,
            precision,
            recall,
            roc_auc,
        })
    }
}

impl std::fmt::Display for ClassificationMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "auc={:.4} acc={:.4} prec={:.4} rec={:.4}",
            self.roc_auc, self.accuracy, self.precision, self.recall
        )
    }
}

/// Area under the ROC curve via the rank-sum (Mann-Whitney U) statistic.
///
/// Tied scores receive their average rank. Returns `None` unless both
/// classes are present.
#[must_use]
pub fn roc_auc(labels: &[usize], scores: &[f64]) -> Option<f64> {
    let n_pos = labels.iter().filter(|&&l| l == POSITIVE_LABEL).count();
    let n_neg = labels.len() - n_pos;
    if n_pos == 0 || n_neg == 0 || labels.len() != scores.len() {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut positive_rank_sum = 0.0;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // Ranks are 1-based; ties share the mean of ranks i+1..=j+1
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            if labels[idx] == POSITIVE_LABEL {
                positive_rank_sum += avg_rank;
            }
        }
        i = j + 1;
    }

    let n_pos = n_pos as f64;
    let n_neg = n_neg as f64;
    Some((positive_rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg))
}

/// Mean and population standard deviation. `(NaN, NaN)` for an empty slice.
#[must_use]
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auc_perfect_and_inverted() {
        let labels = vec![0, 0, 1, 1];
        assert_eq!(roc_auc(&labels, &[0.1, 0.2, 0.8, 0.9]), Some(1.0));
        assert_eq!(roc_auc(&labels, &[0.9, 0.8, 0.2, 0.1]), Some(0.0));
    }

    #[test]
    fn test_auc_with_ties() {
        // All scores equal: every pair is a tie
        let labels = vec![0, 1, 0, 1];
        assert_eq!(roc_auc(&labels, &[0.5, 0.5, 0.5, 0.5]), Some(0.5));

        // One positive above all negatives, one tied with a negative
        let labels = vec![0, 0, 1, 1];
        let auc = roc_auc(&labels, &[0.1, 0.4, 0.4, 0.9]).expect("Defined");
        assert!((auc - 0.875).abs() < 1e-12);
    }

    #[test]
    fn test_auc_undefined_for_single_class() {
        assert_eq!(roc_auc(&[1, 1, 1], &[0.2, 0.4, 0.9]), None);
        assert_eq!(roc_auc(&[], &[]), None);
    }

    #[test]
    fn test_metrics_mixed() {
        // 3 TP, 1 FP, 2 TN, 1 FN
        let labels = vec![1, 1, 1, 0, 0, 0, 1];
        let probs = vec![0.9, 0.8, 0.7, 0.6, 0.2, 0.1, 0.3];
        let m = ClassificationMetrics::compute(&labels, &probs).expect("Defined");

        assert!((m.accuracy - 5.0 / 7.0).abs() < 1e-9);
        assert!((m.precision - 3.0 / 4.0).abs() < 1e-9);
        assert!((m.recall - 3.0 / 4.0).abs() < 1e-9);
        assert!(m.roc_auc > 0.5 && m.roc_auc <= 1.0);
    }

    #[test]
    fn test_metrics_probability_at_threshold_is_negative() {
        let m = ClassificationMetrics::compute(&[0, 1], &[0.5, 0.5]).expect("Defined");
        assert!((m.accuracy - 0.5).abs() < 1e-9);
        assert!(m.precision.abs() < 1e-9);
        assert!(m.recall.abs() < 1e-9);
    }

    #[test]
    fn test_mean_std() {
        let (mean, std) = mean_std(&[0.8, 0.9, 1.0]);
        assert!((mean - 0.9).abs() < 1e-12);
        assert!((std - (0.02f64 / 3.0).sqrt()).abs() < 1e-12);
        assert!(mean_std(&[]).0.is_nan());
    }
}
