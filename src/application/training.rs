//! Training service: Cross-validates, fits, evaluates and selects candidates.
//!
//! For every candidate, in order:
//! 1. Stratified k-fold cross-validation on the training partition (AUC)
//! 2. Fit on the full training partition
//! 3. Evaluate on the held-out partition
//! 4. Record the run with the experiment tracker
//!
//! The candidate with the highest held-out AUC is persisted together with
//! the scaler it was trained behind.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use super::features::{prepare_features, FeatureSet, SplitConfig};
use super::monitoring::{check_model_drift, DEFAULT_DRIFT_THRESHOLD};
use crate::adapters::models::default_candidates;
use crate::adapters::{load_and_clean, ArtifactError, TrackerError};
use crate::domain::metrics::{mean_std, roc_auc};
use crate::domain::{ClassificationMetrics, POSITIVE_LABEL};
use crate::ports::{ArtifactBundle, ArtifactStore, Classifier, ExperimentTracker, ModelError};
use crate::{HeartwatchError, Result};

/// Default number of cross-validation folds.
pub const DEFAULT_CV_FOLDS: usize = 5;

/// Seed for fold assignment.
const CV_SEED: u64 = 42;

/// Outcome for one candidate.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateReport {
    pub name: String,
    pub run_id: String,
    pub params: BTreeMap<String, String>,
    pub cv_auc_mean: f64,
    pub cv_auc_std: f64,
    pub test: ClassificationMetrics,
}

/// Outcome of a full training run.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    /// In candidate iteration order
    pub candidates: Vec<CandidateReport>,
    pub best_index: usize,
    pub drift_detected: bool,
}

impl TrainingReport {
    #[must_use]
    pub fn best(&self) -> &CandidateReport {
        &self.candidates[self.best_index]
    }
}

/// Index of the highest score. Ties keep the earliest index.
#[must_use]
pub fn select_best(scores: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &score) in scores.iter().enumerate() {
        match best {
            Some(b) if score > scores[b] => best = Some(i),
            None => best = Some(i),
            _ => {}
        }
    }
    best
}

/// Assign row indices to `k` folds, keeping class proportions.
///
/// Each class is shuffled and dealt round-robin across the folds.
#[must_use]
pub fn stratified_folds(labels: &[usize], k: usize, seed: u64) -> Vec<Vec<usize>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let n_folds = k.max(1);
    let mut folds = vec![Vec::new(); n_folds];
    let mut next = 0usize;

    for class in [0usize, POSITIVE_LABEL] {
        let mut members: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, &l)| l == class)
            .map(|(i, _)| i)
            .collect();
        members.shuffle(&mut rng);

        for idx in members {
            folds[next % n_folds].push(idx);
            next += 1;
        }
    }

    for fold in &mut folds {
        fold.sort_unstable();
    }
    folds
}

/// Per-fold validation AUC of `candidate`.
///
/// # Errors
/// Returns `ModelError` if a fold cannot be fitted or scored.
pub fn cross_validate(
    candidate: &dyn Classifier,
    x: &Array2<f64>,
    y: &Array1<usize>,
    k: usize,
    seed: u64,
) -> std::result::Result<Vec<f64>, ModelError> {
    let labels = y.to_vec();
    let folds = stratified_folds(&labels, k, seed);
    let mut scores = Vec::with_capacity(folds.len());

    for (fold_idx, validation) in folds.iter().enumerate() {
        let train: Vec<usize> = folds
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != fold_idx)
            .flat_map(|(_, f)| f.iter().copied())
            .collect();

        let fitted = candidate.fit(&x.select(Axis(0), &train), &y.select(Axis(0), &train))?;
        let probs = fitted.predict_proba(&x.select(Axis(0), validation))?;
        let truth: Vec<usize> = validation.iter().map(|&i| labels[i]).collect();

        let auc = roc_auc(&truth, &probs.to_vec()).ok_or_else(|| {
            ModelError::UndefinedAuc(format!("fold {fold_idx} of {} has one class", candidate.name()))
        })?;
        scores.push(auc);
    }

    Ok(scores)
}

/// Service running the offline training pipeline.
pub struct TrainingService<T, A>
where
    T: ExperimentTracker,
    A: ArtifactStore,
{
    tracker: Arc<T>,
    artifacts: Arc<A>,
    candidates: Vec<Box<dyn Classifier>>,
    cv_folds: usize,
    drift_threshold: f64,
}

impl<T, A> TrainingService<T, A>
where
    T: ExperimentTracker,
    A: ArtifactStore,
    T::Error: Into<TrackerError>,
    A::Error: Into<ArtifactError>,
{
    /// Create a service with the default candidates.
    pub fn new(tracker: Arc<T>, artifacts: Arc<A>) -> Self {
        Self {
            tracker,
            artifacts,
            candidates: default_candidates(),
            cv_folds: DEFAULT_CV_FOLDS,
            drift_threshold: DEFAULT_DRIFT_THRESHOLD,
        }
    }

    #[must_use]
    pub fn with_candidates(mut self, candidates: Vec<Box<dyn Classifier>>) -> Self {
        self.candidates = candidates;
        self
    }

    #[must_use]
    pub fn with_cv_folds(mut self, folds: usize) -> Self {
        self.cv_folds = folds;
        self
    }

    #[must_use]
    pub fn with_drift_threshold(mut self, threshold: f64) -> Self {
        self.drift_threshold = threshold;
        self
    }

    /// Load and clean the CSV at `path`, split and scale it, then [`run`](Self::run).
    ///
    /// # Errors
    /// Returns `HeartwatchError::Data` if the file cannot be loaded,
    /// `HeartwatchError::Features` if the split is degenerate, and any
    /// error of [`run`](Self::run).
    pub fn run_on_csv<P: AsRef<Path>>(&self, path: P, split: &SplitConfig) -> Result<TrainingReport> {
        let dataset = load_and_clean(path.as_ref())?;
        tracing::info!(path = %path.as_ref().display(), rows = dataset.len(), "Loaded training data");

        let features = prepare_features(&dataset, split)?;
        self.run(&features)
    }

    /// Train every candidate, record each run, and persist the best model.
    ///
    /// # Errors
    /// Returns error if any candidate fails to fit or score, or if tracking
    /// or persistence fails.
    pub fn run(&self, features: &FeatureSet) -> Result<TrainingReport> {
        if self.candidates.is_empty() {
            return Err(ModelError::Fit("no candidate models configured".to_string()).into());
        }

        let y_test = features.y_test.to_vec();
        let mut reports = Vec::with_capacity(self.candidates.len());
        let mut blobs = Vec::with_capacity(self.candidates.len());

        for candidate in &self.candidates {
            let name = candidate.name().to_string();
            tracing::info!(model = %name, folds = self.cv_folds, "Training candidate");

            let cv_scores = cross_validate(
                candidate.as_ref(),
                &features.x_train,
                &features.y_train,
                self.cv_folds,
                CV_SEED,
            )?;
            let (cv_auc_mean, cv_auc_std) = mean_std(&cv_scores);

            let fitted = candidate.fit(&features.x_train, &features.y_train)?;
            let probs = fitted.predict_proba(&features.x_test)?;
            let test = ClassificationMetrics::compute(&y_test, &probs.to_vec()).ok_or_else(|| {
                ModelError::UndefinedAuc(format!("test partition for {name} has one class"))
            })?;

            tracing::info!(
                model = %name,
                cv_auc_mean,
                cv_auc_std,
                %test,
                "Evaluated candidate"
            );

            let blob = fitted.to_blob()?;
            let params = candidate.params();
            let metrics = BTreeMap::from([
                ("accuracy".to_string(), test.accuracy),
                ("precision".to_string(), test.precision),
                ("recall".to_string(), test.recall),
                ("roc_auc".to_string(), test.roc_auc),
                ("cv_roc_auc_mean".to_string(), cv_auc_mean),
                ("cv_roc_auc_std".to_string(), cv_auc_std),
            ]);

            let run_id = self
                .tracker
                .record(&name, &params, &metrics, &blob)
                .map_err(|e| HeartwatchError::Tracker(e.into()))?;

            reports.push(CandidateReport {
                name,
                run_id,
                params,
                cv_auc_mean,
                cv_auc_std,
                test,
            });
            blobs.push(blob);
        }

        let aucs: Vec<f64> = reports.iter().map(|r| r.test.roc_auc).collect();
        let best_index = select_best(&aucs)
            .ok_or_else(|| ModelError::Fit("no candidate produced a score".to_string()))?;
        let best = &reports[best_index];

        self.artifacts
            .save(&ArtifactBundle {
                model_name: best.name.clone(),
                model_blob: blobs.swap_remove(best_index),
                scaler: features.scaler.clone(),
            })
            .map_err(|e| HeartwatchError::Artifact(e.into()))?;

        tracing::info!(model = %best.name, roc_auc = best.test.roc_auc, "Selected best model");

        let drift_detected = check_model_drift(best.test.roc_auc, self.drift_threshold);

        Ok(TrainingReport {
            candidates: reports,
            best_index,
            drift_detected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{DataError, FsArtifactStore, SqliteTracker};
    use crate::domain::{StandardScaler, NUM_FEATURES};
    use crate::ports::FittedClassifier;
    use crate::test_support::synthetic_csv;

    /// Scores rows by column 0 (`Oracle`) or not at all (`Constant`).
    #[derive(Clone, Copy)]
    enum Stub {
        Oracle,
        Constant,
    }

    struct StubClassifier {
        name: &'static str,
        stub: Stub,
    }

    struct StubModel(Stub);

    impl Classifier for StubClassifier {
        fn name(&self) -> &str {
            self.name
        }

        fn params(&self) -> BTreeMap<String, String> {
            BTreeMap::from([("model_name".to_string(), self.name.to_string())])
        }

        fn fit(
            &self,
            _x: &Array2<f64>,
            _y: &Array1<usize>,
        ) -> std::result::Result<Box<dyn FittedClassifier>, ModelError> {
            Ok(Box::new(StubModel(self.stub)))
        }
    }

    impl FittedClassifier for StubModel {
        fn kind(&self) -> &'static str {
            "Stub"
        }

        fn n_features(&self) -> usize {
            NUM_FEATURES
        }

        fn predict_proba(&self, x: &Array2<f64>) -> std::result::Result<Array1<f64>, ModelError> {
            Ok(match self.0 {
                Stub::Oracle => x.column(0).mapv(|v| 1.0 / (1.0 + (-v).exp())),
                Stub::Constant => Array1::from_elem(x.nrows(), 0.5),
            })
        }

        fn to_blob(&self) -> std::result::Result<Vec<u8>, ModelError> {
            Ok(match self.0 {
                Stub::Oracle => b"oracle".to_vec(),
                Stub::Constant => b"constant".to_vec(),
            })
        }
    }

    fn stub(name: &'static str, stub: Stub) -> Box<dyn Classifier> {
        Box::new(StubClassifier { name, stub })
    }

    /// Column 0 is +1 for positives and -1 for negatives.
    fn separable(n: usize) -> (Array2<f64>, Array1<usize>) {
        let y = Array1::from_iter((0..n).map(|i| i % 2));
        let mut x = Array2::<f64>::zeros((n, NUM_FEATURES));
        for (i, &label) in y.iter().enumerate() {
            x[[i, 0]] = if label == 1 { 1.0 } else { -1.0 };
            x[[i, 1]] = i as f64;
        }
        (x, y)
    }

    fn feature_set() -> FeatureSet {
        let (x_train, y_train) = separable(40);
        let (x_test, y_test) = separable(10);
        let scaler = StandardScaler::fit(x_train.view()).expect("Should fit scaler");
        FeatureSet {
            x_train,
            x_test,
            y_train,
            y_test,
            scaler,
        }
    }

    fn service(
        candidates: Vec<Box<dyn Classifier>>,
    ) -> (
        TrainingService<SqliteTracker, FsArtifactStore>,
        Arc<SqliteTracker>,
        Arc<FsArtifactStore>,
        tempfile::TempDir,
    ) {
        let dir = tempfile::tempdir().expect("Should create tempdir");
        let tracker = Arc::new(SqliteTracker::in_memory("test").expect("Should create tracker"));
        let store = Arc::new(FsArtifactStore::new(dir.path()));
        let service = TrainingService::new(Arc::clone(&tracker), Arc::clone(&store))
            .with_candidates(candidates);
        (service, tracker, store, dir)
    }

    #[test]
    fn test_select_best() {
        assert_eq!(select_best(&[0.81, 0.77]), Some(0));
        assert_eq!(select_best(&[0.77, 0.81]), Some(1));
        assert_eq!(select_best(&[0.80, 0.80]), Some(0));
        assert_eq!(select_best(&[]), None);
    }

    #[test]
    fn test_stratified_folds_cover_all_rows() {
        let labels: Vec<usize> = (0..53).map(|i| usize::from(i % 4 == 0)).collect();
        let folds = stratified_folds(&labels, 5, 42);

        assert_eq!(folds.len(), 5);
        let mut all: Vec<usize> = folds.iter().flatten().copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..53).collect::<Vec<_>>());

        for fold in &folds {
            let positives = fold.iter().filter(|&&i| labels[i] == 1).count();
            assert!((2..=3).contains(&positives), "positives={positives}");
        }
    }

    #[test]
    fn test_stratified_folds_zero_k_is_one_fold() {
        let labels = [0, 1, 0, 1, 1];
        let folds = stratified_folds(&labels, 0, 7);
        assert_eq!(folds, vec![vec![0, 1, 2, 3, 4]]);
    }

    #[test]
    fn test_cross_validate_oracle() {
        let (x, y) = separable(40);
        let scores = cross_validate(stub("Oracle", Stub::Oracle).as_ref(), &x, &y, 5, 42)
            .expect("Should validate");
        assert_eq!(scores, vec![1.0; 5]);
    }

    #[test]
    fn test_best_candidate_persisted() {
        let (service, tracker, store, _dir) = service(vec![
            stub("Constant", Stub::Constant),
            stub("Oracle", Stub::Oracle),
        ]);

        let report = service.run(&feature_set()).expect("Should train");

        assert_eq!(report.best_index, 1);
        assert_eq!(report.best().name, "Oracle");
        assert!((report.candidates[0].test.roc_auc - 0.5).abs() < 1e-12);
        assert!(!report.drift_detected);

        let bundle = store.load().expect("Should load");
        assert_eq!(bundle.model_name, "Oracle");
        assert_eq!(bundle.model_blob, b"oracle");

        let runs = tracker.list_runs().expect("Should list");
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].run_name, "Constant");
        assert!(runs[1].metrics.contains_key("cv_roc_auc_mean"));
    }

    #[test]
    fn test_tie_keeps_first_candidate() {
        let (service, _tracker, store, _dir) = service(vec![
            stub("First", Stub::Oracle),
            stub("Second", Stub::Oracle),
        ]);

        let report = service.run(&feature_set()).expect("Should train");

        assert_eq!(report.best_index, 0);
        assert_eq!(store.load().expect("Should load").model_name, "First");
    }

    #[test]
    fn test_weak_best_model_flags_drift() {
        let (service, _tracker, _store, _dir) = service(vec![stub("Constant", Stub::Constant)]);

        let report = service.run(&feature_set()).expect("Should train");
        assert!(report.drift_detected);
    }

    #[test]
    fn test_run_on_csv_trains_from_file() {
        let (service, tracker, store, dir) = service(vec![
            stub("Constant", Stub::Constant),
            stub("Oracle", Stub::Oracle),
        ]);
        let path = dir.path().join("heart.csv");
        std::fs::write(&path, synthetic_csv(120, 5)).expect("Should write csv");

        let report = service
            .run_on_csv(&path, &SplitConfig::default())
            .expect("Should train");

        assert_eq!(report.candidates.len(), 2);
        assert_eq!(tracker.list_runs().expect("Should list").len(), 2);
        assert!(store.load().is_ok());
    }

    #[test]
    fn test_run_on_csv_missing_file_is_data_error() {
        let (service, tracker, _store, dir) = service(vec![stub("Oracle", Stub::Oracle)]);

        let result = service.run_on_csv(dir.path().join("absent.csv"), &SplitConfig::default());

        assert!(matches!(
            result,
            Err(HeartwatchError::Data(DataError::Open { .. }))
        ));
        assert!(tracker.list_runs().expect("Should list").is_empty());
    }

    #[test]
    fn test_run_on_csv_degenerate_split_is_features_error() {
        let (service, _tracker, _store, dir) = service(vec![stub("Oracle", Stub::Oracle)]);
        let path = dir.path().join("heart.csv");
        std::fs::write(&path, synthetic_csv(120, 5)).expect("Should write csv");
        let split = SplitConfig {
            test_ratio: 1.5,
            ..SplitConfig::default()
        };

        assert!(matches!(
            service.run_on_csv(&path, &split),
            Err(HeartwatchError::Features(_))
        ));
    }

    #[test]
    fn test_no_candidates_is_error() {
        let (service, _tracker, _store, _dir) = service(Vec::new());
        assert!(service.run(&feature_set()).is_err());
    }
}
