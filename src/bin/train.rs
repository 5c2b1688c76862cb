//! Offline training pipeline.
//!
//! Loads and cleans the dataset, prepares features, trains every candidate,
//! records each run, and persists the best model with its scaler.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin train
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};

use heartwatch::adapters::{FsArtifactStore, SqliteTracker};
use heartwatch::application::TrainingService;
use heartwatch::config::Settings;
use heartwatch::telemetry::{self, Process};

fn main() -> Result<()> {
    let settings = Settings::from_env()?;
    let _guard = telemetry::init(&settings.log, Process::Batch)
        .context("failed to initialize logging")?;

    let tracker = Arc::new(SqliteTracker::new(&settings.tracking_db, &settings.experiment)?);
    let store = Arc::new(FsArtifactStore::new(&settings.artifact_dir));

    let report = TrainingService::new(tracker, store)
        .with_cv_folds(settings.cv_folds)
        .with_drift_threshold(settings.drift_threshold)
        .run_on_csv(&settings.data_path, &settings.split)
        .with_context(|| {
            format!(
                "training on {} failed; run `download_data` first if it is missing",
                settings.data_path.display()
            )
        })?;

    for candidate in &report.candidates {
        println!("{} ROC-AUC: {:.4}", candidate.name, candidate.test.roc_auc);
    }
    println!(
        "Best model: {} (saved to {})",
        report.best().name,
        settings.artifact_dir.display()
    );
    if report.drift_detected {
        println!(
            "Warning: best ROC-AUC is below the drift threshold {}",
            settings.drift_threshold
        );
    }

    Ok(())
}
