//! Heartwatch: Heart disease prediction API.
//!
//! Loads the persisted model and scaler, then serves `GET /` and
//! `POST /predict`. Missing or invalid artifacts abort startup before the
//! listener is bound.

use std::sync::Arc;

use anyhow::{Context, Result};

use heartwatch::adapters::FsArtifactStore;
use heartwatch::api::{build_router, AppState};
use heartwatch::application::InferenceService;
use heartwatch::config::Settings;
use heartwatch::telemetry::{self, Process};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::from_env()?;
    let _guard = telemetry::init(&settings.log, Process::Server)
        .context("failed to initialize logging")?;

    tracing::info!("Starting Heartwatch...");

    let store = FsArtifactStore::new(&settings.artifact_dir);
    let inference = InferenceService::load(&store).with_context(|| {
        format!(
            "failed to load artifacts from {}; run `train` first",
            settings.artifact_dir.display()
        )
    })?;
    tracing::info!(model = inference.model_name(), "Model ready");

    let app = build_router(Arc::new(AppState { inference }));

    let listener = tokio::net::TcpListener::bind(settings.bind_addr).await?;
    tracing::info!(addr = %settings.bind_addr, "Listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Heartwatch shutdown complete.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
