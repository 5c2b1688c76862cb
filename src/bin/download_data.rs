//! Dataset download utility.
//!
//! Fetches the UCI Cleveland heart-disease file, prepends the header row,
//! and writes it to the configured data path (`data/heart.csv` by default).
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin download_data
//! ```

use anyhow::{Context, Result};

use heartwatch::adapters::with_header;
use heartwatch::config::Settings;
use heartwatch::telemetry::{self, Process};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::from_env()?;
    let _guard = telemetry::init(&settings.log, Process::Batch)
        .context("failed to initialize logging")?;

    tracing::info!(url = %settings.data_url, "Downloading dataset");
    let raw = reqwest::get(&settings.data_url)
        .await
        .and_then(reqwest::Response::error_for_status)
        .with_context(|| format!("failed to fetch {}", settings.data_url))?
        .text()
        .await
        .context("failed to read response body")?;

    let path = &settings.data_path;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, with_header(&raw))
        .with_context(|| format!("failed to write {}", path.display()))?;

    tracing::info!(path = %path.display(), "Dataset written");
    println!("Dataset downloaded successfully");
    Ok(())
}
