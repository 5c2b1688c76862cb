//! Logging setup shared by the binaries.

use std::io::IsTerminal;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogMode, LogSettings};

/// Which binary is installing the subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Process {
    /// Long-running HTTP server
    Server,
    /// One-shot tools (`train`, `download_data`) whose output is read live
    Batch,
}

/// Resolve `Auto`: only an interactive server moves its logs to the file.
#[must_use]
pub fn writes_to_file(mode: LogMode, interactive: bool, process: Process) -> bool {
    match mode {
        LogMode::File => true,
        LogMode::Stdout => false,
        LogMode::Auto => interactive && process == Process::Server,
    }
}

/// Install the global subscriber.
///
/// The returned guard flushes buffered log lines on drop; keep it alive
/// for the lifetime of `main`.
///
/// # Errors
/// Returns error if the log file cannot be opened.
pub fn init(settings: &LogSettings, process: Process) -> std::io::Result<WorkerGuard> {
    let use_file = writes_to_file(settings.mode, std::io::stdout().is_terminal(), process);

    let (writer, guard) = if use_file {
        if let Some(parent) = settings.file.parent() {
            // A missing directory shows up as an open error below.
            let _ = std::fs::create_dir_all(parent);
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&settings.file)?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(writer))
        .init();

    Ok(guard)
}
