//! Runtime configuration from `HEARTWATCH_*` environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::application::{SplitConfig, DEFAULT_DRIFT_THRESHOLD};

pub const DEFAULT_DATA_URL: &str =
    "https://archive.ics.uci.edu/ml/machine-learning-databases/heart-disease/processed.cleveland.data";

const DEFAULT_LOG_FILE: &str = "logs/heartwatch.log";

/// Error type for configuration parsing.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key}={value:?} is invalid: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
    /// File for a server attached to a terminal, stdout otherwise
    #[default]
    Auto,
    Stdout,
    File,
}

impl FromStr for LogMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "stdout" => Ok(Self::Stdout),
            "file" => Ok(Self::File),
            other => Err(format!("expected auto, stdout or file, got {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogSettings {
    pub mode: LogMode,
    pub file: PathBuf,
}

/// All process settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data_path: PathBuf,
    pub data_url: String,
    pub artifact_dir: PathBuf,
    pub tracking_db: PathBuf,
    pub experiment: String,
    pub bind_addr: SocketAddr,
    pub split: SplitConfig,
    pub cv_folds: usize,
    pub drift_threshold: f64,
    pub log: LogSettings,
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// # Errors
    /// Returns `ConfigError` if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup. Unset keys take
    /// their defaults.
    ///
    /// # Errors
    /// Returns `ConfigError` if a value cannot be parsed or is out of range.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let test_ratio: f64 = parse(&get, "HEARTWATCH_TEST_RATIO", 0.2)?;
        if !(test_ratio > 0.0 && test_ratio < 1.0) {
            return Err(invalid("HEARTWATCH_TEST_RATIO", test_ratio, "must be in (0, 1)"));
        }

        let cv_folds: usize = parse(&get, "HEARTWATCH_CV_FOLDS", 5)?;
        if cv_folds < 2 {
            return Err(invalid("HEARTWATCH_CV_FOLDS", cv_folds, "must be at least 2"));
        }

        let drift_threshold: f64 =
            parse(&get, "HEARTWATCH_DRIFT_THRESHOLD", DEFAULT_DRIFT_THRESHOLD)?;
        if !(0.0..=1.0).contains(&drift_threshold) {
            return Err(invalid(
                "HEARTWATCH_DRIFT_THRESHOLD",
                drift_threshold,
                "must be in [0, 1]",
            ));
        }

        Ok(Self {
            data_path: get("HEARTWATCH_DATA_PATH")
                .map_or_else(|| PathBuf::from("data/heart.csv"), PathBuf::from),
            data_url: get("HEARTWATCH_DATA_URL").unwrap_or_else(|| DEFAULT_DATA_URL.to_string()),
            artifact_dir: get("HEARTWATCH_ARTIFACT_DIR")
                .map_or_else(|| PathBuf::from("artifacts"), PathBuf::from),
            tracking_db: get("HEARTWATCH_TRACKING_DB")
                .map_or_else(|| PathBuf::from("mlruns/tracking.db"), PathBuf::from),
            experiment: get("HEARTWATCH_EXPERIMENT")
                .unwrap_or_else(|| "HeartDisease_MLOps".to_string()),
            bind_addr: parse(&get, "HEARTWATCH_BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 8000)))?,
            split: SplitConfig {
                test_ratio,
                seed: parse(&get, "HEARTWATCH_SPLIT_SEED", 42)?,
            },
            cv_folds,
            drift_threshold,
            log: LogSettings {
                mode: parse(&get, "HEARTWATCH_LOG_MODE", LogMode::Auto)?,
                file: get("HEARTWATCH_LOG_FILE")
                    .map_or_else(|| PathBuf::from(DEFAULT_LOG_FILE), PathBuf::from),
            },
        })
    }
}

fn parse<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

fn invalid(key: &'static str, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
