//! Data loader: Reads and cleans the heart-disease CSV.
//!
//! Cleaning rules:
//! - cells equal to the `?` sentinel (or empty) are missing
//! - rows with any missing cell are dropped, never imputed
//! - every remaining cell must parse as a number
//! - the label is binarized (`> 0` means disease present)

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};

use crate::domain::{Dataset, PatientFeatures, Record, FEATURE_NAMES, NUM_FEATURES, TARGET_COLUMN};

/// Marker used by the UCI files for an unknown value.
pub const MISSING_SENTINEL: &str = "?";

/// Error type for dataset loading.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Row {row}, column {column}: cannot parse {value:?} as a number")]
    NotNumeric {
        row: usize,
        column: String,
        value: String,
    },

    #[error("No complete rows remain after cleaning")]
    Empty,
}

/// Load and clean the dataset at `path`.
///
/// # Errors
/// Returns `DataError` if the file is missing, a column is absent, a cell
/// cannot be coerced to a number, or no complete rows remain.
pub fn load_and_clean<P: AsRef<Path>>(path: P) -> Result<Dataset, DataError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| DataError::Open {
        path: path.display().to_string(),
        source,
    })?;
    let dataset = load_and_clean_from_reader(file)?;
    tracing::info!(
        path = %path.display(),
        rows = dataset.len(),
        positives = dataset.positives(),
        "Loaded dataset"
    );
    Ok(dataset)
}

/// Load and clean CSV data from any reader. The first line must be a header.
///
/// # Errors
/// See [`load_and_clean`].
pub fn load_and_clean_from_reader<R: Read>(reader: R) -> Result<Dataset, DataError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let positions: HashMap<&str, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, name)| (name, i))
        .collect();

    let mut columns = [0usize; NUM_FEATURES + 1];
    for (slot, name) in columns
        .iter_mut()
        .zip(FEATURE_NAMES.iter().chain(std::iter::once(&TARGET_COLUMN)))
    {
        *slot = *positions
            .get(name)
            .ok_or_else(|| DataError::MissingColumn((*name).to_string()))?;
    }

    let mut records = Vec::new();
    let mut dropped = 0usize;

    for (idx, row) in rdr.records().enumerate() {
        let row = row?;
        // 1-based, counting the header as line 1
        let line = idx + 2;

        let cells: Vec<&str> = columns
            .iter()
            .map(|&c| row.get(c).unwrap_or(""))
            .collect();

        if cells.iter().any(|c| is_missing(c)) {
            dropped += 1;
            continue;
        }

        let mut values = [0.0f64; NUM_FEATURES + 1];
        for (i, (value, cell)) in values.iter_mut().zip(&cells).enumerate() {
            *value = cell
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| DataError::NotNumeric {
                    row: line,
                    column: column_name(i).to_string(),
                    value: (*cell).to_string(),
                })?;
        }

        let features = PatientFeatures::from_vec(&values[..NUM_FEATURES])
            .map_err(|_| DataError::MissingColumn(TARGET_COLUMN.to_string()))?;
        records.push(Record::new(features, values[NUM_FEATURES]));
    }

    if dropped > 0 {
        tracing::debug!(dropped, "Dropped rows with missing values");
    }

    if records.is_empty() {
        return Err(DataError::Empty);
    }

    Ok(Dataset::new(records))
}

/// Header row naming the 13 attributes and the label, comma-joined.
#[must_use]
pub fn header_row() -> String {
    let mut names: Vec<&str> = FEATURE_NAMES.to_vec();
    names.push(TARGET_COLUMN);
    names.join(",")
}

/// Turn the raw headerless UCI file into a CSV with a header row.
/// Blank lines are dropped.
#[must_use]
pub fn with_header(raw: &str) -> String {
    let mut out = header_row();
    out.push('\n');
    for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
        out.push_str(line);
        out.push('\n');
    }
    out
}

fn is_missing(cell: &str) -> bool {
    cell.is_empty() || cell == MISSING_SENTINEL
}

fn column_name(i: usize) -> &'static str {
    FEATURE_NAMES.get(i).copied().unwrap_or(TARGET_COLUMN)
}
