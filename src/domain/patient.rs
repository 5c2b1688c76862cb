//! Patient records for heart disease prediction.
//!
//! Based on the UCI Cleveland heart-disease dataset (13 clinical attributes).

use serde::{Deserialize, Serialize};

/// Number of clinical attributes per patient.
pub const NUM_FEATURES: usize = 13;

/// Canonical attribute order.
///
/// Shared by scaler fitting at training time and vector construction at
/// inference time. Column `i` of every feature matrix is `FEATURE_NAMES[i]`.
pub const FEATURE_NAMES: [&str; NUM_FEATURES] = [
    "age", "sex", "cp", "trestbps", "chol", "fbs", "restecg", "thalach", "exang", "oldpeak",
    "slope", "ca", "thal",
];

/// Name of the label column in the source data.
pub const TARGET_COLUMN: &str = "target";

/// Clinical features for one patient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PatientFeatures {
    /// Age in years
    pub age: f64,

    /// Sex: 1 = male, 0 = female
    pub sex: f64,

    /// Chest pain type (1-4)
    pub cp: f64,

    /// Resting blood pressure in mm Hg
    pub trestbps: f64,

    /// Serum cholesterol in mg/dl
    pub chol: f64,

    /// Fasting blood sugar > 120 mg/dl: 1 = true, 0 = false
    pub fbs: f64,

    /// Resting ECG result (0-2)
    pub restecg: f64,

    /// Maximum heart rate achieved
    pub thalach: f64,

    /// Exercise induced angina: 1 = yes, 0 = no
    pub exang: f64,

    /// ST depression induced by exercise relative to rest
    pub oldpeak: f64,

    /// Slope of the peak exercise ST segment
    pub slope: f64,

    /// Number of major vessels colored by fluoroscopy (0-3)
    pub ca: f64,

    /// Thalassemia code
    pub thal: f64,
}

impl PatientFeatures {
    /// Convert features to an array in [`FEATURE_NAMES`] order.
    #[must_use]
    pub fn to_array(&self) -> [f64; NUM_FEATURES] {
        [
            self.age,
            self.sex,
            self.cp,
            self.trestbps,
            self.chol,
            self.fbs,
            self.restecg,
            self.thalach,
            self.exang,
            self.oldpeak,
            self.slope,
            self.ca,
            self.thal,
        ]
    }

    /// Convert features to a vector in [`FEATURE_NAMES`] order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        self.to_array().to_vec()
    }

    /// Create features from values in [`FEATURE_NAMES`] order.
    ///
    /// # Errors
    /// Returns error if the slice length is not 13.
    pub fn from_vec(v: &[f64]) -> Result<Self, String> {
        if v.len() != NUM_FEATURES {
            return Err(format!(
                "Expected {NUM_FEATURES} features, got {}",
                v.len()
            ));
        }

        Ok(Self {
            age: v[0],
            sex: v[1],
            cp: v[2],
            trestbps: v[3],
            chol: v[4],
            fbs: v[5],
            restecg: v[6],
            thalach: v[7],
            exang: v[8],
            oldpeak: v[9],
            slope: v[10],
            ca: v[11],
            thal: v[12],
        })
    }

    /// Build features from named fields, each already parsed to a number.
    ///
    /// `None` marks a value that was present but is not a number. Every
    /// attribute must appear exactly by name; unknown names are rejected
    /// rather than ignored, and non-finite numbers count as non-numeric.
    ///
    /// # Errors
    /// Returns an [`InvalidPayload`] naming every offending field.
    pub fn from_fields<'a, I>(fields: I) -> Result<Self, InvalidPayload>
    where
        I: IntoIterator<Item = (&'a str, Option<f64>)>,
    {
        let mut invalid = InvalidPayload::default();
        let mut slots: [Option<Option<f64>>; NUM_FEATURES] = [None; NUM_FEATURES];

        for (name, value) in fields {
            match FEATURE_NAMES.iter().position(|&known| known == name) {
                Some(i) => slots[i] = Some(value.filter(|v| v.is_finite())),
                None => invalid.unknown.push(name.to_string()),
            }
        }

        let mut values = [0.0f64; NUM_FEATURES];
        for ((value, slot), name) in values.iter_mut().zip(slots).zip(FEATURE_NAMES) {
            match slot {
                None => invalid.missing.push(name.to_string()),
                Some(None) => invalid.non_numeric.push(name.to_string()),
                Some(Some(v)) => *value = v,
            }
        }

        if !invalid.is_empty() {
            return Err(invalid);
        }

        Self::from_vec(&values).map_err(|_| invalid)
    }
}

/// Field-level problems with a prediction payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{}", self.describe())]
pub struct InvalidPayload {
    /// Required attributes absent from the payload
    pub missing: Vec<String>,
    /// Keys that are not recognised attributes
    pub unknown: Vec<String>,
    /// Attributes whose value is not a finite number
    pub non_numeric: Vec<String>,
}

impl InvalidPayload {
    /// True when no field was flagged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.unknown.is_empty() && self.non_numeric.is_empty()
    }

    fn describe(&self) -> String {
        let mut parts = Vec::new();
        if !self.missing.is_empty() {
            parts.push(format!("missing fields: {}", self.missing.join(", ")));
        }
        if !self.unknown.is_empty() {
            parts.push(format!("unknown fields: {}", self.unknown.join(", ")));
        }
        if !self.non_numeric.is_empty() {
            parts.push(format!("non-numeric fields: {}", self.non_numeric.join(", ")));
        }
        parts.join("; ")
    }
}

/// One cleaned observation: features plus binarized label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Record {
    pub features: PatientFeatures,
    /// 1 = disease present, 0 = absent
    pub label: u8,
}

impl Record {
    /// Create a record, binarizing the raw label (`> 0` means disease present).
    #[must_use]
    pub fn new(features: PatientFeatures, raw_label: f64) -> Self {
        Self {
            features,
            label: u8::from(raw_label > 0.0),
        }
    }
}

/// Ordered collection of cleaned records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    #[must_use]
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Labels in record order.
    #[must_use]
    pub fn labels(&self) -> Vec<u8> {
        self.records.iter().map(|r| r.label).collect()
    }

    /// Count of records with label 1.
    #[must_use]
    pub fn positives(&self) -> usize {
        self.records.iter().filter(|r| r.label == 1).count()
    }
}
