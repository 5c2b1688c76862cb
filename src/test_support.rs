//! Seeded synthetic patients for unit tests.

use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::domain::{Dataset, PatientFeatures, Record, StandardScaler, NUM_FEATURES};

/// Generate `n` patients with balanced labels. Positives are older, have
/// lower max heart rate and more ST depression, plus noise.
pub fn synthetic_dataset(n: usize, seed: u64) -> Dataset {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let records = (0..n)
        .map(|i| {
            let sick = i % 2 == 1;
            let shift = if sick { 1.0 } else { 0.0 };
            let features = PatientFeatures {
                age: 48.0 + 10.0 * shift + rng.gen_range(-8.0..8.0),
                sex: f64::from(rng.gen_range(0..2u8)),
                cp: 1.0 + 2.0 * shift + f64::from(rng.gen_range(0..2u8)),
                trestbps: rng.gen_range(110.0..160.0),
                chol: rng.gen_range(180.0..300.0),
                fbs: f64::from(rng.gen_range(0..2u8)),
                restecg: f64::from(rng.gen_range(0..3u8)),
                thalach: 165.0 - 25.0 * shift + rng.gen_range(-15.0..15.0),
                exang: shift,
                oldpeak: 0.5 + 1.5 * shift + rng.gen_range(0.0..1.0),
                slope: 1.0 + shift,
                ca: f64::from(rng.gen_range(0..2u8)) + shift,
                thal: if sick { 7.0 } else { 3.0 },
            };
            Record::new(features, if sick { 1.0 } else { 0.0 })
        })
        .collect();

    Dataset::new(records)
}

/// Feature matrix and labels of [`synthetic_dataset`], standardized.
pub fn scaled_synthetic(n: usize, seed: u64) -> (Array2<f64>, Array1<usize>) {
    let dataset = synthetic_dataset(n, seed);
    let mut x = Array2::<f64>::zeros((dataset.len(), NUM_FEATURES));
    for (mut row, record) in x.rows_mut().into_iter().zip(dataset.records()) {
        row.assign(&Array1::from(record.features.to_vec()));
    }
    let y = dataset
        .records()
        .iter()
        .map(|r| usize::from(r.label))
        .collect::<Array1<usize>>();

    let scaler = StandardScaler::fit(x.view()).expect("Synthetic data is non-empty");
    let x = scaler.transform(x.view()).expect("Same width");
    (x, y)
}

/// [`synthetic_dataset`] rendered as a headed CSV, as `download_data` writes it.
pub fn synthetic_csv(n: usize, seed: u64) -> String {
    let mut out = crate::adapters::loader::header_row();
    out.push('\n');
    for record in synthetic_dataset(n, seed).records() {
        let cells: Vec<String> = record.features.to_vec().iter().map(f64::to_string).collect();
        out.push_str(&cells.join(","));
        out.push_str(&format!(",{}\n", record.label));
    }
    out
}
