//! Shared synthetic tissue tables for integration tests

#![allow(dead_code)]

use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const MEASUREMENTS: [&str; 10] = [
    "radius",
    "texture",
    "perimeter",
    "area",
    "smoothness",
    "compactness",
    "concavity",
    "concave points",
    "symmetry",
    "fractal_dimension",
];

/// The 30 feature names: each measurement as mean, standard error and worst
pub fn feature_names() -> Vec<String> {
    ["mean", "se", "worst"]
        .iter()
        .flat_map(|suffix| MEASUREMENTS.iter().map(move |m| format!("{}_{}", m, suffix)))
        .collect()
}

/// Table shaped like the diagnostic dataset: id, diagnosis (M/B), 30
/// numeric features, and a trailing fully empty column. Malignant rows are
/// shifted upward on every feature, with overlapping noise.
pub fn tissue_frame(n_benign: usize, n_malignant: usize, seed: u64) -> DataFrame {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let n = n_benign + n_malignant;

    let mut malignant: Vec<bool> = (0..n).map(|i| i >= n_benign).collect();
    malignant.shuffle(&mut rng);

    let mut columns: Vec<Column> = Vec::with_capacity(33);
    let ids: Vec<i64> = (0..n as i64).map(|i| 842_302 + i).collect();
    columns.push(Column::new("id".into(), ids));

    let diagnosis: Vec<&str> = malignant.iter().map(|&m| if m { "M" } else { "B" }).collect();
    columns.push(Column::new("diagnosis".into(), diagnosis));

    for (j, name) in feature_names().into_iter().enumerate() {
        let scale = 1.0 + j as f64 * 0.5;
        let values: Vec<f64> = malignant
            .iter()
            .map(|&m| {
                let shift = if m { 1.5 } else { 0.0 };
                scale * (10.0 + shift + rng.gen_range(-1.5..1.5))
            })
            .collect();
        columns.push(Column::new(name.into(), values));
    }

    let empty: Vec<Option<f64>> = vec![None; n];
    columns.push(Column::new("Unnamed: 32".into(), empty));

    DataFrame::new(columns).unwrap()
}

/// 569 rows: 357 benign, 212 malignant
pub fn wdbc_like(seed: u64) -> DataFrame {
    tissue_frame(357, 212, seed)
}
