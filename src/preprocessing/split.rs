//! Stratified train/test partitioning

use crate::error::{Result, TissueError};
use super::Dataset;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A disjoint train/test partition of a dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Partition {
    pub train: Dataset,
    pub test: Dataset,
    /// Row indices of the source dataset that went to `train`, ascending
    pub train_indices: Vec<usize>,
    /// Row indices of the source dataset that went to `test`, ascending
    pub test_indices: Vec<usize>,
}

/// Stratified random split.
///
/// Within each class, `round(n_class * test_fraction)` rows are drawn into the
/// test side, so the positive rate on both sides tracks the overall rate.
/// Deterministic for a given `seed`.
pub fn train_test_split(dataset: &Dataset, test_fraction: f64, seed: u64) -> Result<Partition> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(TissueError::InvalidParameter {
            name: "test_fraction".to_string(),
            value: test_fraction.to_string(),
            reason: "must be strictly between 0 and 1".to_string(),
        });
    }
    dataset.check_shape()?;

    let mut class_indices: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (idx, &label) in dataset.y.iter().enumerate() {
        class_indices.entry(label.round() as i64).or_default().push(idx);
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train_indices = Vec::with_capacity(dataset.n_samples());
    let mut test_indices = Vec::new();

    for indices in class_indices.values_mut() {
        indices.shuffle(&mut rng);
        let n_test = (indices.len() as f64 * test_fraction).round() as usize;
        test_indices.extend_from_slice(&indices[..n_test]);
        train_indices.extend_from_slice(&indices[n_test..]);
    }

    if train_indices.is_empty() || test_indices.is_empty() {
        return Err(TissueError::InvalidInput(format!(
            "split of {} samples with test_fraction {} leaves an empty side",
            dataset.n_samples(),
            test_fraction
        )));
    }

    train_indices.sort_unstable();
    test_indices.sort_unstable();

    Ok(Partition {
        train: dataset.select_rows(&train_indices),
        test: dataset.select_rows(&test_indices),
        train_indices,
        test_indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};

    fn dataset(n_neg: usize, n_pos: usize) -> Dataset {
        let n = n_neg + n_pos;
        let x = Array2::from_shape_fn((n, 2), |(i, j)| (i * 2 + j) as f64);
        let y: Array1<f64> = (0..n).map(|i| if i < n_neg { 0.0 } else { 1.0 }).collect();
        Dataset::new(x, y, vec!["a".to_string(), "b".to_string()]).unwrap()
    }

    #[test]
    fn test_split_is_disjoint_and_complete() {
        let data = dataset(60, 40);
        let part = train_test_split(&data, 0.3, 1).unwrap();

        let mut all: Vec<usize> = part.train_indices.iter().chain(&part.test_indices).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..100).collect::<Vec<_>>());
        assert_eq!(part.test.n_samples(), 30);
        assert_eq!(part.train.n_samples(), 70);
    }

    #[test]
    fn test_split_keeps_rows_aligned() {
        let data = dataset(20, 20);
        let part = train_test_split(&data, 0.25, 3).unwrap();
        for (row, &src) in part.test_indices.iter().enumerate() {
            assert_eq!(part.test.x[[row, 0]], data.x[[src, 0]]);
            assert_eq!(part.test.y[row], data.y[src]);
        }
    }

    #[test]
    fn test_split_is_deterministic() {
        let data = dataset(50, 30);
        let a = train_test_split(&data, 0.3, 11).unwrap();
        let b = train_test_split(&data, 0.3, 11).unwrap();
        assert_eq!(a.train_indices, b.train_indices);
        assert_eq!(a.test_indices, b.test_indices);
    }

    #[test]
    fn test_invalid_fraction() {
        let data = dataset(5, 5);
        assert!(train_test_split(&data, 0.0, 1).is_err());
        assert!(train_test_split(&data, 1.0, 1).is_err());
    }
}
