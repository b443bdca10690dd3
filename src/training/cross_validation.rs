//! Stratified k-fold cross-validation

use crate::error::{Result, TissueError};
use ndarray::Array1;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single train/validation split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CVSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Stratified k-fold splitter.
///
/// Every fold keeps approximately the class proportions of the full label
/// vector. With `shuffle` the within-class order is permuted by a ChaCha8
/// stream seeded from `random_state`, so the same seed always produces the
/// same folds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StratifiedKFold {
    pub n_splits: usize,
    pub shuffle: bool,
    pub random_state: u64,
}

impl StratifiedKFold {
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            shuffle: true,
            random_state: 42,
        }
    }

    /// Set random state for reproducibility
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Generate train/validation splits for the label vector `y`
    pub fn split(&self, y: &Array1<f64>) -> Result<Vec<CVSplit>> {
        let n_splits = self.n_splits;
        if n_splits < 2 {
            return Err(TissueError::InvalidParameter {
                name: "folds".to_string(),
                value: n_splits.to_string(),
                reason: "must be at least 2".to_string(),
            });
        }

        // Ordered grouping keeps fold assignment independent of hash state
        let mut class_indices: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (idx, &val) in y.iter().enumerate() {
            class_indices.entry(val.round() as i64).or_default().push(idx);
        }

        let minority_count = class_indices.values().map(Vec::len).min().unwrap_or(0);
        if class_indices.len() < 2 || minority_count < n_splits {
            return Err(TissueError::InsufficientData {
                folds: n_splits,
                minority_count: if class_indices.len() < 2 { 0 } else { minority_count },
            });
        }

        if self.shuffle {
            let mut rng = ChaCha8Rng::seed_from_u64(self.random_state);
            for indices in class_indices.values_mut() {
                indices.shuffle(&mut rng);
            }
        }

        // Round-robin within each class, continuing the fold cursor across
        // classes so fold sizes differ by at most one.
        let mut folds: Vec<Vec<usize>> = vec![Vec::new(); n_splits];
        let mut cursor = 0;
        for indices in class_indices.values() {
            for &idx in indices {
                folds[cursor % n_splits].push(idx);
                cursor += 1;
            }
        }
        for fold in folds.iter_mut() {
            fold.sort_unstable();
        }

        let mut splits = Vec::with_capacity(n_splits);
        for fold_idx in 0..n_splits {
            let test_indices = folds[fold_idx].clone();
            let mut train_indices: Vec<usize> = folds
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != fold_idx)
                .flat_map(|(_, f)| f.iter().copied())
                .collect();
            train_indices.sort_unstable();

            splits.push(CVSplit {
                train_indices,
                test_indices,
                fold_idx,
            });
        }

        Ok(splits)
    }
}

/// Size of the smallest class in a binary label vector
pub fn minority_class_count(y: &Array1<f64>) -> usize {
    let positives = y.iter().filter(|&&v| v > 0.5).count();
    positives.min(y.len() - positives)
}

/// Cross-validation results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CVResults {
    /// Scores for each fold
    pub scores: Vec<f64>,
    /// Mean score across folds
    pub mean_score: f64,
    /// Standard deviation of scores
    pub std_score: f64,
    /// Number of folds
    pub n_folds: usize,
}

impl CVResults {
    /// Create CV results from fold scores
    pub fn from_scores(scores: Vec<f64>) -> Self {
        let n_folds = scores.len();
        if n_folds == 0 {
            return Self {
                scores,
                mean_score: 0.0,
                std_score: 0.0,
                n_folds,
            };
        }
        let mean_score = scores.iter().sum::<f64>() / n_folds as f64;
        let variance = scores.iter().map(|s| (s - mean_score).powi(2)).sum::<f64>() / n_folds as f64;
        let std_score = variance.sqrt();

        Self {
            scores,
            mean_score,
            std_score,
            n_folds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stratified_k_fold() {
        let y = Array1::from_vec(vec![
            0.0, 0.0, 0.0, 0.0, 0.0,  // 5 samples of class 0
            1.0, 1.0, 1.0, 1.0, 1.0,  // 5 samples of class 1
        ]);

        let cv = StratifiedKFold::new(5).with_shuffle(false);
        let splits = cv.split(&y).unwrap();

        assert_eq!(splits.len(), 5);

        // Each fold should have 1 sample from each class
        for split in &splits {
            assert_eq!(split.test_indices.len(), 2);
            let positives = split.test_indices.iter().filter(|&&i| y[i] > 0.5).count();
            assert_eq!(positives, 1);
            assert_eq!(split.train_indices.len(), 8);
        }
    }

    #[test]
    fn test_folds_partition_all_indices() {
        let y: Array1<f64> = (0..37).map(|i| if i % 3 == 0 { 1.0 } else { 0.0 }).collect();
        let splits = StratifiedKFold::new(4).split(&y).unwrap();

        let mut all_test: Vec<usize> = splits.iter().flat_map(|s| s.test_indices.clone()).collect();
        all_test.sort();
        assert_eq!(all_test, (0..37).collect::<Vec<_>>());

        let sizes: Vec<usize> = splits.iter().map(|s| s.test_indices.len()).collect();
        let max = *sizes.iter().max().unwrap();
        let min = *sizes.iter().min().unwrap();
        assert!(max - min <= 1);
    }

    #[test]
    fn test_same_seed_same_folds() {
        let y: Array1<f64> = (0..50).map(|i| if i % 2 == 0 { 1.0 } else { 0.0 }).collect();
        let a = StratifiedKFold::new(5).with_random_state(9).split(&y).unwrap();
        let b = StratifiedKFold::new(5).with_random_state(9).split(&y).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_too_few_minority_samples() {
        let y = Array1::from_vec(vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0]);
        let err = StratifiedKFold::new(3).split(&y).unwrap_err();
        assert!(matches!(err, TissueError::InsufficientData { folds: 3, minority_count: 2 }));
        assert_eq!(minority_class_count(&y), 2);
    }

    #[test]
    fn test_single_fold_rejected() {
        let y = Array1::from_vec(vec![0.0, 1.0, 0.0, 1.0]);
        assert!(matches!(
            StratifiedKFold::new(1).split(&y),
            Err(TissueError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_cv_results() {
        let results = CVResults::from_scores(vec![0.8, 0.9, 1.0]);
        assert!((results.mean_score - 0.9).abs() < 1e-12);
        assert_eq!(results.n_folds, 3);
    }
}
