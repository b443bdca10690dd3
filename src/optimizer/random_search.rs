//! Seeded randomized hyperparameter search with stratified cross-validation

use ndarray::{Array1, Array2, Axis};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{Result, TissueError};
use crate::evaluation::accuracy;
use crate::training::{CVResults, CVSplit, Classifier, FittedModel, ModelFamily, StratifiedKFold};
use super::config::SearchConfig;
use super::search_space::{HyperParams, ParamMap, SearchSpace};

/// Result of a single trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    /// Draw order of the configuration
    pub index: usize,
    pub params: ParamMap,
    pub fold_scores: Vec<f64>,
    pub mean_score: f64,
    pub std_score: f64,
}

/// Outcome of tuning one family
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub family: String,
    pub best_params: ParamMap,
    /// Winner refit on the full training set
    pub best_model: FittedModel,
    pub best_score: f64,
    /// Draw index of the winning trial
    pub best_trial: usize,
    /// Mean CV accuracy of every surviving trial, in draw order
    pub trial_scores: Vec<f64>,
    pub trials: Vec<TrialRecord>,
    /// Trials skipped because fitting failed
    pub n_failed: usize,
    pub duration_secs: f64,
}

/// Randomized search over a family's space
#[derive(Debug, Clone, Default)]
pub struct RandomSearch {
    config: SearchConfig,
}

impl RandomSearch {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Tune `family` on the training rows `(x, y)`.
    ///
    /// All configurations are drawn up front from one seeded stream and
    /// evaluated against one shared set of stratified folds. Trials run in
    /// parallel but are collected in draw order, so on equal mean accuracy
    /// the earliest draw wins.
    pub fn tune<F: ModelFamily>(&self, family: &F, x: &Array2<f64>, y: &Array1<f64>) -> Result<SearchResult> {
        let start = Instant::now();
        let name = family.name();
        let SearchConfig { n_trials, folds, seed } = self.config;

        family.search_space().validate()?;
        if n_trials == 0 {
            return Err(TissueError::InvalidParameter {
                name: "n_trials".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if x.nrows() != y.len() {
            return Err(TissueError::mismatch(
                format!("{} labels", x.nrows()),
                format!("{} labels", y.len()),
            ));
        }

        let splits = StratifiedKFold::new(folds).with_random_state(seed).split(y)?;

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let draws: Vec<F::Params> = (0..n_trials).map(|_| family.sample(&mut rng)).collect();

        info!(family = name, trials = n_trials, folds, seed, "Starting random search");

        let outcomes: Vec<(usize, F::Params, Result<CVResults>)> = draws
            .into_par_iter()
            .enumerate()
            .map(|(index, params)| {
                let scored = cross_validate(family, &params, x, y, &splits);
                (index, params, scored)
            })
            .collect();

        let mut trials = Vec::with_capacity(n_trials);
        let mut best: Option<(usize, F::Params, f64)> = None;
        let mut n_failed = 0;

        for (index, params, scored) in outcomes {
            let cv = match scored {
                Ok(cv) => cv,
                Err(e) => {
                    warn!(family = name, trial = index, error = %e, "Trial failed, skipping");
                    n_failed += 1;
                    continue;
                }
            };
            debug!(family = name, trial = index, score = cv.mean_score, "Trial complete");

            let improves = best.as_ref().map_or(true, |(_, _, score)| cv.mean_score > *score);
            if improves {
                best = Some((index, params.clone(), cv.mean_score));
            }

            trials.push(TrialRecord {
                index,
                params: params.to_param_map(),
                fold_scores: cv.scores,
                mean_score: cv.mean_score,
                std_score: cv.std_score,
            });
        }

        let (best_trial, best_params, best_score) = best.ok_or_else(|| TissueError::SearchFailed {
            family: name.to_string(),
            n_trials,
        })?;

        let best_model = family.fit(&best_params, x, y)?;
        let duration_secs = start.elapsed().as_secs_f64();

        info!(
            family = name,
            best_trial,
            best_score,
            failed = n_failed,
            duration_secs,
            "Random search complete"
        );

        Ok(SearchResult {
            family: name.to_string(),
            best_params: best_params.to_param_map(),
            best_model,
            best_score,
            best_trial,
            trial_scores: trials.iter().map(|t| t.mean_score).collect(),
            trials,
            n_failed,
            duration_secs,
        })
    }
}

/// Tune with a one-off [`RandomSearch`]
pub fn tune<F: ModelFamily>(family: &F, x: &Array2<f64>, y: &Array1<f64>, config: &SearchConfig) -> Result<SearchResult> {
    RandomSearch::new(config.clone()).tune(family, x, y)
}

/// Fit on each fold's training rows and score accuracy on its held-out rows
fn cross_validate<F: ModelFamily>(
    family: &F,
    params: &F::Params,
    x: &Array2<f64>,
    y: &Array1<f64>,
    splits: &[CVSplit],
) -> Result<CVResults> {
    let scores = splits
        .par_iter()
        .map(|split| {
            let x_train = x.select(Axis(0), &split.train_indices);
            let y_train = y.select(Axis(0), &split.train_indices);
            let x_val = x.select(Axis(0), &split.test_indices);
            let y_val = y.select(Axis(0), &split.test_indices);

            let model = family.fit(params, &x_train, &y_train)?;
            let predictions = model.predict_labels(&x_val)?;
            accuracy(&y_val, &predictions)
        })
        .collect::<Result<Vec<f64>>>()?;

    Ok(CVResults::from_scores(scores))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::search_space::{Choice, Dimension};
    use crate::training::{DecisionTreeFamily, DistanceMetric, KnnFamily, KnnSpace, WeightScheme};

    fn blobs(n: usize) -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((n, 3), |(i, j)| {
            let shift = if i % 2 == 0 { 0.0 } else { 2.5 };
            shift + ((i * 13 + j * 7) % 10) as f64 * 0.15
        });
        let y: Array1<f64> = (0..n).map(|i| (i % 2) as f64).collect();
        (x, y)
    }

    #[test]
    fn test_search_returns_winner_from_trials() {
        let (x, y) = blobs(60);
        let config = SearchConfig::new().with_n_trials(8).with_folds(3);
        let result = tune(&KnnFamily::default(), &x, &y, &config).unwrap();

        assert_eq!(result.trial_scores.len() + result.n_failed, 8);
        let max = result.trial_scores.iter().cloned().fold(f64::MIN, f64::max);
        assert_eq!(result.best_score, max);
        assert!(result.trials.iter().any(|t| t.index == result.best_trial));
        assert!(result.best_params.contains_key("n_neighbors"));
    }

    #[test]
    fn test_search_is_deterministic() {
        let (x, y) = blobs(50);
        let config = SearchConfig::new().with_n_trials(6).with_folds(3).with_seed(11);
        let a = tune(&DecisionTreeFamily::default(), &x, &y, &config).unwrap();
        let b = tune(&DecisionTreeFamily::default(), &x, &y, &config).unwrap();
        assert_eq!(a.trials, b.trials);
        assert_eq!(a.best_params, b.best_params);
    }

    #[test]
    fn test_ties_go_to_earliest_trial() {
        // Every draw is identical, so every trial ties
        let (x, y) = blobs(40);
        let space_family = KnnFamily::new(KnnSpace {
            n_neighbors: Dimension::values(vec![3]),
            weights: Choice::of(vec![WeightScheme::Uniform]),
            metric: Choice::of(vec![DistanceMetric::Euclidean]),
        });
        let config = SearchConfig::new().with_n_trials(5).with_folds(4);
        let result = tune(&space_family, &x, &y, &config).unwrap();
        assert_eq!(result.best_trial, 0);
    }

    #[test]
    fn test_failed_trials_are_skipped() {
        // n_neighbors beyond any fold's training size fails for some draws
        let (x, y) = blobs(20);
        let family = KnnFamily::new(KnnSpace {
            n_neighbors: Dimension::values(vec![1, 500]),
            ..Default::default()
        });
        let config = SearchConfig::new().with_n_trials(12).with_folds(2);
        let result = tune(&family, &x, &y, &config).unwrap();
        assert!(result.n_failed > 0);
        assert_eq!(result.trial_scores.len() + result.n_failed, 12);
    }

    #[test]
    fn test_all_trials_failing() {
        let (x, y) = blobs(20);
        let family = KnnFamily::new(KnnSpace {
            n_neighbors: Dimension::values(vec![500]),
            ..Default::default()
        });
        let config = SearchConfig::new().with_n_trials(3).with_folds(2);
        let err = tune(&family, &x, &y, &config).unwrap_err();
        assert!(matches!(err, TissueError::SearchFailed { n_trials: 3, .. }));
    }

    #[test]
    fn test_guard_errors() {
        let (x, y) = blobs(20);
        let empty = KnnFamily::new(KnnSpace {
            n_neighbors: Dimension::values(vec![]),
            ..Default::default()
        });
        assert!(matches!(
            tune(&empty, &x, &y, &SearchConfig::new().with_n_trials(2)),
            Err(TissueError::EmptySearchSpace { .. })
        ));
        assert!(matches!(
            tune(&KnnFamily::default(), &x, &y, &SearchConfig::new().with_folds(1)),
            Err(TissueError::InvalidParameter { .. })
        ));
        assert!(matches!(
            tune(&KnnFamily::default(), &x, &y, &SearchConfig::new().with_folds(11)),
            Err(TissueError::InsufficientData { folds: 11, minority_count: 10 })
        ));
    }
}
