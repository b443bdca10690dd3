//! Search configuration

use serde::{Deserialize, Serialize};

/// Configuration for randomized hyperparameter search
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Number of configurations drawn per family
    pub n_trials: usize,

    /// Stratified cross-validation folds per trial
    pub folds: usize,

    /// Seed for configuration draws and fold assignment
    pub seed: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            n_trials: 100,
            folds: 5,
            seed: 42,
        }
    }
}

impl SearchConfig {
    /// Create a new configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set number of trials
    pub fn with_n_trials(mut self, n: usize) -> Self {
        self.n_trials = n;
        self
    }

    /// Builder method to set fold count
    pub fn with_folds(mut self, folds: usize) -> Self {
        self.folds = folds;
        self
    }

    /// Builder method to set the seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// How the logistic family chooses its final model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LinearStrategy {
    /// Default-configured model; only the decision threshold is tuned
    #[default]
    ThresholdSweep,
    /// Same randomized search as the other families
    RandomSearch,
}

/// Candidate thresholds and the margin a candidate must beat 0.5 by
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub thresholds: Vec<f64>,
    pub min_improvement: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            // 0.05, 0.10, ..., 0.95
            thresholds: (1..20).map(|i| i as f64 * 0.05).collect(),
            min_improvement: 0.005,
        }
    }
}

impl ThresholdConfig {
    pub fn with_thresholds(mut self, thresholds: Vec<f64>) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_min_improvement(mut self, min_improvement: f64) -> Self {
        self.min_improvement = min_improvement;
        self
    }
}
