//! Pipeline configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::Result;
use crate::optimizer::{LinearStrategy, SearchConfig, ThresholdConfig};
use crate::preprocessing::PreprocessingConfig;
use crate::training::{DecisionTreeSpace, KnnSpace, LogisticSpace, RandomForestSpace};

/// Supported model families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FamilyKind {
    Knn,
    LogisticRegression,
    DecisionTree,
    RandomForest,
}

impl FamilyKind {
    pub fn all() -> Vec<FamilyKind> {
        vec![
            FamilyKind::Knn,
            FamilyKind::LogisticRegression,
            FamilyKind::DecisionTree,
            FamilyKind::RandomForest,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FamilyKind::Knn => "knn",
            FamilyKind::LogisticRegression => "logistic_regression",
            FamilyKind::DecisionTree => "decision_tree",
            FamilyKind::RandomForest => "random_forest",
        }
    }
}

impl fmt::Display for FamilyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Search space per family
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSpaces {
    pub knn: KnnSpace,
    pub logistic_regression: LogisticSpace,
    pub decision_tree: DecisionTreeSpace,
    pub random_forest: RandomForestSpace,
}

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub preprocessing: PreprocessingConfig,
    pub search: SearchConfig,
    /// Families to tune, in run order
    pub families: Vec<FamilyKind>,
    pub linear_strategy: LinearStrategy,
    pub threshold: ThresholdConfig,
    pub spaces: SearchSpaces,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            preprocessing: PreprocessingConfig::default(),
            search: SearchConfig::default(),
            families: FamilyKind::all(),
            linear_strategy: LinearStrategy::default(),
            threshold: ThresholdConfig::default(),
            spaces: SearchSpaces::default(),
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn with_preprocessing(mut self, preprocessing: PreprocessingConfig) -> Self {
        self.preprocessing = preprocessing;
        self
    }

    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    pub fn with_families(mut self, families: Vec<FamilyKind>) -> Self {
        self.families = families;
        self
    }

    pub fn with_linear_strategy(mut self, strategy: LinearStrategy) -> Self {
        self.linear_strategy = strategy;
        self
    }

    pub fn with_threshold(mut self, threshold: ThresholdConfig) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_spaces(mut self, spaces: SearchSpaces) -> Self {
        self.spaces = spaces;
        self
    }
}
