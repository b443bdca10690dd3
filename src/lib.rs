//! Tissue classifier - model selection for malignant/benign tissue samples
//!
//! Turns a table of per-sample cell-nucleus measurements into tuned,
//! evaluated and compared binary classifiers:
//! - Cleaning, label binarization, stratified split and train-only scaling
//! - Randomized hyperparameter search with stratified cross-validation for
//!   KNN, logistic regression, decision tree and random forest
//! - Held-out evaluation (confusion matrix, precision/recall/F1, ROC/AUC)
//! - Cross-family comparison of trial-score distributions
//!
//! # Modules
//!
//! - [`preprocessing`] - Cleaning, splitting, scaling
//! - [`training`] - Classifiers, model families, cross-validation
//! - [`optimizer`] - Search spaces, random search, threshold tuning
//! - [`evaluation`] - Held-out metrics
//! - [`comparison`] - Trial-score summaries and ranking
//! - [`cache`] - Keyed cache of finished searches
//! - [`pipeline`] - End-to-end orchestration
//! - [`cli`] - Command-line interface

pub mod error;

pub mod preprocessing;
pub mod training;
pub mod optimizer;
pub mod evaluation;
pub mod comparison;

pub mod cache;
pub mod pipeline;
pub mod utils;

pub mod cli;

pub use error::{Result, TissueError};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{Result, TissueError};

    pub use crate::preprocessing::{DataPreprocessor, Dataset, PreparedData, PreprocessingConfig};

    pub use crate::training::{
        Classifier, DecisionTree, FittedModel, KNNClassifier, LogisticRegression, ModelFamily,
        RandomForest, StratifiedKFold,
    };

    pub use crate::optimizer::{
        tune, tune_threshold, LinearStrategy, RandomSearch, SearchConfig, SearchResult, SearchSpace,
        ThresholdConfig,
    };

    pub use crate::evaluation::{EvaluationReport, Evaluator};
    pub use crate::comparison::{Comparator, FamilySummary};
    pub use crate::cache::{CacheKey, SearchCache};
    pub use crate::pipeline::{FamilyKind, Pipeline, PipelineConfig, PipelineOutcome};
    pub use crate::utils::DataLoader;
}
