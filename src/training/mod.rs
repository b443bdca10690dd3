//! Model training module
//!
//! Binary classifiers for the tissue data and the family layer that
//! connects each one to its search space:
//! - K-Nearest Neighbors
//! - Logistic regression with a tunable decision threshold
//! - Decision trees and Random Forests
//! - Stratified k-fold cross-validation

mod classifier;
mod families;
pub mod cross_validation;
pub mod linear_models;
pub mod decision_tree;
pub mod random_forest;
pub mod knn;

pub use classifier::{Classifier, FittedModel};
pub use families::{
    DecisionTreeFamily, DecisionTreeParams, DecisionTreeSpace, KnnFamily, KnnParams, KnnSpace,
    LogisticFamily, LogisticParams, LogisticSpace, ModelFamily, RandomForestFamily,
    RandomForestParams, RandomForestSpace,
};
pub use cross_validation::{minority_class_count, CVResults, CVSplit, StratifiedKFold};
pub use linear_models::{
    apply_threshold, choose_threshold, sweep_threshold, LogisticRegression, ThresholdScore,
    ThresholdSelection,
};
pub use decision_tree::{Criterion, DecisionTree, MaxFeatures, TreeNode};
pub use random_forest::RandomForest;
pub use knn::{DistanceMetric, KNNClassifier, KNNConfig, WeightScheme};
