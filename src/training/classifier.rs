//! Common classifier interface and the fitted-model container

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TissueError};
use super::decision_tree::DecisionTree;
use super::knn::KNNClassifier;
use super::linear_models::LogisticRegression;
use super::random_forest::RandomForest;

/// Binary classifier over rows of a feature matrix.
///
/// Labels are `0.0` (benign) and `1.0` (malignant). Scores are the
/// estimated probability of the positive class.
pub trait Classifier {
    /// Hard 0/1 predictions
    fn predict_labels(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Positive-class scores in `[0, 1]`
    fn predict_scores(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Feature count seen at fit time, `None` before fitting
    fn n_features(&self) -> Option<usize>;

    /// Score at which `predict_labels` switches to the positive class
    fn decision_threshold(&self) -> f64 {
        0.5
    }
}

/// A trained model of any supported family
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "family", content = "model", rename_all = "snake_case")]
pub enum FittedModel {
    Knn(KNNClassifier),
    LogisticRegression(LogisticRegression),
    DecisionTree(DecisionTree),
    RandomForest(RandomForest),
}

impl FittedModel {
    pub fn family_name(&self) -> &'static str {
        match self {
            FittedModel::Knn(_) => "knn",
            FittedModel::LogisticRegression(_) => "logistic_regression",
            FittedModel::DecisionTree(_) => "decision_tree",
            FittedModel::RandomForest(_) => "random_forest",
        }
    }

    /// Impurity-based importances for tree models, one per feature
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        match self {
            FittedModel::DecisionTree(m) => m.feature_importances(),
            FittedModel::RandomForest(m) => m.feature_importances(),
            FittedModel::Knn(_) | FittedModel::LogisticRegression(_) => None,
        }
    }

    fn inner(&self) -> &dyn Classifier {
        match self {
            FittedModel::Knn(m) => m,
            FittedModel::LogisticRegression(m) => m,
            FittedModel::DecisionTree(m) => m,
            FittedModel::RandomForest(m) => m,
        }
    }
}

impl Classifier for FittedModel {
    fn predict_labels(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.inner().predict_labels(x)
    }

    fn predict_scores(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.inner().predict_scores(x)
    }

    fn n_features(&self) -> Option<usize> {
        self.inner().n_features()
    }

    fn decision_threshold(&self) -> f64 {
        self.inner().decision_threshold()
    }
}

/// Reject empty input, row/label mismatch, and labels other than 0/1
pub(crate) fn check_binary_labels(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() == 0 {
        return Err(TissueError::InvalidInput("cannot fit on zero rows".to_string()));
    }
    if x.nrows() != y.len() {
        return Err(TissueError::mismatch(
            format!("{} labels", x.nrows()),
            format!("{} labels", y.len()),
        ));
    }
    if let Some(bad) = y.iter().find(|&&v| v != 0.0 && v != 1.0) {
        return Err(TissueError::InvalidInput(format!(
            "labels must be 0 or 1, found {}",
            bad
        )));
    }
    Ok(())
}

/// Reject prediction input whose column count differs from training
pub(crate) fn check_features(expected: usize, x: &Array2<f64>) -> Result<()> {
    if x.ncols() != expected {
        return Err(TissueError::mismatch(
            format!("{} features", expected),
            format!("{} features", x.ncols()),
        ));
    }
    Ok(())
}
