//! Held-out evaluation of fitted models

mod metrics;

pub use metrics::{
    accuracy, auc, classification_report, confusion, roc_auc, roc_curve, ClassificationReport,
    ConfusionMatrix, RocPoint,
};

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TissueError};
use crate::training::Classifier;

/// Everything measured for one model on one labelled set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub n_samples: usize,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub confusion: ConfusionMatrix,
    pub roc: Vec<RocPoint>,
    pub auc: f64,
    /// Score at which the model labels a sample malignant
    pub decision_threshold: f64,
}

/// Scores fitted models against held-out rows
#[derive(Debug, Clone, Copy, Default)]
pub struct Evaluator;

impl Evaluator {
    pub fn new() -> Self {
        Evaluator
    }

    /// Predict on `x` and compare with `y`
    pub fn evaluate<M: Classifier + ?Sized>(
        &self,
        model: &M,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<EvaluationReport> {
        let expected = model.n_features().ok_or(TissueError::ModelNotFitted)?;
        if x.ncols() != expected {
            return Err(TissueError::mismatch(
                format!("{} features", expected),
                format!("{} features", x.ncols()),
            ));
        }

        let labels = model.predict_labels(x)?;
        let scores = model.predict_scores(x)?;

        let confusion = confusion(y, &labels)?;
        let report = classification_report(y, &labels)?;
        let roc = roc_curve(y, &scores)?;
        let auc = auc(&roc);

        debug!(samples = y.len(), accuracy = report.accuracy, auc, "Evaluated model");

        Ok(EvaluationReport {
            n_samples: y.len(),
            accuracy: report.accuracy,
            precision: report.precision,
            recall: report.recall,
            f1: report.f1,
            confusion,
            roc,
            auc,
            decision_threshold: model.decision_threshold(),
        })
    }
}
