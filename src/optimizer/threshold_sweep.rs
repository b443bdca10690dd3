//! Decision-threshold tuning for the logistic family

use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, TissueError};
use crate::training::{
    choose_threshold, FittedModel, LogisticParams, LogisticRegression, StratifiedKFold, ThresholdSelection,
};
use super::config::{SearchConfig, ThresholdConfig};

/// Default-configured logistic model with a tuned operating point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdResult {
    pub params: LogisticParams,
    /// Fitted on the full training set, carrying the chosen threshold
    pub model: FittedModel,
    pub selection: ThresholdSelection,
}

/// Fit the default logistic model and pick its threshold.
///
/// Candidate thresholds are scored on out-of-fold probabilities from the
/// same stratified folds the random search uses, so only training rows
/// ever inform the choice.
pub fn tune_threshold(
    x: &Array2<f64>,
    y: &Array1<f64>,
    search: &SearchConfig,
    config: &ThresholdConfig,
) -> Result<ThresholdResult> {
    if x.nrows() != y.len() {
        return Err(TissueError::mismatch(
            format!("{} labels", x.nrows()),
            format!("{} labels", y.len()),
        ));
    }

    let params = LogisticParams::default();
    let splits = StratifiedKFold::new(search.folds)
        .with_random_state(search.seed)
        .split(y)?;

    let fold_probabilities: Vec<(Vec<usize>, Array1<f64>)> = splits
        .par_iter()
        .map(|split| {
            let mut model = default_model(&params);
            model.fit(
                &x.select(Axis(0), &split.train_indices),
                &y.select(Axis(0), &split.train_indices),
            )?;
            let proba = model.predict_proba(&x.select(Axis(0), &split.test_indices))?;
            Ok((split.test_indices.clone(), proba))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut out_of_fold = Array1::<f64>::zeros(y.len());
    for (indices, proba) in &fold_probabilities {
        for (&i, &p) in indices.iter().zip(proba.iter()) {
            out_of_fold[i] = p;
        }
    }

    let selection = choose_threshold(&out_of_fold, y, &config.thresholds, config.min_improvement)?;

    let mut model = default_model(&params).with_threshold(selection.threshold);
    model.fit(x, y)?;

    info!(
        family = "logistic_regression",
        threshold = selection.threshold,
        cv_accuracy = selection.accuracy,
        baseline_accuracy = selection.baseline_accuracy,
        "Threshold sweep complete"
    );

    Ok(ThresholdResult {
        params,
        model: FittedModel::LogisticRegression(model),
        selection,
    })
}

fn default_model(params: &LogisticParams) -> LogisticRegression {
    LogisticRegression::new()
        .with_alpha(params.alpha)
        .with_max_iter(params.max_iter)
}
