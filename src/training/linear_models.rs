//! Logistic regression and decision-threshold tuning

use crate::error::{Result, TissueError};
use super::classifier::{check_binary_labels, check_features, Classifier};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Logistic regression for binary classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Fitted coefficients
    pub coefficients: Option<Array1<f64>>,
    /// Fitted intercept
    pub intercept: Option<f64>,
    /// Regularization strength (L2)
    pub alpha: f64,
    /// Maximum iterations
    pub max_iter: usize,
    /// Convergence tolerance
    pub tol: f64,
    /// Learning rate
    pub learning_rate: f64,
    /// Probability at or above which a sample is labelled positive
    pub threshold: f64,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LogisticRegression {
    /// Create a new logistic regression model
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: None,
            alpha: 0.01,
            max_iter: 1000,
            tol: 1e-6,
            learning_rate: 0.1,
            threshold: 0.5,
        }
    }

    /// Set regularization strength
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set maximum iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set learning rate
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Set the decision threshold
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn is_fitted(&self) -> bool {
        self.coefficients.is_some()
    }

    /// Sigmoid function
    fn sigmoid(z: &Array1<f64>) -> Array1<f64> {
        z.mapv(|v| 1.0 / (1.0 + (-v).exp()))
    }

    /// Fit the model using full-batch gradient descent
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        check_binary_labels(x, y)?;
        if !(self.alpha >= 0.0) || !self.alpha.is_finite() {
            return Err(TissueError::InvalidParameter {
                name: "alpha".to_string(),
                value: self.alpha.to_string(),
                reason: "must be a finite non-negative number".to_string(),
            });
        }
        if self.max_iter == 0 {
            return Err(TissueError::InvalidParameter {
                name: "max_iter".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let n_samples = x.nrows();
        let n_features = x.ncols();

        let mut weights = Array1::<f64>::zeros(n_features);
        let mut bias = 0.0;

        let lr = self.learning_rate;
        let alpha = self.alpha;

        for _iter in 0..self.max_iter {
            let linear = x.dot(&weights) + bias;
            let predictions = Self::sigmoid(&linear);

            let errors = &predictions - y;
            let dw = (x.t().dot(&errors) / n_samples as f64) + (alpha * &weights);
            let db = errors.mean().unwrap_or(0.0);

            let grad_norm = (dw.mapv(|v| v * v).sum() + db * db).sqrt();
            if grad_norm < self.tol {
                break;
            }

            weights = weights - lr * dw;
            bias -= lr * db;
        }

        self.coefficients = Some(weights);
        self.intercept = Some(bias);

        Ok(self)
    }

    /// Predict probabilities
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self.coefficients.as_ref().ok_or(TissueError::ModelNotFitted)?;
        check_features(coefficients.len(), x)?;
        let intercept = self.intercept.unwrap_or(0.0);

        let linear = x.dot(coefficients) + intercept;
        Ok(Self::sigmoid(&linear))
    }

    /// Predict class labels using the model's threshold
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(apply_threshold(&proba, self.threshold))
    }
}

impl Classifier for LogisticRegression {
    fn predict_labels(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.predict(x)
    }

    fn predict_scores(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.predict_proba(x)
    }

    fn n_features(&self) -> Option<usize> {
        self.coefficients.as_ref().map(|c| c.len())
    }

    fn decision_threshold(&self) -> f64 {
        self.threshold
    }
}

/// Label a sample positive when its probability is at least `threshold`
pub fn apply_threshold(probabilities: &Array1<f64>, threshold: f64) -> Array1<f64> {
    probabilities.mapv(|p| if p >= threshold { 1.0 } else { 0.0 })
}

/// Accuracy obtained at one candidate threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdScore {
    pub threshold: f64,
    pub accuracy: f64,
}

/// Outcome of a threshold sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSelection {
    /// Threshold the final model uses
    pub threshold: f64,
    /// Accuracy at the chosen threshold
    pub accuracy: f64,
    /// Accuracy at the default 0.5 threshold
    pub baseline_accuracy: f64,
    pub sweep: Vec<ThresholdScore>,
}

/// Accuracy for each candidate threshold, in the order given.
pub fn sweep_threshold(
    probabilities: &Array1<f64>,
    true_labels: &Array1<f64>,
    thresholds: &[f64],
) -> Result<Vec<ThresholdScore>> {
    if probabilities.len() != true_labels.len() {
        return Err(TissueError::mismatch(
            format!("{} labels", probabilities.len()),
            format!("{} labels", true_labels.len()),
        ));
    }
    if probabilities.is_empty() {
        return Err(TissueError::InvalidInput("cannot sweep thresholds over zero samples".to_string()));
    }
    if thresholds.is_empty() {
        return Err(TissueError::InvalidInput("no candidate thresholds".to_string()));
    }

    Ok(thresholds
        .iter()
        .map(|&threshold| ThresholdScore {
            threshold,
            accuracy: accuracy_at(probabilities, true_labels, threshold),
        })
        .collect())
}

/// Pick the sweep's best threshold if it beats 0.5 by more than
/// `min_improvement`; otherwise keep 0.5. Ties go to the earlier candidate.
pub fn choose_threshold(
    probabilities: &Array1<f64>,
    true_labels: &Array1<f64>,
    thresholds: &[f64],
    min_improvement: f64,
) -> Result<ThresholdSelection> {
    let sweep = sweep_threshold(probabilities, true_labels, thresholds)?;
    let baseline_accuracy = accuracy_at(probabilities, true_labels, 0.5);

    let best = sweep.iter().fold(None, |best: Option<ThresholdScore>, s| match best {
        Some(b) if b.accuracy >= s.accuracy => Some(b),
        _ => Some(*s),
    });

    let (threshold, accuracy) = match best {
        Some(b) if b.accuracy > baseline_accuracy + min_improvement => (b.threshold, b.accuracy),
        _ => (0.5, baseline_accuracy),
    };

    Ok(ThresholdSelection {
        threshold,
        accuracy,
        baseline_accuracy,
        sweep,
    })
}

fn accuracy_at(probabilities: &Array1<f64>, true_labels: &Array1<f64>, threshold: f64) -> f64 {
    let correct = probabilities
        .iter()
        .zip(true_labels.iter())
        .filter(|(&p, &t)| (if p >= threshold { 1.0 } else { 0.0 }) == t)
        .count();
    correct as f64 / probabilities.len() as f64
}
