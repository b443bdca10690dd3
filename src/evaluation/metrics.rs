//! Binary classification metrics

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TissueError};

/// Counts of a binary confusion matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub tn: usize,
    pub fp: usize,
    #[serde(rename = "fn")]
    pub fn_: usize,
    pub tp: usize,
}

impl ConfusionMatrix {
    /// `[[tn, fp], [fn, tp]]`, rows are true classes
    pub fn as_array(&self) -> [[usize; 2]; 2] {
        [[self.tn, self.fp], [self.fn_, self.tp]]
    }

    pub fn total(&self) -> usize {
        self.tn + self.fp + self.fn_ + self.tp
    }
}

/// Positive-class precision, recall and F1 plus overall accuracy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub accuracy: f64,
}

/// One point of a ROC curve. `threshold` is the score at or above which
/// samples count as positive; the first point uses `+inf`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RocPoint {
    pub threshold: f64,
    pub fpr: f64,
    pub tpr: f64,
}

fn check_lengths(labels: &Array1<f64>, other: &Array1<f64>) -> Result<()> {
    if labels.len() != other.len() {
        return Err(TissueError::mismatch(
            format!("{} values", labels.len()),
            format!("{} values", other.len()),
        ));
    }
    if labels.is_empty() {
        return Err(TissueError::InvalidInput("empty label vector".to_string()));
    }
    Ok(())
}

/// Confusion counts of hard predictions against true labels
pub fn confusion(labels: &Array1<f64>, predictions: &Array1<f64>) -> Result<ConfusionMatrix> {
    check_lengths(labels, predictions)?;

    let mut cm = ConfusionMatrix::default();
    for (&t, &p) in labels.iter().zip(predictions.iter()) {
        match (t > 0.5, p > 0.5) {
            (false, false) => cm.tn += 1,
            (false, true) => cm.fp += 1,
            (true, false) => cm.fn_ += 1,
            (true, true) => cm.tp += 1,
        }
    }
    Ok(cm)
}

/// Fraction of predictions equal to the true label
pub fn accuracy(labels: &Array1<f64>, predictions: &Array1<f64>) -> Result<f64> {
    let cm = confusion(labels, predictions)?;
    Ok((cm.tp + cm.tn) as f64 / cm.total() as f64)
}

/// Precision, recall and F1 for the positive class; a zero denominator
/// yields 0.0
pub fn classification_report(labels: &Array1<f64>, predictions: &Array1<f64>) -> Result<ClassificationReport> {
    let cm = confusion(labels, predictions)?;
    let (tp, fp, fn_) = (cm.tp as f64, cm.fp as f64, cm.fn_ as f64);

    let precision = if tp + fp > 0.0 { tp / (tp + fp) } else { 0.0 };
    let recall = if tp + fn_ > 0.0 { tp / (tp + fn_) } else { 0.0 };
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    Ok(ClassificationReport {
        precision,
        recall,
        f1,
        accuracy: (cm.tp + cm.tn) as f64 / cm.total() as f64,
    })
}

/// ROC curve from (0, 0) to (1, 1), one point per distinct score,
/// strictest threshold first. Tied scores move the curve in one step.
pub fn roc_curve(labels: &Array1<f64>, scores: &Array1<f64>) -> Result<Vec<RocPoint>> {
    check_lengths(labels, scores)?;

    let total_pos = labels.iter().filter(|&&l| l > 0.5).count();
    let total_neg = labels.len() - total_pos;
    if total_pos == 0 || total_neg == 0 {
        return Err(TissueError::InvalidInput(
            "ROC is undefined when only one class is present".to_string(),
        ));
    }
    if let Some(bad) = scores.iter().find(|s| s.is_nan()) {
        return Err(TissueError::InvalidInput(format!("score {} is not comparable", bad)));
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let p = total_pos as f64;
    let n = total_neg as f64;

    let mut points = vec![RocPoint {
        threshold: f64::INFINITY,
        fpr: 0.0,
        tpr: 0.0,
    }];

    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut i = 0;
    while i < order.len() {
        let threshold = scores[order[i]];
        while i < order.len() && scores[order[i]] == threshold {
            if labels[order[i]] > 0.5 {
                tp += 1;
            } else {
                fp += 1;
            }
            i += 1;
        }
        points.push(RocPoint {
            threshold,
            fpr: fp as f64 / n,
            tpr: tp as f64 / p,
        });
    }

    Ok(points)
}

/// Trapezoidal area under a ROC curve
pub fn auc(points: &[RocPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| (w[1].fpr - w[0].fpr) * (w[1].tpr + w[0].tpr) / 2.0)
        .sum()
}

/// Convenience: ROC AUC straight from labels and scores
pub fn roc_auc(labels: &Array1<f64>, scores: &Array1<f64>) -> Result<f64> {
    Ok(auc(&roc_curve(labels, scores)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_confusion_layout() {
        let labels = array![0.0, 0.0, 1.0, 1.0, 1.0];
        let preds = array![0.0, 1.0, 0.0, 1.0, 1.0];
        let cm = confusion(&labels, &preds).unwrap();
        assert_eq!(cm.as_array(), [[1, 1], [1, 2]]);
        assert_eq!(cm.total(), 5);
    }

    #[test]
    fn test_report_zero_denominators() {
        let labels = array![0.0, 0.0, 1.0];
        let preds = array![0.0, 0.0, 0.0];
        let report = classification_report(&labels, &preds).unwrap();
        assert_eq!(report.precision, 0.0);
        assert_eq!(report.recall, 0.0);
        assert_eq!(report.f1, 0.0);
        assert!((report.accuracy - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_roc_perfect_separation() {
        let labels = array![0.0, 0.0, 1.0, 1.0];
        let scores = array![0.1, 0.2, 0.8, 0.9];
        let points = roc_curve(&labels, &scores).unwrap();
        assert_eq!(points.first().map(|p| (p.fpr, p.tpr)), Some((0.0, 0.0)));
        assert_eq!(points.last().map(|p| (p.fpr, p.tpr)), Some((1.0, 1.0)));
        assert!((auc(&points) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_roc_ties_are_one_step() {
        let labels = array![0.0, 1.0, 0.0, 1.0];
        let scores = array![0.5, 0.5, 0.5, 0.5];
        let points = roc_curve(&labels, &scores).unwrap();
        assert_eq!(points.len(), 2);
        assert!((auc(&points) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_roc_is_monotone() {
        let labels = array![1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 1.0];
        let scores = array![0.9, 0.8, 0.7, 0.6, 0.55, 0.3, 0.2, 0.1];
        let points = roc_curve(&labels, &scores).unwrap();
        for w in points.windows(2) {
            assert!(w[1].fpr >= w[0].fpr);
            assert!(w[1].tpr >= w[0].tpr);
        }
        let area = auc(&points);
        assert!((0.0..=1.0).contains(&area));
    }

    #[test]
    fn test_single_class_roc_rejected() {
        let labels = array![1.0, 1.0];
        let scores = array![0.2, 0.9];
        assert!(matches!(roc_curve(&labels, &scores), Err(TissueError::InvalidInput(_))));
    }

    #[test]
    fn test_length_mismatch() {
        let err = confusion(&array![0.0, 1.0], &array![1.0]).unwrap_err();
        assert!(matches!(err, TissueError::DimensionMismatch { .. }));
    }
}
