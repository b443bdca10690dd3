//! Cross-family comparison of per-trial score distributions
//!
//! Advisory only: rankings summarize the search, they do not choose the
//! model that gets evaluated.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Result, TissueError};

/// Normal-approximation multiplier for a 95% interval
const Z_95: f64 = 1.96;

/// Mean and 95% confidence half-width of one family's trial scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilySummary {
    pub family: String,
    pub mean: f64,
    pub half_width: f64,
    pub n_trials: usize,
}

impl FamilySummary {
    pub fn lower(&self) -> f64 {
        self.mean - self.half_width
    }

    pub fn upper(&self) -> f64 {
        self.mean + self.half_width
    }
}

/// `(mean, half_width)` with half-width = 1.96 × sample std / √n.
/// A single score has zero half-width.
pub fn summarize(scores: &[f64]) -> Result<(f64, f64)> {
    if scores.is_empty() {
        return Err(TissueError::InvalidInput("empty score array".to_string()));
    }
    let n = scores.len() as f64;
    let mean = scores.iter().sum::<f64>() / n;
    if scores.len() == 1 {
        return Ok((mean, 0.0));
    }
    let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Ok((mean, Z_95 * variance.sqrt() / n.sqrt()))
}

/// Order by descending mean; equal means by family name
pub fn rank(mut summaries: Vec<FamilySummary>) -> Vec<FamilySummary> {
    summaries.sort_by(|a, b| b.mean.total_cmp(&a.mean).then_with(|| a.family.cmp(&b.family)));
    summaries
}

/// Compares families whose searches ran the same number of trials
#[derive(Debug, Clone, Copy, Default)]
pub struct Comparator;

impl Comparator {
    pub fn new() -> Self {
        Comparator
    }

    /// Summarize and rank every family. All score arrays must be non-empty
    /// and of equal length.
    pub fn compare(&self, scores: &BTreeMap<String, Vec<f64>>) -> Result<Vec<FamilySummary>> {
        if let Some((family, _)) = scores.iter().find(|(_, s)| s.is_empty()) {
            return Err(TissueError::InvalidInput(format!("family {} has no trial scores", family)));
        }

        let lengths: BTreeMap<&str, usize> = scores.iter().map(|(k, v)| (k.as_str(), v.len())).collect();
        let mut distinct: Vec<usize> = lengths.values().copied().collect();
        distinct.sort_unstable();
        distinct.dedup();
        if distinct.len() > 1 {
            let details = lengths
                .iter()
                .map(|(k, n)| format!("{}={}", k, n))
                .collect::<Vec<_>>()
                .join(", ");
            return Err(TissueError::IncomparableTrialCounts { details });
        }

        let summaries = scores
            .iter()
            .map(|(family, s)| {
                let (mean, half_width) = summarize(s)?;
                Ok(FamilySummary {
                    family: family.clone(),
                    mean,
                    half_width,
                    n_trials: s.len(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(rank(summaries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(pairs: &[(&str, Vec<f64>)]) -> BTreeMap<String, Vec<f64>> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_summarize() {
        let (mean, hw) = summarize(&[0.9, 0.92, 0.94]).unwrap();
        assert!((mean - 0.92).abs() < 1e-12);
        // sample std = 0.02
        assert!((hw - 1.96 * 0.02 / 3f64.sqrt()).abs() < 1e-12);

        assert_eq!(summarize(&[0.7]).unwrap(), (0.7, 0.0));
        assert!(summarize(&[]).is_err());
    }

    #[test]
    fn test_rank_order_and_ties() {
        let ranked = Comparator::new()
            .compare(&scores(&[
                ("knn", vec![0.9, 0.9]),
                ("decision_tree", vec![0.95, 0.95]),
                ("random_forest", vec![0.9, 0.9]),
            ]))
            .unwrap();
        let names: Vec<&str> = ranked.iter().map(|s| s.family.as_str()).collect();
        assert_eq!(names, vec!["decision_tree", "knn", "random_forest"]);
    }

    #[test]
    fn test_unequal_counts() {
        let err = Comparator::new()
            .compare(&scores(&[("knn", vec![0.9; 100]), ("random_forest", vec![0.9; 99])]))
            .unwrap_err();
        match err {
            TissueError::IncomparableTrialCounts { details } => {
                assert!(details.contains("knn=100"));
                assert!(details.contains("random_forest=99"));
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_empty_array() {
        let err = Comparator::new().compare(&scores(&[("knn", vec![])])).unwrap_err();
        assert!(matches!(err, TissueError::InvalidInput(_)));
    }
}
