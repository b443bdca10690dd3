//! Decision tree classifier

use crate::error::{Result, TissueError};
use ndarray::{Array1, Array2, ArrayView1};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::classifier::{check_binary_labels, check_features, Classifier};

/// Gains at or below this are treated as no improvement
const MIN_GAIN: f64 = 1e-12;

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with majority class and positive-class share
    Leaf {
        value: f64,
        proba: f64,
        n_samples: usize,
    },
    /// Internal node with split
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
        impurity: f64,
    },
}

/// Impurity criterion
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    /// Gini impurity
    #[default]
    Gini,
    /// Shannon entropy (bits)
    Entropy,
    /// Log loss; scores splits identically to entropy
    LogLoss,
}

impl Criterion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Criterion::Gini => "gini",
            Criterion::Entropy => "entropy",
            Criterion::LogLoss => "log_loss",
        }
    }

    /// Impurity of a node from its `[negative, positive]` counts
    pub fn impurity(&self, counts: [usize; 2]) -> f64 {
        let total = counts[0] + counts[1];
        if total == 0 {
            return 0.0;
        }
        let n = total as f64;
        match self {
            Criterion::Gini => {
                let p0 = counts[0] as f64 / n;
                let p1 = counts[1] as f64 / n;
                1.0 - p0 * p0 - p1 * p1
            }
            Criterion::Entropy | Criterion::LogLoss => counts
                .iter()
                .filter(|&&c| c > 0)
                .map(|&c| {
                    let p = c as f64 / n;
                    -p * p.log2()
                })
                .sum(),
        }
    }
}

/// Number of features examined at each split
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    Sqrt,
    Log2,
    #[default]
    All,
    Fixed(usize),
}

impl MaxFeatures {
    pub fn as_str(&self) -> String {
        match self {
            MaxFeatures::Sqrt => "sqrt".to_string(),
            MaxFeatures::Log2 => "log2".to_string(),
            MaxFeatures::All => "all".to_string(),
            MaxFeatures::Fixed(k) => k.to_string(),
        }
    }

    /// Resolve against the total feature count; always at least one
    pub fn resolve(&self, n_features: usize) -> usize {
        let k = match self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().floor() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2().floor() as usize,
            MaxFeatures::All => n_features,
            MaxFeatures::Fixed(k) => *k,
        };
        k.clamp(1, n_features.max(1))
    }
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
}

/// Decision tree model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Tree root
    root: Option<TreeNode>,
    /// Maximum depth; `None` grows until leaves are pure or too small
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features considered at each split
    pub max_features: MaxFeatures,
    /// Impurity criterion
    pub criterion: Criterion,
    /// Seed for per-node feature subsets
    pub random_state: u64,
    /// Number of features
    n_features: usize,
    /// Feature importances
    feature_importances: Option<Array1<f64>>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
            criterion: Criterion::Gini,
            random_state: 42,
            n_features: 0,
            feature_importances: None,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Grow the tree on all rows of `x`
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let indices: Vec<usize> = (0..x.nrows()).collect();
        self.fit_indices(x, y, &indices)
    }

    /// Grow the tree on the given rows (duplicates allowed, as in a
    /// bootstrap sample)
    pub fn fit_indices(&mut self, x: &Array2<f64>, y: &Array1<f64>, indices: &[usize]) -> Result<&mut Self> {
        check_binary_labels(x, y)?;
        if indices.is_empty() {
            return Err(TissueError::InvalidInput("cannot fit on zero rows".to_string()));
        }
        if self.min_samples_split < 2 {
            return Err(TissueError::InvalidParameter {
                name: "min_samples_split".to_string(),
                value: self.min_samples_split.to_string(),
                reason: "must be at least 2".to_string(),
            });
        }
        if self.min_samples_leaf < 1 {
            return Err(TissueError::InvalidParameter {
                name: "min_samples_leaf".to_string(),
                value: self.min_samples_leaf.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_depth == Some(0) {
            return Err(TissueError::InvalidParameter {
                name: "max_depth".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let n_features = x.ncols();
        self.n_features = n_features;

        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state);
        let mut importances = vec![0.0; n_features];
        let root = self.build_tree(x, y, indices, 0, &mut importances, &mut rng);
        self.root = Some(root);

        // Normalize feature importances
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.feature_importances = Some(Array1::from_vec(importances));

        Ok(self)
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        importances: &mut [f64],
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n_samples = indices.len();
        let counts = class_counts(y, indices);

        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || counts[0] == 0
            || counts[1] == 0;

        if should_stop {
            return leaf(counts);
        }

        let features = self.candidate_features(rng);
        let parent_impurity = self.criterion.impurity(counts);

        let best = match self.find_best_split(x, y, indices, &features, counts, parent_impurity) {
            Some(best) => best,
            None => return leaf(counts),
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, best.feature_idx]] <= best.threshold);

        importances[best.feature_idx] += n_samples as f64 * best.gain;

        let left = Box::new(self.build_tree(x, y, &left_indices, depth + 1, importances, rng));
        let right = Box::new(self.build_tree(x, y, &right_indices, depth + 1, importances, rng));

        TreeNode::Split {
            feature_idx: best.feature_idx,
            threshold: best.threshold,
            left,
            right,
            n_samples,
            impurity: parent_impurity,
        }
    }

    /// Sorted random subset of feature indices for one node
    fn candidate_features(&self, rng: &mut ChaCha8Rng) -> Vec<usize> {
        let k = self.max_features.resolve(self.n_features);
        if k >= self.n_features {
            return (0..self.n_features).collect();
        }
        let mut chosen = rand::seq::index::sample(rng, self.n_features, k).into_vec();
        chosen.sort_unstable();
        chosen
    }

    /// Best split over the candidate features. Features are scanned in
    /// parallel; on equal gain the lower feature index wins.
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        features: &[usize],
        counts: [usize; 2],
        parent_impurity: f64,
    ) -> Option<SplitCandidate> {
        let per_feature: Vec<Option<SplitCandidate>> = features
            .par_iter()
            .map(|&feature_idx| {
                self.best_split_for_feature(x, y, indices, feature_idx, counts, parent_impurity)
            })
            .collect();

        per_feature
            .into_iter()
            .flatten()
            .fold(None, |best: Option<SplitCandidate>, cand| match best {
                Some(b) if b.gain >= cand.gain => Some(b),
                _ => Some(cand),
            })
    }

    /// Sort once, then sweep split points with running class counts
    fn best_split_for_feature(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        feature_idx: usize,
        counts: [usize; 2],
        parent_impurity: f64,
    ) -> Option<SplitCandidate> {
        let mut column: Vec<(f64, usize)> = indices
            .iter()
            .map(|&i| (x[[i, feature_idx]], class_of(y[i])))
            .collect();
        column.sort_by(|a, b| a.0.total_cmp(&b.0));

        let n = column.len();
        let mut left = [0usize; 2];
        let mut best: Option<SplitCandidate> = None;

        for i in 0..n.saturating_sub(1) {
            left[column[i].1] += 1;
            if column[i].0 == column[i + 1].0 {
                continue;
            }

            let n_left = i + 1;
            let n_right = n - n_left;
            if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                continue;
            }

            let right = [counts[0] - left[0], counts[1] - left[1]];
            let weighted = (n_left as f64 * self.criterion.impurity(left)
                + n_right as f64 * self.criterion.impurity(right))
                / n as f64;
            let gain = parent_impurity - weighted;

            if gain > best.map_or(MIN_GAIN, |b| b.gain) {
                best = Some(SplitCandidate {
                    feature_idx,
                    threshold: (column[i].0 + column[i + 1].0) / 2.0,
                    gain,
                });
            }
        }

        best
    }

    /// Positive-class probability per row
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(TissueError::ModelNotFitted)?;
        check_features(self.n_features, x)?;

        let probs: Vec<f64> = (0..x.nrows())
            .into_par_iter()
            .map(|i| match descend(root, x.row(i)) {
                TreeNode::Leaf { proba, .. } => *proba,
                TreeNode::Split { .. } => 0.0,
            })
            .collect();

        Ok(Array1::from_vec(probs))
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(TissueError::ModelNotFitted)?;
        check_features(self.n_features, x)?;

        let predictions: Vec<f64> = (0..x.nrows())
            .into_par_iter()
            .map(|i| match descend(root, x.row(i)) {
                TreeNode::Leaf { value, .. } => *value,
                TreeNode::Split { .. } => 0.0,
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }

    /// Get feature importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Number of split levels on the longest root-to-leaf path
    pub fn get_depth(&self) -> usize {
        match &self.root {
            None => 0,
            Some(node) => node_depth(node),
        }
    }

    /// Get number of leaves
    pub fn get_n_leaves(&self) -> usize {
        match &self.root {
            None => 0,
            Some(node) => count_leaves(node),
        }
    }
}

impl Classifier for DecisionTree {
    fn predict_labels(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.predict(x)
    }

    fn predict_scores(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.predict_proba(x)
    }

    fn n_features(&self) -> Option<usize> {
        self.root.as_ref().map(|_| self.n_features)
    }
}

fn class_of(label: f64) -> usize {
    if label > 0.5 { 1 } else { 0 }
}

fn class_counts(y: &Array1<f64>, indices: &[usize]) -> [usize; 2] {
    let mut counts = [0usize; 2];
    for &i in indices {
        counts[class_of(y[i])] += 1;
    }
    counts
}

/// Majority-class leaf; an even split goes to class 0
fn leaf(counts: [usize; 2]) -> TreeNode {
    let n_samples = counts[0] + counts[1];
    let proba = if n_samples > 0 {
        counts[1] as f64 / n_samples as f64
    } else {
        0.0
    };
    TreeNode::Leaf {
        value: if counts[1] > counts[0] { 1.0 } else { 0.0 },
        proba,
        n_samples,
    }
}

fn descend<'a>(mut node: &'a TreeNode, sample: ArrayView1<f64>) -> &'a TreeNode {
    while let TreeNode::Split { feature_idx, threshold, left, right, .. } = node {
        node = if sample[*feature_idx] <= *threshold { left } else { right };
    }
    node
}

fn node_depth(node: &TreeNode) -> usize {
    match node {
        TreeNode::Leaf { .. } => 0,
        TreeNode::Split { left, right, .. } => 1 + node_depth(left).max(node_depth(right)),
    }
}

fn count_leaves(node: &TreeNode) -> usize {
    match node {
        TreeNode::Leaf { .. } => 1,
        TreeNode::Split { left, right, .. } => count_leaves(left) + count_leaves(right),
    }
}
