//! Model families: one typed search space and one fitting routine each

use ndarray::{Array1, Array2};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::optimizer::search_space::{
    Choice, Dimension, HyperParams, ParamMap, ParamValue, Sampled, SearchSpace, SpaceDescriptor,
};
use super::classifier::FittedModel;
use super::decision_tree::{Criterion, DecisionTree, MaxFeatures};
use super::knn::{DistanceMetric, KNNClassifier, KNNConfig, WeightScheme};
use super::linear_models::LogisticRegression;
use super::random_forest::RandomForest;

/// Shared interface every searchable model family implements
pub trait ModelFamily: Send + Sync {
    type Params: HyperParams;
    type Space: SearchSpace<Params = Self::Params>;

    /// Stable family identifier
    fn name(&self) -> &'static str;

    /// Whether the family trains on standardized features
    fn requires_scaling(&self) -> bool;

    fn search_space(&self) -> &Self::Space;

    /// Seed fixed on every fitted model, for families whose fitting is randomized
    fn random_state(&self) -> Option<u64> {
        None
    }

    /// Draw one configuration from the family's space
    fn sample<R: Rng>(&self, rng: &mut R) -> Self::Params {
        self.search_space().sample(rng)
    }

    /// Fit a model with the given configuration
    fn fit(&self, params: &Self::Params, x: &Array2<f64>, y: &Array1<f64>) -> Result<FittedModel>;
}

// ---------------------------------------------------------------------------
// KNN
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnnParams {
    pub n_neighbors: usize,
    pub weights: WeightScheme,
    pub metric: DistanceMetric,
}

impl HyperParams for KnnParams {
    fn to_param_map(&self) -> ParamMap {
        let mut map = ParamMap::new();
        map.insert("n_neighbors".to_string(), self.n_neighbors.into());
        map.insert("weights".to_string(), self.weights.as_str().into());
        map.insert("metric".to_string(), self.metric.as_str().into());
        map
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnnSpace {
    pub n_neighbors: Dimension<usize>,
    pub weights: Choice<WeightScheme>,
    pub metric: Choice<DistanceMetric>,
}

impl Default for KnnSpace {
    fn default() -> Self {
        Self {
            n_neighbors: Dimension::range(1, 30),
            weights: Choice::of(vec![WeightScheme::Uniform, WeightScheme::Distance]),
            metric: Choice::of(vec![DistanceMetric::Euclidean, DistanceMetric::Manhattan]),
        }
    }
}

impl SearchSpace for KnnSpace {
    type Params = KnnParams;

    fn validate(&self) -> Result<()> {
        self.n_neighbors.validate("n_neighbors")?;
        self.weights.validate("weights")?;
        self.metric.validate("metric")
    }

    fn sample<R: Rng>(&self, rng: &mut R) -> KnnParams {
        KnnParams {
            n_neighbors: self.n_neighbors.sample(rng),
            weights: self.weights.sample(rng),
            metric: self.metric.sample(rng),
        }
    }

    fn describe(&self) -> SpaceDescriptor {
        SpaceDescriptor::new()
            .with("n_neighbors", &self.n_neighbors)
            .with("weights", &self.weights)
            .with("metric", &self.metric)
    }
}

#[derive(Debug, Clone, Default)]
pub struct KnnFamily {
    space: KnnSpace,
}

impl KnnFamily {
    pub fn new(space: KnnSpace) -> Self {
        Self { space }
    }
}

impl ModelFamily for KnnFamily {
    type Params = KnnParams;
    type Space = KnnSpace;

    fn name(&self) -> &'static str {
        "knn"
    }

    fn requires_scaling(&self) -> bool {
        true
    }

    fn search_space(&self) -> &KnnSpace {
        &self.space
    }

    fn fit(&self, params: &KnnParams, x: &Array2<f64>, y: &Array1<f64>) -> Result<FittedModel> {
        let mut model = KNNClassifier::new(KNNConfig {
            n_neighbors: params.n_neighbors,
            metric: params.metric,
            weights: params.weights,
        });
        model.fit(x, y)?;
        Ok(FittedModel::Knn(model))
    }
}

// ---------------------------------------------------------------------------
// Logistic regression
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    pub alpha: f64,
    pub max_iter: usize,
}

impl Default for LogisticParams {
    fn default() -> Self {
        let model = LogisticRegression::new();
        Self {
            alpha: model.alpha,
            max_iter: model.max_iter,
        }
    }
}

impl HyperParams for LogisticParams {
    fn to_param_map(&self) -> ParamMap {
        let mut map = ParamMap::new();
        map.insert("alpha".to_string(), self.alpha.into());
        map.insert("max_iter".to_string(), self.max_iter.into());
        map
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticSpace {
    pub alpha: Dimension<f64>,
    pub max_iter: Dimension<usize>,
}

impl Default for LogisticSpace {
    fn default() -> Self {
        Self {
            alpha: Dimension::values(vec![1e-4, 1e-3, 1e-2, 1e-1, 1.0]),
            max_iter: Dimension::values(vec![200, 500, 1000]),
        }
    }
}

impl SearchSpace for LogisticSpace {
    type Params = LogisticParams;

    fn validate(&self) -> Result<()> {
        self.alpha.validate("alpha")?;
        self.max_iter.validate("max_iter")
    }

    fn sample<R: Rng>(&self, rng: &mut R) -> LogisticParams {
        LogisticParams {
            alpha: self.alpha.sample(rng),
            max_iter: self.max_iter.sample(rng),
        }
    }

    fn describe(&self) -> SpaceDescriptor {
        SpaceDescriptor::new()
            .with("alpha", &self.alpha)
            .with("max_iter", &self.max_iter)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LogisticFamily {
    space: LogisticSpace,
}

impl LogisticFamily {
    pub fn new(space: LogisticSpace) -> Self {
        Self { space }
    }
}

impl ModelFamily for LogisticFamily {
    type Params = LogisticParams;
    type Space = LogisticSpace;

    fn name(&self) -> &'static str {
        "logistic_regression"
    }

    fn requires_scaling(&self) -> bool {
        true
    }

    fn search_space(&self) -> &LogisticSpace {
        &self.space
    }

    fn fit(&self, params: &LogisticParams, x: &Array2<f64>, y: &Array1<f64>) -> Result<FittedModel> {
        let mut model = LogisticRegression::new()
            .with_alpha(params.alpha)
            .with_max_iter(params.max_iter);
        model.fit(x, y)?;
        Ok(FittedModel::LogisticRegression(model))
    }
}

// ---------------------------------------------------------------------------
// Decision tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTreeParams {
    pub max_depth: usize,
    pub criterion: Criterion,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
}

impl HyperParams for DecisionTreeParams {
    fn to_param_map(&self) -> ParamMap {
        let mut map = ParamMap::new();
        map.insert("max_depth".to_string(), self.max_depth.into());
        map.insert("criterion".to_string(), self.criterion.as_str().into());
        map.insert("min_samples_split".to_string(), self.min_samples_split.into());
        map.insert("min_samples_leaf".to_string(), self.min_samples_leaf.into());
        map.insert("max_features".to_string(), ParamValue::Str(self.max_features.as_str()));
        map
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTreeSpace {
    pub max_depth: Dimension<usize>,
    pub criterion: Choice<Criterion>,
    pub min_samples_split: Dimension<usize>,
    pub min_samples_leaf: Dimension<usize>,
    pub max_features: Choice<MaxFeatures>,
}

impl Default for DecisionTreeSpace {
    fn default() -> Self {
        Self {
            max_depth: Dimension::range(1, 20),
            criterion: Choice::of(vec![Criterion::Gini, Criterion::Entropy, Criterion::LogLoss]),
            min_samples_split: Dimension::range(2, 20),
            min_samples_leaf: Dimension::range(1, 10),
            max_features: Choice::of(vec![MaxFeatures::Sqrt, MaxFeatures::Log2, MaxFeatures::All]),
        }
    }
}

impl SearchSpace for DecisionTreeSpace {
    type Params = DecisionTreeParams;

    fn validate(&self) -> Result<()> {
        self.max_depth.validate("max_depth")?;
        self.criterion.validate("criterion")?;
        self.min_samples_split.validate("min_samples_split")?;
        self.min_samples_leaf.validate("min_samples_leaf")?;
        self.max_features.validate("max_features")
    }

    fn sample<R: Rng>(&self, rng: &mut R) -> DecisionTreeParams {
        DecisionTreeParams {
            max_depth: self.max_depth.sample(rng),
            criterion: self.criterion.sample(rng),
            min_samples_split: self.min_samples_split.sample(rng),
            min_samples_leaf: self.min_samples_leaf.sample(rng),
            max_features: self.max_features.sample(rng),
        }
    }

    fn describe(&self) -> SpaceDescriptor {
        SpaceDescriptor::new()
            .with("max_depth", &self.max_depth)
            .with("criterion", &self.criterion)
            .with("min_samples_split", &self.min_samples_split)
            .with("min_samples_leaf", &self.min_samples_leaf)
            .with("max_features", &self.max_features)
    }
}

#[derive(Debug, Clone)]
pub struct DecisionTreeFamily {
    space: DecisionTreeSpace,
    random_state: u64,
}

impl Default for DecisionTreeFamily {
    fn default() -> Self {
        Self::new(DecisionTreeSpace::default())
    }
}

impl DecisionTreeFamily {
    pub fn new(space: DecisionTreeSpace) -> Self {
        Self { space, random_state: 42 }
    }

    /// Seed for per-node feature subsets of every fitted tree
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }
}

impl ModelFamily for DecisionTreeFamily {
    type Params = DecisionTreeParams;
    type Space = DecisionTreeSpace;

    fn name(&self) -> &'static str {
        "decision_tree"
    }

    fn requires_scaling(&self) -> bool {
        false
    }

    fn search_space(&self) -> &DecisionTreeSpace {
        &self.space
    }

    fn random_state(&self) -> Option<u64> {
        Some(self.random_state)
    }

    fn fit(&self, params: &DecisionTreeParams, x: &Array2<f64>, y: &Array1<f64>) -> Result<FittedModel> {
        let mut model = DecisionTree::new()
            .with_max_depth(params.max_depth)
            .with_criterion(params.criterion)
            .with_min_samples_split(params.min_samples_split)
            .with_min_samples_leaf(params.min_samples_leaf)
            .with_max_features(params.max_features)
            .with_random_state(self.random_state);
        model.fit(x, y)?;
        Ok(FittedModel::DecisionTree(model))
    }
}

// ---------------------------------------------------------------------------
// Random forest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestParams {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub criterion: Criterion,
    pub max_features: MaxFeatures,
    pub min_samples_leaf: usize,
    pub bootstrap: bool,
}

impl HyperParams for RandomForestParams {
    fn to_param_map(&self) -> ParamMap {
        let mut map = ParamMap::new();
        map.insert("n_estimators".to_string(), self.n_estimators.into());
        map.insert("max_depth".to_string(), self.max_depth.into());
        map.insert("criterion".to_string(), self.criterion.as_str().into());
        map.insert("max_features".to_string(), ParamValue::Str(self.max_features.as_str()));
        map.insert("min_samples_leaf".to_string(), self.min_samples_leaf.into());
        map.insert("bootstrap".to_string(), self.bootstrap.into());
        map
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestSpace {
    pub n_estimators: Dimension<usize>,
    pub max_depth: Dimension<usize>,
    pub criterion: Choice<Criterion>,
    pub max_features: Choice<MaxFeatures>,
    pub min_samples_leaf: Dimension<usize>,
    pub bootstrap: Choice<bool>,
}

impl Default for RandomForestSpace {
    fn default() -> Self {
        Self {
            n_estimators: Dimension::range(10, 100),
            max_depth: Dimension::range(1, 20),
            criterion: Choice::of(vec![Criterion::Gini, Criterion::Entropy, Criterion::LogLoss]),
            max_features: Choice::of(vec![MaxFeatures::Log2, MaxFeatures::Sqrt]),
            min_samples_leaf: Dimension::range(1, 5),
            bootstrap: Choice::of(vec![true, false]),
        }
    }
}

impl SearchSpace for RandomForestSpace {
    type Params = RandomForestParams;

    fn validate(&self) -> Result<()> {
        self.n_estimators.validate("n_estimators")?;
        self.max_depth.validate("max_depth")?;
        self.criterion.validate("criterion")?;
        self.max_features.validate("max_features")?;
        self.min_samples_leaf.validate("min_samples_leaf")?;
        self.bootstrap.validate("bootstrap")
    }

    fn sample<R: Rng>(&self, rng: &mut R) -> RandomForestParams {
        RandomForestParams {
            n_estimators: self.n_estimators.sample(rng),
            max_depth: self.max_depth.sample(rng),
            criterion: self.criterion.sample(rng),
            max_features: self.max_features.sample(rng),
            min_samples_leaf: self.min_samples_leaf.sample(rng),
            bootstrap: self.bootstrap.sample(rng),
        }
    }

    fn describe(&self) -> SpaceDescriptor {
        SpaceDescriptor::new()
            .with("n_estimators", &self.n_estimators)
            .with("max_depth", &self.max_depth)
            .with("criterion", &self.criterion)
            .with("max_features", &self.max_features)
            .with("min_samples_leaf", &self.min_samples_leaf)
            .with("bootstrap", &self.bootstrap)
    }
}

#[derive(Debug, Clone)]
pub struct RandomForestFamily {
    space: RandomForestSpace,
    random_state: u64,
}

impl Default for RandomForestFamily {
    fn default() -> Self {
        Self::new(RandomForestSpace::default())
    }
}

impl RandomForestFamily {
    pub fn new(space: RandomForestSpace) -> Self {
        Self { space, random_state: 42 }
    }

    /// Base seed for bootstrap draws and per-tree feature subsets
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }
}

impl ModelFamily for RandomForestFamily {
    type Params = RandomForestParams;
    type Space = RandomForestSpace;

    fn name(&self) -> &'static str {
        "random_forest"
    }

    fn requires_scaling(&self) -> bool {
        false
    }

    fn search_space(&self) -> &RandomForestSpace {
        &self.space
    }

    fn random_state(&self) -> Option<u64> {
        Some(self.random_state)
    }

    fn fit(&self, params: &RandomForestParams, x: &Array2<f64>, y: &Array1<f64>) -> Result<FittedModel> {
        let mut model = RandomForest::new(params.n_estimators)
            .with_max_depth(params.max_depth)
            .with_criterion(params.criterion)
            .with_max_features(params.max_features)
            .with_min_samples_leaf(params.min_samples_leaf)
            .with_bootstrap(params.bootstrap)
            .with_random_state(self.random_state);
        model.fit(x, y)?;
        Ok(FittedModel::RandomForest(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TissueError;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_default_spaces_are_valid() {
        assert!(KnnSpace::default().validate().is_ok());
        assert!(LogisticSpace::default().validate().is_ok());
        assert!(DecisionTreeSpace::default().validate().is_ok());
        assert!(RandomForestSpace::default().validate().is_ok());
    }

    #[test]
    fn test_empty_dimension_is_named() {
        let space = RandomForestSpace {
            bootstrap: Choice::of(vec![]),
            ..Default::default()
        };
        let err = space.validate().unwrap_err();
        assert!(matches!(err, TissueError::EmptySearchSpace { ref dimension } if dimension == "bootstrap"));
    }

    #[test]
    fn test_samples_respect_bounds() {
        let family = DecisionTreeFamily::default();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..100 {
            let p = family.sample(&mut rng);
            assert!((1..=20).contains(&p.max_depth));
            assert!((2..=20).contains(&p.min_samples_split));
            assert!((1..=10).contains(&p.min_samples_leaf));
        }
    }

    #[test]
    fn test_sampling_is_seeded() {
        let family = RandomForestFamily::default();
        let draw = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            (0..10).map(|_| family.sample(&mut rng)).collect::<Vec<_>>()
        };
        assert_eq!(draw(5), draw(5));
    }

    #[test]
    fn test_param_map_names() {
        let params = KnnParams {
            n_neighbors: 7,
            weights: WeightScheme::Distance,
            metric: DistanceMetric::Manhattan,
        };
        let map = params.to_param_map();
        assert_eq!(map["n_neighbors"].to_string(), "7");
        assert_eq!(map["weights"].to_string(), "distance");
        assert_eq!(map["metric"].to_string(), "manhattan");
    }

    #[test]
    fn test_family_fit_dispatch() {
        let x = ndarray::array![[0.0, 1.0], [0.2, 0.8], [1.0, 0.0], [0.9, 0.1]];
        let y = ndarray::array![0.0, 0.0, 1.0, 1.0];
        let family = KnnFamily::default();
        let model = family
            .fit(
                &KnnParams { n_neighbors: 1, weights: WeightScheme::Uniform, metric: DistanceMetric::Euclidean },
                &x,
                &y,
            )
            .unwrap();
        assert_eq!(model.family_name(), "knn");
        assert!(family.requires_scaling());
        assert!(!DecisionTreeFamily::default().requires_scaling());
    }

    #[test]
    fn test_space_serializes() {
        let json = serde_json::to_string(&KnnSpace::default()).unwrap();
        let back: KnnSpace = serde_json::from_str(&json).unwrap();
        assert_eq!(back, KnnSpace::default());
    }
}
