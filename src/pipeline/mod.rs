//! End-to-end run: prepare the table, tune every family, evaluate on the
//! held-out rows, compare trial distributions.
//!
//! A failing family is recorded and logged while its siblings continue.
//! Only data-preparation errors abort the run.

mod config;

pub use config::{FamilyKind, PipelineConfig, SearchSpaces};

use polars::prelude::DataFrame;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::cache::{CacheKey, SearchCache};
use crate::comparison::{Comparator, FamilySummary};
use crate::error::Result;
use crate::evaluation::{EvaluationReport, Evaluator};
use crate::optimizer::{
    tune_threshold, Dimension, HyperParams, LinearStrategy, ParamMap, RandomSearch, SearchResult,
    SearchSpace, SpaceDescriptor, ThresholdResult,
};
use crate::preprocessing::{DataPreprocessor, PreparedData};
use crate::training::{
    DecisionTreeFamily, FittedModel, KnnFamily, LogisticFamily, LogisticParams, ModelFamily,
    RandomForestFamily, ThresholdSelection,
};

/// Per-family result of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct FamilyReport {
    pub family: String,
    /// Trained on standardized features
    pub scaled: bool,
    pub strategy: LinearStrategy,
    /// Candidates the family was tuned over
    pub search_space: SpaceDescriptor,
    pub best_params: ParamMap,
    /// Mean cross-validated accuracy of the chosen configuration
    pub cv_score: f64,
    /// Per-trial scores; absent when no search ran
    pub trial_scores: Option<Vec<f64>>,
    pub n_failed_trials: usize,
    pub threshold: Option<ThresholdSelection>,
    pub evaluation: EvaluationReport,
    /// Tree models only, most important first
    pub feature_importances: Option<Vec<FeatureImportance>>,
    pub model: FittedModel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Pair a model's importances with feature names, sorted descending.
/// Equal importances keep column order.
fn ranked_importances(model: &FittedModel, feature_names: &[String]) -> Option<Vec<FeatureImportance>> {
    let importances = model.feature_importances()?;
    let mut ranked: Vec<FeatureImportance> = feature_names
        .iter()
        .zip(importances.iter())
        .map(|(name, &importance)| FeatureImportance {
            feature: name.clone(),
            importance,
        })
        .collect();
    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    Some(ranked)
}

/// A family that produced no report
#[derive(Debug, Clone, Serialize)]
pub struct FamilyFailure {
    pub family: String,
    pub error: String,
}

/// Everything a run produced
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub n_train: usize,
    pub n_test: usize,
    pub feature_names: Vec<String>,
    pub dropped_columns: Vec<String>,
    pub reports: Vec<FamilyReport>,
    pub failures: Vec<FamilyFailure>,
    /// Ranked trial-score summaries, when the comparison succeeded
    pub comparison: Option<Vec<FamilySummary>>,
    pub comparison_error: Option<String>,
    pub duration_secs: f64,
}

impl PipelineOutcome {
    pub fn report(&self, family: &str) -> Option<&FamilyReport> {
        self.reports.iter().find(|r| r.family == family)
    }

    pub fn failure(&self, family: &str) -> Option<&FamilyFailure> {
        self.failures.iter().find(|f| f.family == family)
    }
}

/// Orchestrates preprocessing, tuning, evaluation and comparison
pub struct Pipeline {
    config: PipelineConfig,
    search_cache: SearchCache<SearchResult>,
    threshold_cache: SearchCache<ThresholdResult>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            search_cache: SearchCache::new(),
            threshold_cache: SearchCache::new(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Random-search results reused across runs of this pipeline
    pub fn search_cache(&self) -> &SearchCache<SearchResult> {
        &self.search_cache
    }

    /// Prepare `raw` and run every enabled family
    pub fn run(&self, raw: &DataFrame) -> Result<PipelineOutcome> {
        let mut preprocessor = DataPreprocessor::with_config(self.config.preprocessing.clone());
        let prepared = preprocessor.prepare(raw)?;
        Ok(self.run_prepared(&prepared))
    }

    /// Run every enabled family on already prepared partitions
    pub fn run_prepared(&self, prepared: &PreparedData) -> PipelineOutcome {
        let start = Instant::now();
        let mut reports = Vec::new();
        let mut failures = Vec::new();

        for &kind in &self.config.families {
            match self.run_family(kind, prepared) {
                Ok(report) => {
                    info!(
                        family = %kind,
                        cv_score = report.cv_score,
                        test_accuracy = report.evaluation.accuracy,
                        auc = report.evaluation.auc,
                        "Family complete"
                    );
                    reports.push(report);
                }
                Err(e) => {
                    error!(family = %kind, error = %e, "Family failed");
                    failures.push(FamilyFailure {
                        family: kind.to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let trial_scores: BTreeMap<String, Vec<f64>> = reports
            .iter()
            .filter_map(|r| r.trial_scores.as_ref().map(|s| (r.family.clone(), s.clone())))
            .collect();

        let (comparison, comparison_error) = if trial_scores.is_empty() {
            (None, None)
        } else {
            match Comparator::new().compare(&trial_scores) {
                Ok(ranked) => (Some(ranked), None),
                Err(e) => {
                    warn!(error = %e, "Comparison skipped");
                    (None, Some(e.to_string()))
                }
            }
        };

        let duration_secs = start.elapsed().as_secs_f64();
        info!(
            succeeded = reports.len(),
            failed = failures.len(),
            duration_secs,
            "Pipeline run complete"
        );

        PipelineOutcome {
            n_train: prepared.partition.train.n_samples(),
            n_test: prepared.partition.test.n_samples(),
            feature_names: prepared.partition.train.feature_names.clone(),
            dropped_columns: prepared.dropped_columns.clone(),
            reports,
            failures,
            comparison,
            comparison_error,
            duration_secs,
        }
    }

    fn run_family(&self, kind: FamilyKind, prepared: &PreparedData) -> Result<FamilyReport> {
        let spaces = &self.config.spaces;
        let seed = self.config.search.seed;

        match kind {
            FamilyKind::Knn => self.search_family(&KnnFamily::new(spaces.knn.clone()), prepared),
            FamilyKind::LogisticRegression => match self.config.linear_strategy {
                LinearStrategy::RandomSearch => {
                    self.search_family(&LogisticFamily::new(spaces.logistic_regression.clone()), prepared)
                }
                LinearStrategy::ThresholdSweep => self.sweep_logistic(prepared),
            },
            FamilyKind::DecisionTree => self.search_family(
                &DecisionTreeFamily::new(spaces.decision_tree.clone()).with_random_state(seed),
                prepared,
            ),
            FamilyKind::RandomForest => self.search_family(
                &RandomForestFamily::new(spaces.random_forest.clone()).with_random_state(seed),
                prepared,
            ),
        }
    }

    fn search_family<F: ModelFamily>(&self, family: &F, prepared: &PreparedData) -> Result<FamilyReport> {
        let scaled = family.requires_scaling();
        let train = prepared.train(scaled);
        let test = prepared.test(scaled);
        let search = &self.config.search;

        let key = CacheKey::for_family(family, &train.x, &train.y, search)?;
        let result = self.search_cache.get_or_search(&key, || {
            RandomSearch::new(search.clone()).tune(family, &train.x, &train.y)
        })?;

        let evaluation = Evaluator::new().evaluate(&result.best_model, &test.x, &test.y)?;
        let feature_importances = ranked_importances(&result.best_model, &train.feature_names);

        Ok(FamilyReport {
            family: result.family,
            scaled,
            strategy: LinearStrategy::RandomSearch,
            search_space: family.search_space().describe(),
            best_params: result.best_params,
            cv_score: result.best_score,
            trial_scores: Some(result.trial_scores),
            n_failed_trials: result.n_failed,
            threshold: None,
            evaluation,
            feature_importances,
            model: result.best_model,
        })
    }

    fn sweep_logistic(&self, prepared: &PreparedData) -> Result<FamilyReport> {
        let train = prepared.train(true);
        let test = prepared.test(true);
        let search = &self.config.search;

        let key = CacheKey::new(
            FamilyKind::LogisticRegression.as_str(),
            &(LogisticParams::default(), &self.config.threshold),
            &train.x,
            &train.y,
            search,
        )?;
        let result = self.threshold_cache.get_or_search(&key, || {
            tune_threshold(&train.x, &train.y, search, &self.config.threshold)
        })?;

        let evaluation = Evaluator::new().evaluate(&result.model, &test.x, &test.y)?;

        Ok(FamilyReport {
            family: FamilyKind::LogisticRegression.to_string(),
            scaled: true,
            strategy: LinearStrategy::ThresholdSweep,
            search_space: SpaceDescriptor::new()
                .with("threshold", &Dimension::values(self.config.threshold.thresholds.clone())),
            best_params: result.params.to_param_map(),
            cv_score: result.selection.accuracy,
            trial_scores: None,
            n_failed_trials: 0,
            threshold: Some(result.selection),
            evaluation,
            feature_importances: None,
            model: result.model,
        })
    }
}
