//! Integration test: model families, random search, threshold tuning and evaluation

mod common;

use ndarray::{array, Array1, Array2};
use tissue_classifier::evaluation::{roc_auc, roc_curve, Evaluator};
use tissue_classifier::optimizer::{
    tune, tune_threshold, Choice, Dimension, ParamValue, SearchConfig, ThresholdConfig,
};
use tissue_classifier::preprocessing::{DataPreprocessor, PreparedData};
use tissue_classifier::training::{
    Classifier, DecisionTree, DecisionTreeFamily, DistanceMetric, FittedModel, KnnFamily, KnnSpace,
    RandomForest, RandomForestFamily, RandomForestSpace, WeightScheme,
};

fn prepared(seed: u64) -> PreparedData {
    DataPreprocessor::new().prepare(&common::tissue_frame(120, 80, seed)).unwrap()
}

fn small_forest_space() -> RandomForestSpace {
    RandomForestSpace {
        n_estimators: Dimension::values(vec![5, 10]),
        max_depth: Dimension::range(2, 6),
        ..RandomForestSpace::default()
    }
}

#[test]
fn test_knn_search_stays_in_space() {
    let data = prepared(1);
    let train = data.train(true);

    let space = KnnSpace {
        n_neighbors: Dimension::values(vec![1, 3, 5]),
        ..KnnSpace::default()
    };
    let config = SearchConfig::new().with_n_trials(12).with_folds(5);
    let result = tune(&KnnFamily::new(space), &train.x, &train.y, &config).unwrap();

    assert_eq!(result.trial_scores.len(), 12);
    assert_eq!(result.n_failed, 0);
    for trial in &result.trials {
        assert_eq!(trial.fold_scores.len(), 5);
        let k = &trial.params["n_neighbors"];
        assert!([1, 3, 5].iter().any(|&n| *k == ParamValue::Int(n)), "k = {k}");
    }

    let best = result
        .trial_scores
        .iter()
        .cloned()
        .fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(result.best_score, best);
    assert_eq!(result.trial_scores[result.best_trial], best);
    assert_eq!(result.best_model.family_name(), "knn");
}

#[test]
fn test_search_is_deterministic() {
    let data = prepared(2);
    let train = data.train(false);
    let config = SearchConfig::new().with_n_trials(6).with_folds(3).with_seed(11);
    let family = RandomForestFamily::new(small_forest_space());

    let a = tune(&family, &train.x, &train.y, &config).unwrap();
    let b = tune(&family, &train.x, &train.y, &config).unwrap();
    assert_eq!(a.trial_scores, b.trial_scores);
    assert_eq!(a.best_params, b.best_params);

    let test = data.test(false);
    assert_eq!(
        a.best_model.predict_scores(&test.x).unwrap(),
        b.best_model.predict_scores(&test.x).unwrap()
    );
}

#[test]
fn test_tree_family_tuned_and_evaluated() {
    let data = prepared(3);
    let config = SearchConfig::new().with_n_trials(8).with_folds(3);
    let result = tune(&DecisionTreeFamily::default(), &data.train(false).x, &data.train(false).y, &config).unwrap();

    let test = data.test(false);
    let report = Evaluator::new().evaluate(&result.best_model, &test.x, &test.y).unwrap();
    assert_eq!(report.confusion.total(), test.n_samples());
    assert!((0.0..=1.0).contains(&report.auc));
    assert!(report.accuracy > 0.6);
}

#[test]
fn test_perfect_classifier_scores_one() {
    let x = array![[1.0, 0.0], [1.2, 0.1], [0.9, 0.2], [5.0, 4.0], [5.5, 4.2], [6.0, 3.9]];
    let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
    let mut tree = DecisionTree::new();
    tree.fit(&x, &y).unwrap();

    let report = Evaluator::new().evaluate(&tree, &x, &y).unwrap();
    assert_eq!(report.precision, 1.0);
    assert_eq!(report.recall, 1.0);
    assert_eq!(report.f1, 1.0);
    assert_eq!(report.auc, 1.0);
    assert_eq!(report.confusion.fp + report.confusion.fn_, 0);
}

#[test]
fn test_roc_monotone_and_auc_rescale_invariant() {
    let data = prepared(4);
    let train = data.train(false);
    let test = data.test(false);

    let mut forest = RandomForest::new(15).with_random_state(5);
    forest.fit(&train.x, &train.y).unwrap();
    let scores = forest.predict_scores(&test.x).unwrap();

    let roc = roc_curve(&test.y, &scores).unwrap();
    assert_eq!((roc[0].fpr, roc[0].tpr), (0.0, 0.0));
    let last = roc.last().unwrap();
    assert_eq!((last.fpr, last.tpr), (1.0, 1.0));
    for w in roc.windows(2) {
        assert!(w[1].fpr >= w[0].fpr);
        assert!(w[1].tpr >= w[0].tpr);
    }

    let rescaled: Array1<f64> = scores.mapv(|s| 0.1 + 0.5 * s.powi(3));
    let a = roc_auc(&test.y, &scores).unwrap();
    let b = roc_auc(&test.y, &rescaled).unwrap();
    assert!((a - b).abs() < 1e-12);
}

#[test]
fn test_predictions_idempotent() {
    let data = prepared(5);
    let train = data.train(true);
    let test = data.test(true);

    let space = KnnSpace {
        n_neighbors: Dimension::values(vec![7]),
        weights: Choice::of(vec![WeightScheme::Distance]),
        metric: Choice::of(vec![DistanceMetric::Manhattan]),
    };
    let result = tune(&KnnFamily::new(space), &train.x, &train.y, &SearchConfig::new().with_n_trials(1).with_folds(3)).unwrap();

    let first = result.best_model.predict_labels(&test.x).unwrap();
    let second = result.best_model.predict_labels(&test.x).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_fitted_model_serde_keeps_predictions() {
    let data = prepared(6);
    let train = data.train(false);
    let test = data.test(false);
    let config = SearchConfig::new().with_n_trials(3).with_folds(3);
    let result = tune(&RandomForestFamily::new(small_forest_space()), &train.x, &train.y, &config).unwrap();

    let json = serde_json::to_string(&result.best_model).unwrap();
    assert!(json.contains("\"family\":\"random_forest\""));
    let restored: FittedModel = serde_json::from_str(&json).unwrap();

    assert_eq!(
        restored.predict_scores(&test.x).unwrap(),
        result.best_model.predict_scores(&test.x).unwrap()
    );
}

#[test]
fn test_threshold_sweep_on_training_rows() {
    let data = prepared(7);
    let train = data.train(true);

    let result = tune_threshold(&train.x, &train.y, &SearchConfig::new(), &ThresholdConfig::default()).unwrap();
    let selection = &result.selection;

    assert_eq!(selection.sweep.len(), 19);
    assert!(selection.accuracy >= selection.baseline_accuracy);
    if selection.threshold != 0.5 {
        assert!(selection.accuracy - selection.baseline_accuracy > 0.005);
    }
    assert_eq!(result.model.decision_threshold(), selection.threshold);
}

#[test]
fn test_threshold_sweep_keeps_default_without_gain() {
    // Separable data: every threshold in the sweep classifies perfectly
    let x: Array2<f64> = Array2::from_shape_fn((40, 1), |(i, _)| if i < 20 { -3.0 - i as f64 * 0.01 } else { 3.0 + i as f64 * 0.01 });
    let y: Array1<f64> = (0..40).map(|i| if i < 20 { 0.0 } else { 1.0 }).collect();

    let result = tune_threshold(&x, &y, &SearchConfig::new(), &ThresholdConfig::default()).unwrap();
    assert_eq!(result.selection.threshold, 0.5);
    assert_eq!(result.selection.baseline_accuracy, 1.0);
}
