//! End-to-end preprocessing: raw table to scaled and unscaled partitions

use crate::error::Result;
use super::{
    cleaning::{clean, CleanedDataset},
    config::PreprocessingConfig,
    scaler::{fit_scale, ScalerState},
    split::{train_test_split, Partition},
    Dataset,
};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

/// Everything downstream components read. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparedData {
    /// Unscaled partition (tree-based families)
    pub partition: Partition,
    /// Train rows scaled with train-only statistics
    pub train_scaled: Dataset,
    /// Test rows scaled with the same train-only statistics
    pub test_scaled: Dataset,
    pub scaler: ScalerState,
    pub dropped_columns: Vec<String>,
}

impl PreparedData {
    /// Training rows in the representation a model family expects
    pub fn train(&self, scaled: bool) -> &Dataset {
        if scaled { &self.train_scaled } else { &self.partition.train }
    }

    /// Test rows in the representation a model family expects
    pub fn test(&self, scaled: bool) -> &Dataset {
        if scaled { &self.test_scaled } else { &self.partition.test }
    }
}

/// Data preprocessing pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPreprocessor {
    config: PreprocessingConfig,
    /// Timing: seconds spent in last prepare call
    prepare_time: Option<f64>,
}

impl Default for DataPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl DataPreprocessor {
    /// Create a new preprocessor with default configuration
    pub fn new() -> Self {
        Self::with_config(PreprocessingConfig::default())
    }

    /// Create a new preprocessor with custom configuration
    pub fn with_config(config: PreprocessingConfig) -> Self {
        Self {
            config,
            prepare_time: None,
        }
    }

    pub fn config(&self) -> &PreprocessingConfig {
        &self.config
    }

    /// Clean the raw table
    pub fn clean(&self, raw: &DataFrame) -> Result<CleanedDataset> {
        clean(raw, &self.config)
    }

    /// Clean, binarize, split, and scale.
    pub fn prepare(&mut self, raw: &DataFrame) -> Result<PreparedData> {
        let start = Instant::now();

        let cleaned = self.clean(raw)?;
        let dropped_columns = cleaned.dropped_columns.clone();
        let dataset = cleaned.into_dataset(&self.config.positive_label);

        let partition = train_test_split(&dataset, self.config.test_fraction, self.config.split_seed)?;
        let scaler = fit_scale(&partition.train.x)?;
        let train_scaled = partition.train.with_features(scaler.transform(&partition.train.x)?)?;
        let test_scaled = partition.test.with_features(scaler.transform(&partition.test.x)?)?;

        info!(
            train = partition.train.n_samples(),
            test = partition.test.n_samples(),
            train_positive_rate = partition.train.positive_rate(),
            test_positive_rate = partition.test.positive_rate(),
            "Prepared partitions"
        );

        self.prepare_time = Some(start.elapsed().as_secs_f64());

        Ok(PreparedData {
            partition,
            train_scaled,
            test_scaled,
            scaler,
            dropped_columns,
        })
    }

    /// Seconds spent in the last `prepare` call
    pub fn prepare_time(&self) -> Option<f64> {
        self.prepare_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        let n = 20;
        let radius: Vec<f64> = (0..n).map(|i| 10.0 + i as f64).collect();
        let texture: Vec<f64> = (0..n).map(|i| 20.0 - (i as f64) * 0.5).collect();
        let diagnosis: Vec<&str> = (0..n).map(|i| if i % 4 == 0 { "M" } else { "B" }).collect();
        let ids: Vec<i64> = (0..n as i64).collect();
        df!(
            "id" => &ids,
            "diagnosis" => &diagnosis,
            "radius_mean" => &radius,
            "texture_mean" => &texture
        )
        .unwrap()
    }

    #[test]
    fn test_prepare_scales_with_train_statistics() {
        let mut pre = DataPreprocessor::with_config(PreprocessingConfig::default().with_test_fraction(0.25));
        let prepared = pre.prepare(&frame()).unwrap();

        let train_mean = prepared.train_scaled.x.column(0).mean().unwrap();
        assert!(train_mean.abs() < 1e-10);
        assert_eq!(prepared.test_scaled.n_samples(), prepared.partition.test.n_samples());
        assert_eq!(prepared.dropped_columns, vec!["id"]);
        assert!(pre.prepare_time().is_some());
    }

    #[test]
    fn test_representation_selection() {
        let mut pre = DataPreprocessor::new();
        let prepared = pre.prepare(&frame()).unwrap();
        assert_eq!(prepared.train(false), &prepared.partition.train);
        assert_eq!(prepared.train(true), &prepared.train_scaled);
        assert_eq!(prepared.test(true), &prepared.test_scaled);
    }
}
