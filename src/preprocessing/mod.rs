//! Data preprocessing module
//!
//! Turns the raw tissue table into model-ready data:
//! - Cleaning (identifier and empty-column removal, completeness checks)
//! - Label binarization (malignant = 1, benign = 0)
//! - Stratified train/test partitioning
//! - Standard scaling fitted on the training rows only

mod config;
mod cleaning;
mod split;
mod scaler;
mod pipeline;

pub use config::PreprocessingConfig;
pub use cleaning::{clean, binarize, CleanedDataset};
pub use split::{train_test_split, Partition};
pub use scaler::{fit_scale, apply_scale, ScalerState};
pub use pipeline::{DataPreprocessor, PreparedData};

use crate::error::{Result, TissueError};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Feature matrix with its parallel binary label vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// One row per sample
    pub x: Array2<f64>,
    /// 1.0 = malignant, 0.0 = benign
    pub y: Array1<f64>,
    pub feature_names: Vec<String>,
}

impl Dataset {
    /// Create a dataset, checking that rows, labels and names line up
    pub fn new(x: Array2<f64>, y: Array1<f64>, feature_names: Vec<String>) -> Result<Self> {
        let dataset = Self { x, y, feature_names };
        dataset.check_shape()?;
        Ok(dataset)
    }

    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    /// Number of positive (malignant) samples
    pub fn n_positive(&self) -> usize {
        self.y.iter().filter(|&&v| v > 0.5).count()
    }

    /// Fraction of positive samples
    pub fn positive_rate(&self) -> f64 {
        if self.n_samples() == 0 {
            return 0.0;
        }
        self.n_positive() as f64 / self.n_samples() as f64
    }

    /// Copy out the given rows
    pub fn select_rows(&self, indices: &[usize]) -> Dataset {
        Dataset {
            x: self.x.select(Axis(0), indices),
            y: indices.iter().map(|&i| self.y[i]).collect(),
            feature_names: self.feature_names.clone(),
        }
    }

    /// Same rows and labels with a replacement feature matrix
    pub fn with_features(&self, x: Array2<f64>) -> Result<Dataset> {
        Dataset::new(x, self.y.clone(), self.feature_names.clone())
    }

    pub(crate) fn check_shape(&self) -> Result<()> {
        if self.x.nrows() != self.y.len() {
            return Err(TissueError::mismatch(
                format!("{} labels", self.x.nrows()),
                format!("{} labels", self.y.len()),
            ));
        }
        if !self.feature_names.is_empty() && self.feature_names.len() != self.x.ncols() {
            return Err(TissueError::mismatch(
                format!("{} feature names", self.x.ncols()),
                format!("{} feature names", self.feature_names.len()),
            ));
        }
        Ok(())
    }
}
