//! Preprocessing configuration

use serde::{Deserialize, Serialize};

/// Configuration for cleaning, labeling and partitioning the raw table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessingConfig {
    /// Name of the diagnosis column
    pub label_column: String,

    /// Label value that marks the positive (malignant) class
    pub positive_label: String,

    /// Identifier columns dropped before training
    pub id_columns: Vec<String>,

    /// Fraction of rows held out for the test partition
    pub test_fraction: f64,

    /// Seed for the stratified train/test split
    pub split_seed: u64,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            label_column: "diagnosis".to_string(),
            positive_label: "M".to_string(),
            id_columns: vec!["id".to_string()],
            test_fraction: 0.3,
            split_seed: 42,
        }
    }
}

impl PreprocessingConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the label column
    pub fn with_label_column(mut self, column: impl Into<String>) -> Self {
        self.label_column = column.into();
        self
    }

    /// Builder method to set the positive label marker
    pub fn with_positive_label(mut self, label: impl Into<String>) -> Self {
        self.positive_label = label.into();
        self
    }

    /// Builder method to set the identifier columns
    pub fn with_id_columns(mut self, columns: Vec<&str>) -> Self {
        self.id_columns = columns.into_iter().map(String::from).collect();
        self
    }

    /// Builder method to set the test fraction
    pub fn with_test_fraction(mut self, fraction: f64) -> Self {
        self.test_fraction = fraction;
        self
    }

    /// Builder method to set the split seed
    pub fn with_split_seed(mut self, seed: u64) -> Self {
        self.split_seed = seed;
        self
    }
}
