//! Raw table cleaning and label binarization

use crate::error::{Result, TissueError};
use super::{Dataset, PreprocessingConfig};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// A raw table reduced to complete numeric features plus the label column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanedDataset {
    /// Feature matrix, one row per sample
    pub features: Array2<f64>,
    /// Feature names in column order
    pub feature_names: Vec<String>,
    /// Raw label values, parallel to the feature rows
    pub labels: Vec<String>,
    /// Columns removed during cleaning (identifiers and fully empty columns)
    pub dropped_columns: Vec<String>,
}

impl CleanedDataset {
    /// Number of samples
    pub fn n_samples(&self) -> usize {
        self.features.nrows()
    }

    /// Binarize labels and produce the immutable (X, y) pair.
    pub fn into_dataset(self, positive_label: &str) -> Dataset {
        let y = binarize(&self.labels, positive_label);
        Dataset {
            x: self.features,
            y,
            feature_names: self.feature_names,
        }
    }
}

/// Clean a raw table.
///
/// Identifier columns and columns with no values at all are dropped. Any
/// remaining feature column with a missing (null or NaN) value fails with
/// [`TissueError::SchemaError`]; there is no imputation. The label column must
/// be present, complete, and take exactly two distinct values, one of them
/// the positive marker.
pub fn clean(raw: &DataFrame, config: &PreprocessingConfig) -> Result<CleanedDataset> {
    let n_rows = raw.height();
    if n_rows == 0 {
        return Err(TissueError::SchemaError("dataset has no rows".to_string()));
    }

    let column_names: Vec<String> = raw
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect();

    if !column_names.iter().any(|name| name == &config.label_column) {
        return Err(TissueError::SchemaError(format!(
            "label column '{}' not found",
            config.label_column
        )));
    }

    let mut dropped_columns = Vec::new();
    let mut feature_names = Vec::new();
    let mut feature_data: Vec<Vec<f64>> = Vec::new();

    for name in &column_names {
        if name == &config.label_column {
            continue;
        }
        if config.id_columns.iter().any(|id| id == name) {
            debug!(column = %name, "Dropping identifier column");
            dropped_columns.push(name.clone());
            continue;
        }

        let series = raw.column(name)?.as_materialized_series();
        if is_empty_column(series)? {
            debug!(column = %name, "Dropping fully empty column");
            dropped_columns.push(name.clone());
            continue;
        }

        let values = numeric_values(name, series)?;
        feature_names.push(name.clone());
        feature_data.push(values);
    }

    if feature_names.is_empty() {
        return Err(TissueError::SchemaError(
            "no feature columns remain after cleaning".to_string(),
        ));
    }

    let labels = label_values(raw, &config.label_column, &config.positive_label)?;

    let n_features = feature_names.len();
    let features = Array2::from_shape_fn((n_rows, n_features), |(i, j)| feature_data[j][i]);

    info!(
        rows = n_rows,
        features = n_features,
        dropped = dropped_columns.len(),
        "Cleaned dataset"
    );

    Ok(CleanedDataset {
        features,
        feature_names,
        labels,
        dropped_columns,
    })
}

/// Map raw labels to {0, 1}: the positive marker becomes 1, everything else 0.
pub fn binarize(labels: &[String], positive_label: &str) -> Array1<f64> {
    labels
        .iter()
        .map(|label| if label == positive_label { 1.0 } else { 0.0 })
        .collect()
}

/// A column counts as empty when every value is null, or NaN for float columns.
fn is_empty_column(series: &Series) -> Result<bool> {
    if series.null_count() == series.len() {
        return Ok(true);
    }
    if !matches!(series.dtype(), DataType::Float32 | DataType::Float64) {
        return Ok(false);
    }
    let as_f64 = series.cast(&DataType::Float64)?;
    let empty = as_f64.f64()?.into_iter().all(|v| v.map_or(true, f64::is_nan));
    Ok(empty)
}

fn numeric_values(name: &str, series: &Series) -> Result<Vec<f64>> {
    let null_count = series.null_count();
    if null_count > 0 {
        return Err(TissueError::SchemaError(format!(
            "feature column '{}' has {} missing value(s)",
            name, null_count
        )));
    }

    let as_f64 = series.strict_cast(&DataType::Float64).map_err(|_| {
        TissueError::SchemaError(format!(
            "feature column '{}' is not numeric ({})",
            name,
            series.dtype()
        ))
    })?;

    let mut values = Vec::with_capacity(as_f64.len());
    for (row, value) in as_f64.f64()?.into_iter().enumerate() {
        match value {
            Some(v) if v.is_finite() => values.push(v),
            _ => {
                return Err(TissueError::SchemaError(format!(
                    "feature column '{}' has a missing or non-finite value at row {}",
                    name, row
                )))
            }
        }
    }
    Ok(values)
}

fn label_values(raw: &DataFrame, label_column: &str, positive_label: &str) -> Result<Vec<String>> {
    let series = raw.column(label_column)?.as_materialized_series();
    if series.null_count() > 0 {
        return Err(TissueError::SchemaError(format!(
            "label column '{}' has {} missing value(s)",
            label_column,
            series.null_count()
        )));
    }

    let as_str = series.cast(&DataType::String)?;
    let labels: Vec<String> = as_str
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or_default().trim().to_string())
        .collect();

    let distinct: BTreeSet<&str> = labels.iter().map(|s| s.as_str()).collect();
    if distinct.len() != 2 {
        return Err(TissueError::SchemaError(format!(
            "label column '{}' must take exactly two distinct values, found {:?}",
            label_column, distinct
        )));
    }
    if !distinct.contains(positive_label) {
        return Err(TissueError::SchemaError(format!(
            "label column '{}' has no '{}' rows, found {:?}",
            label_column, positive_label, distinct
        )));
    }

    Ok(labels)
}
