//! Error types for the tissue classifier pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, TissueError>;

/// Main error type for the pipeline
#[derive(Error, Debug)]
pub enum TissueError {
    /// Malformed or incomplete input data. Aborts the run.
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// A hyperparameter dimension has no candidate values.
    #[error("Empty search space: dimension '{dimension}' has no candidate values")]
    EmptySearchSpace { dimension: String },

    /// Not enough samples of the minority class for the requested folds.
    #[error("Insufficient data: {folds} folds requested but minority class has {minority_count} samples")]
    InsufficientData { folds: usize, minority_count: usize },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    #[error("Incomparable trial counts: {details}")]
    IncomparableTrialCounts { details: String },

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Every trial of a search failed.
    #[error("Search failed for {family}: all {n_trials} trials failed")]
    SearchFailed { family: String, n_trials: usize },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TissueError {
    /// Shorthand for a length/shape mismatch.
    pub fn mismatch(expected: impl ToString, actual: impl ToString) -> Self {
        TissueError::DimensionMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

impl From<polars::error::PolarsError> for TissueError {
    fn from(err: polars::error::PolarsError) -> Self {
        TissueError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for TissueError {
    fn from(err: serde_json::Error) -> Self {
        TissueError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for TissueError {
    fn from(err: ndarray::ShapeError) -> Self {
        TissueError::DimensionMismatch {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
