//! Hyperparameter search
//!
//! Provides:
//! - Typed search spaces with empty-dimension validation
//! - Seeded random search over stratified cross-validation folds
//! - Decision-threshold sweep for the logistic family

mod config;
pub mod search_space;
mod random_search;
mod threshold_sweep;

pub use config::{LinearStrategy, SearchConfig, ThresholdConfig};
pub use search_space::{
    Choice, Dimension, DimensionDescriptor, HyperParams, ParamMap, ParamValue, Sampled, SearchSpace,
    SpaceDescriptor,
};
pub use random_search::{tune, RandomSearch, SearchResult, TrialRecord};
pub use threshold_sweep::{tune_threshold, ThresholdResult};
