//! Typed hyperparameter search spaces
//!
//! Each model family describes its space as a struct of dimensions. A
//! dimension is either an explicit candidate list ([`Choice`]) or, for
//! numeric hyperparameters, a candidate list or inclusive range
//! ([`Dimension`]). Empty dimensions are rejected before any trial runs.

use crate::error::{Result, TissueError};
use rand::distributions::uniform::SampleUniform;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A displayable hyperparameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Str(v) => write!(f, "{}", v),
        }
    }
}

impl From<usize> for ParamValue {
    fn from(v: usize) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

/// Hyperparameter name to value, ordered by name
pub type ParamMap = BTreeMap<String, ParamValue>;

/// A concrete hyperparameter configuration for one family
pub trait HyperParams: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync {
    /// Name/value view for display and trial records
    fn to_param_map(&self) -> ParamMap;
}

/// Anything a configuration can be sampled from
pub trait Sampled<T> {
    fn sample<R: Rng>(&self, rng: &mut R) -> T;

    /// True when the dimension has no candidate values
    fn is_empty(&self) -> bool;

    /// Human-readable candidate description
    fn describe(&self) -> String;

    /// Fail with [`TissueError::EmptySearchSpace`] if there is nothing to draw
    fn validate(&self, name: &str) -> Result<()> {
        if self.is_empty() {
            return Err(TissueError::EmptySearchSpace {
                dimension: name.to_string(),
            });
        }
        Ok(())
    }
}

/// Categorical dimension: an explicit list of candidate values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice<T>(pub Vec<T>);

impl<T> Choice<T> {
    pub fn of(values: Vec<T>) -> Self {
        Choice(values)
    }
}

impl<T: Clone + fmt::Debug> Sampled<T> for Choice<T> {
    fn sample<R: Rng>(&self, rng: &mut R) -> T {
        self.0[rng.gen_range(0..self.0.len())].clone()
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn describe(&self) -> String {
        format!("{:?}", self.0)
    }
}

/// Numeric dimension: a candidate list or an inclusive uniform range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Dimension<T> {
    Values(Vec<T>),
    Range { low: T, high: T },
}

impl<T> Dimension<T> {
    pub fn values(values: Vec<T>) -> Self {
        Dimension::Values(values)
    }

    pub fn range(low: T, high: T) -> Self {
        Dimension::Range { low, high }
    }
}

impl<T> Sampled<T> for Dimension<T>
where
    T: SampleUniform + PartialOrd + Copy + fmt::Debug,
{
    fn sample<R: Rng>(&self, rng: &mut R) -> T {
        match self {
            Dimension::Values(values) => values[rng.gen_range(0..values.len())],
            Dimension::Range { low, high } => rng.gen_range(*low..=*high),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Dimension::Values(values) => values.is_empty(),
            // NaN bounds compare false and count as empty
            Dimension::Range { low, high } => !(low <= high),
        }
    }

    fn describe(&self) -> String {
        match self {
            Dimension::Values(values) => format!("{:?}", values),
            Dimension::Range { low, high } => format!("{:?}..={:?}", low, high),
        }
    }
}

/// Name and candidate description of one dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionDescriptor {
    pub name: String,
    pub candidates: String,
}

/// Enumerable description of a whole space, for display
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpaceDescriptor {
    pub dimensions: Vec<DimensionDescriptor>,
}

impl SpaceDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dimension description
    pub fn with<T, D: Sampled<T>>(mut self, name: &str, dimension: &D) -> Self {
        self.dimensions.push(DimensionDescriptor {
            name: name.to_string(),
            candidates: dimension.describe(),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.dimensions.iter().map(|d| d.name.as_str()).collect()
    }
}

/// A family's full search space
pub trait SearchSpace: Clone + fmt::Debug + Serialize + Send + Sync {
    type Params: HyperParams;

    /// Reject spaces with an empty dimension
    fn validate(&self) -> Result<()>;

    /// Draw one configuration
    fn sample<R: Rng>(&self, rng: &mut R) -> Self::Params;

    fn describe(&self) -> SpaceDescriptor;
}
