//! Standard (z-score) feature scaling

use crate::error::{Result, TissueError};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Per-feature mean and standard deviation captured from the training rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerState {
    pub means: Array1<f64>,
    /// Population standard deviations; zero-variance features hold 1.0
    pub stds: Array1<f64>,
}

impl ScalerState {
    /// Number of features the state was fitted on
    pub fn n_features(&self) -> usize {
        self.means.len()
    }

    /// Apply `(x - mean) / std` column-wise.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.n_features() {
            return Err(TissueError::mismatch(
                format!("{} feature columns", self.n_features()),
                format!("{} feature columns", x.ncols()),
            ));
        }
        Ok((x - &self.means.view().insert_axis(Axis(0))) / &self.stds.view().insert_axis(Axis(0)))
    }

    /// Undo the scaling.
    pub fn inverse_transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.n_features() {
            return Err(TissueError::mismatch(
                format!("{} feature columns", self.n_features()),
                format!("{} feature columns", x.ncols()),
            ));
        }
        Ok(x * &self.stds.view().insert_axis(Axis(0)) + &self.means.view().insert_axis(Axis(0)))
    }
}

/// Fit scaling statistics. Only ever called with the training subset.
pub fn fit_scale(train_x: &Array2<f64>) -> Result<ScalerState> {
    if train_x.nrows() == 0 {
        return Err(TissueError::InvalidInput(
            "cannot fit scaler on zero rows".to_string(),
        ));
    }

    let means = train_x
        .mean_axis(Axis(0))
        .ok_or_else(|| TissueError::InvalidInput("cannot fit scaler on zero rows".to_string()))?;
    let stds = train_x
        .std_axis(Axis(0), 0.0)
        .mapv(|s| if s > 0.0 && s.is_finite() { s } else { 1.0 });

    Ok(ScalerState { means, stds })
}

/// Scale `x` with previously fitted statistics.
pub fn apply_scale(state: &ScalerState, x: &Array2<f64>) -> Result<Array2<f64>> {
    state.transform(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_standard_scaler() {
        let x = array![[1.0, 10.0], [2.0, 10.0], [3.0, 10.0], [4.0, 10.0], [5.0, 10.0]];
        let state = fit_scale(&x).unwrap();
        let scaled = apply_scale(&state, &x).unwrap();

        let mean = scaled.column(0).mean().unwrap();
        assert!(mean.abs() < 1e-10);
        let std = scaled.column(0).std(0.0);
        assert!((std - 1.0).abs() < 1e-10);
        // Constant column keeps unit scale instead of dividing by zero
        assert_eq!(state.stds[1], 1.0);
        assert!(scaled.column(1).iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn test_inverse_transform() {
        let x = array![[1.0, -3.0], [2.0, 0.5], [7.0, 2.0]];
        let state = fit_scale(&x).unwrap();
        let restored = state.inverse_transform(&state.transform(&x).unwrap()).unwrap();
        for (o, r) in x.iter().zip(restored.iter()) {
            assert!((o - r).abs() < 1e-10);
        }
    }

    #[test]
    fn test_column_mismatch() {
        let state = fit_scale(&array![[1.0, 2.0], [3.0, 4.0]]).unwrap();
        let err = apply_scale(&state, &array![[1.0, 2.0, 3.0]]).unwrap_err();
        assert!(matches!(err, TissueError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_empty_fit_rejected() {
        let x: Array2<f64> = Array2::zeros((0, 3));
        assert!(fit_scale(&x).is_err());
    }
}
