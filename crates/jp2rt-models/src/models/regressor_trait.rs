use ndarray::{Array1, ArrayView2};

use crate::error::{ModelError, Result};

/// Contract shared by every fitted ensemble regressor. Fitting goes through
/// [`crate::models::fit_regressor`]; a fitted model is read-only.
pub trait RegressorModel {
    /// Number of columns the model was fitted on.
    fn n_features(&self) -> usize;

    /// Predict without checking the input width.
    fn predict_unchecked(&self, x: ArrayView2<'_, f64>) -> Array1<f64>;

    /// Predict one value per row of `x`.
    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        if x.ncols() != self.n_features() {
            return Err(ModelError::FeatureCountMismatch {
                expected: self.n_features(),
                found: x.ncols(),
            });
        }
        Ok(self.predict_unchecked(x))
    }

    /// Family name as listed by the model registry.
    fn name(&self) -> &str {
        "regressor"
    }
}
