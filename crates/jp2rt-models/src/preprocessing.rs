//! Fitted preprocessing stages of the training pipeline.
//!
//! Every stage is fitted once through [`Transformer::fit`] and is immutable
//! afterwards: `transform` only replays the parameters frozen at fit time.
//! Non-finite values (NaN, infinities) count as missing everywhere.

use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// A preprocessing stage with a fit-once, transform-many contract.
pub trait Transformer: Sized {
    /// Fit the stage on `x` (rows are samples).
    fn fit(x: ArrayView2<'_, f64>) -> Result<Self>;

    /// Apply the fitted parameters to `x`.
    fn transform(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>>;

    /// Number of columns the stage expects as input.
    fn n_features_in(&self) -> usize;

    fn fit_transform(x: ArrayView2<'_, f64>) -> Result<(Self, Array2<f64>)> {
        let stage = Self::fit(x)?;
        let out = stage.transform(x)?;
        Ok((stage, out))
    }
}

fn check_width(expected: usize, x: &ArrayView2<'_, f64>) -> Result<()> {
    if x.ncols() != expected {
        return Err(ModelError::FeatureCountMismatch {
            expected,
            found: x.ncols(),
        });
    }
    Ok(())
}

fn check_not_empty(x: &ArrayView2<'_, f64>) -> Result<()> {
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(ModelError::Fit(format!(
            "cannot fit on an empty {}x{} matrix",
            x.nrows(),
            x.ncols()
        )));
    }
    Ok(())
}

/// Drops the columns that have no observed value at fit time.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ColumnDrop {
    n_features_in: usize,
    dropped: Vec<usize>,
    kept: Vec<usize>,
}

impl ColumnDrop {
    /// Indices of the columns removed by this stage.
    pub fn dropped(&self) -> &[usize] {
        &self.dropped
    }

    pub fn n_features_out(&self) -> usize {
        self.kept.len()
    }
}

impl Transformer for ColumnDrop {
    fn fit(x: ArrayView2<'_, f64>) -> Result<Self> {
        check_not_empty(&x)?;
        let (dropped, kept): (Vec<usize>, Vec<usize>) = (0..x.ncols())
            .partition(|&c| x.column(c).iter().all(|v| !v.is_finite()));
        if kept.is_empty() {
            return Err(ModelError::Fit(
                "every feature column is entirely missing".to_string(),
            ));
        }
        if !dropped.is_empty() {
            log::debug!(
                "Dropping {} of {} all-missing feature columns: {:?}",
                dropped.len(),
                x.ncols(),
                dropped
            );
        }
        Ok(Self {
            n_features_in: x.ncols(),
            dropped,
            kept,
        })
    }

    fn transform(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        check_width(self.n_features_in, &x)?;
        Ok(x.select(Axis(1), &self.kept))
    }

    fn n_features_in(&self) -> usize {
        self.n_features_in
    }
}

/// Replaces missing values with the per-column mean of the observed values.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MeanImputer {
    pub means: Vec<f64>,
}

impl Transformer for MeanImputer {
    fn fit(x: ArrayView2<'_, f64>) -> Result<Self> {
        check_not_empty(&x)?;
        let mut means = Vec::with_capacity(x.ncols());
        for (c, column) in x.axis_iter(Axis(1)).enumerate() {
            let (sum, count) = column
                .iter()
                .filter(|v| v.is_finite())
                .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
            if count == 0 {
                return Err(ModelError::Fit(format!(
                    "cannot impute column {} without observed values",
                    c
                )));
            }
            means.push(sum / count as f64);
        }
        Ok(Self { means })
    }

    fn transform(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        check_width(self.means.len(), &x)?;
        let mut out = x.to_owned();
        for (mut column, &mean) in out.axis_iter_mut(Axis(1)).zip(&self.means) {
            column.mapv_inplace(|v| if v.is_finite() { v } else { mean });
        }
        Ok(out)
    }

    fn n_features_in(&self) -> usize {
        self.means.len()
    }
}

/// Simple standard scaler (per-column mean/std).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Columns with a smaller standard deviation are only centered.
    const MIN_STD: f64 = 1e-12;
}

impl Transformer for StandardScaler {
    fn fit(x: ArrayView2<'_, f64>) -> Result<Self> {
        check_not_empty(&x)?;
        let nrows = x.nrows() as f64;
        let mut mean = Vec::with_capacity(x.ncols());
        let mut scale = Vec::with_capacity(x.ncols());
        for column in x.axis_iter(Axis(1)) {
            let m = column.sum() / nrows;
            let var = column.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / nrows;
            let std = var.sqrt();
            if !std.is_finite() {
                return Err(ModelError::Fit(
                    "non-finite values reached the scaler".to_string(),
                ));
            }
            mean.push(m);
            scale.push(if std < Self::MIN_STD { 1.0 } else { std });
        }
        Ok(Self { mean, scale })
    }

    fn transform(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        check_width(self.mean.len(), &x)?;
        let mut out = x.to_owned();
        for ((mut column, &m), &s) in out
            .axis_iter_mut(Axis(1))
            .zip(&self.mean)
            .zip(&self.scale)
        {
            column.mapv_inplace(|v| (v - m) / s);
        }
        Ok(out)
    }

    fn n_features_in(&self) -> usize {
        self.mean.len()
    }
}
