use std::fmt;

use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::config::GradientBoostingParams;
use crate::error::{ModelError, Result};

/// Least-squares gradient boosted trees backed by the `gbdt` crate.
///
/// `gbdt` works in `f32`; features and targets are narrowed on the way in and
/// predictions widened on the way out.
#[derive(Serialize, Deserialize)]
pub struct GradientBoosting {
    model: GBDT,
    n_features: usize,
}

impl fmt::Debug for GradientBoosting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GradientBoosting")
            .field("n_features", &self.n_features)
            .finish_non_exhaustive()
    }
}

fn to_data_vec(x: ArrayView2<'_, f64>, y: Option<ArrayView1<'_, f64>>) -> DataVec {
    let mut data = DataVec::with_capacity(x.nrows());
    for (i, row) in x.outer_iter().enumerate() {
        let features: Vec<f32> = row.iter().map(|&v| v as f32).collect();
        let label = y.map_or(0.0, |y| y[i] as f32);
        data.push(Data::new_training_data(features, 1.0, label, None));
    }
    data
}

impl GradientBoosting {
    pub fn fit(
        params: &GradientBoostingParams,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
    ) -> Result<Self> {
        if params.n_estimators == 0 || params.max_depth == 0 {
            return Err(ModelError::Fit(
                "gradient boosting needs at least one iteration of depth >= 1".to_string(),
            ));
        }
        if !(params.subsample > 0.0 && params.subsample <= 1.0) {
            return Err(ModelError::Fit(format!(
                "subsample must lie in (0, 1], got {}",
                params.subsample
            )));
        }

        let mut config = Config::new();
        config.set_feature_size(x.ncols());
        config.set_max_depth(params.max_depth);
        config.set_iterations(params.n_estimators);
        config.set_shrinkage(params.learning_rate);
        config.set_min_leaf_size(params.min_samples_leaf.max(1));
        config.set_data_sample_ratio(params.subsample);
        config.set_loss("SquaredError");
        config.set_debug(false);

        let mut model = GBDT::new(&config);
        let mut train = to_data_vec(x, Some(y));
        model.fit(&mut train);
        log::debug!(
            "Fitted gradient boosting with {} iterations of depth {}",
            params.n_estimators,
            params.max_depth
        );

        Ok(Self {
            model,
            n_features: x.ncols(),
        })
    }

    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        let data = to_data_vec(x, None);
        self.model
            .predict(&data)
            .into_iter()
            .map(f64::from)
            .collect()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_gradient_boosting_reduces_error() {
        let x = Array2::from_shape_fn((60, 2), |(i, j)| if j == 0 { i as f64 / 6.0 } else { 0.5 });
        let y = x.column(0).mapv(|v| 3.0 * v - 2.0);
        let model = GradientBoosting::fit(&GradientBoostingParams::default(), x.view(), y.view())
            .unwrap();
        let pred = model.predict(x.view());
        assert_eq!(pred.len(), 60);

        let mean = y.sum() / 60.0;
        let baseline: f64 = y.iter().map(|t| (t - mean).powi(2)).sum();
        let residual: f64 = pred.iter().zip(y.iter()).map(|(p, t)| (p - t).powi(2)).sum();
        assert!(residual < 0.1 * baseline, "{} vs {}", residual, baseline);
    }

    #[test]
    fn test_rejects_bad_subsample() {
        let x = Array2::<f64>::zeros((4, 1));
        let y = Array1::<f64>::zeros(4);
        let params = GradientBoostingParams {
            subsample: 1.5,
            ..GradientBoostingParams::default()
        };
        assert!(GradientBoosting::fit(&params, x.view(), y.view()).is_err());
    }
}
