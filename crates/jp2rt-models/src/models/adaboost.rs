use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::distributions::{Distribution, WeightedIndex};
use serde::{Deserialize, Serialize};

use crate::config::{AdaBoostLoss, AdaBoostParams};
use crate::error::{ModelError, Result};
use crate::models::forest::master_rng;
use crate::models::tree::{Tree, TreeParams};

/// AdaBoost.R2 (Drucker, 1997) over shallow regression trees.
///
/// Each round fits a tree on a weighted bootstrap sample, scores its
/// normalized loss on the full training set and re-weights the rows so that
/// poorly predicted ones are drawn more often. Predictions are the weighted
/// median of the tree predictions.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AdaBoost {
    estimators: Vec<Tree>,
    weights: Vec<f64>,
    n_features: usize,
}

impl AdaBoost {
    pub fn fit(params: &AdaBoostParams, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<Self> {
        if params.n_estimators == 0 {
            return Err(ModelError::Fit("n_estimators must be positive".to_string()));
        }
        if !(params.learning_rate > 0.0) {
            return Err(ModelError::Fit(format!(
                "learning_rate must be positive, got {}",
                params.learning_rate
            )));
        }

        let n = x.nrows();
        let tree_params = TreeParams::shallow(params.max_depth, x.ncols());
        let mut rng = master_rng(params.seed);
        let mut sample_weight = vec![1.0 / n as f64; n];
        let mut estimators = Vec::with_capacity(params.n_estimators);
        let mut weights = Vec::with_capacity(params.n_estimators);

        for round in 0..params.n_estimators {
            let dist = WeightedIndex::new(&sample_weight)
                .map_err(|e| ModelError::Fit(format!("invalid sample weights: {}", e)))?;
            let samples: Vec<usize> = (0..n).map(|_| dist.sample(&mut rng)).collect();
            let tree = Tree::fit(x, y, samples, &tree_params, &mut rng);

            let pred = tree.predict(x);
            let mut error: Vec<f64> = pred.iter().zip(y.iter()).map(|(p, t)| (p - t).abs()).collect();
            let error_max = error.iter().cloned().fold(0.0, f64::max);
            if error_max > 0.0 {
                error.iter_mut().for_each(|e| *e /= error_max);
            }
            match params.loss {
                AdaBoostLoss::Linear => {}
                AdaBoostLoss::Square => error.iter_mut().for_each(|e| *e *= *e),
                AdaBoostLoss::Exponential => error.iter_mut().for_each(|e| *e = 1.0 - (-*e).exp()),
            }
            let estimator_error: f64 = sample_weight.iter().zip(&error).map(|(w, e)| w * e).sum();

            if estimator_error <= 0.0 {
                log::debug!("AdaBoost round {} fits perfectly, stopping", round);
                estimators.push(tree);
                weights.push(1.0);
                break;
            }
            if estimator_error >= 0.5 {
                log::debug!(
                    "AdaBoost round {} error {:.4} >= 0.5, stopping",
                    round,
                    estimator_error
                );
                if estimators.is_empty() {
                    estimators.push(tree);
                    weights.push(1.0);
                }
                break;
            }

            let beta = estimator_error / (1.0 - estimator_error);
            weights.push(params.learning_rate * (1.0 / beta).ln());
            estimators.push(tree);

            if round + 1 < params.n_estimators {
                for (w, e) in sample_weight.iter_mut().zip(&error) {
                    *w *= beta.powf((1.0 - e) * params.learning_rate);
                }
                let total: f64 = sample_weight.iter().sum();
                if !(total > 0.0) {
                    break;
                }
                sample_weight.iter_mut().for_each(|w| *w /= total);
            }
        }

        log::debug!("Fitted AdaBoost with {} estimators", estimators.len());
        Ok(Self {
            estimators,
            weights,
            n_features: x.ncols(),
        })
    }

    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        let per_tree: Vec<Array1<f64>> = self.estimators.iter().map(|t| t.predict(x)).collect();
        let total: f64 = self.weights.iter().sum();
        let mut out = Array1::zeros(x.nrows());
        for (i, o) in out.iter_mut().enumerate() {
            let mut preds: Vec<(f64, f64)> = per_tree
                .iter()
                .zip(&self.weights)
                .map(|(p, &w)| (p[i], w))
                .collect();
            preds.sort_by(|a, b| a.0.total_cmp(&b.0));
            let mut cdf = 0.0;
            *o = preds
                .iter()
                .find(|(_, w)| {
                    cdf += w;
                    cdf >= 0.5 * total
                })
                .or(preds.last())
                .map_or(f64::NAN, |(p, _)| *p);
        }
        out
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_estimators(&self) -> usize {
        self.estimators.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_adaboost_learns_step() {
        let x = Array2::from_shape_fn((40, 2), |(i, j)| if j == 0 { i as f64 } else { (i % 3) as f64 });
        let y = Array1::from_shape_fn(40, |i| if i < 20 { -1.0 } else { 3.0 });
        let params = AdaBoostParams {
            seed: Some(11),
            ..AdaBoostParams::default()
        };
        let model = AdaBoost::fit(&params, x.view(), y.view()).unwrap();
        assert!(model.n_estimators() >= 1);
        let pred = model.predict(x.view());
        let mse = pred.iter().zip(y.iter()).map(|(p, t)| (p - t).powi(2)).sum::<f64>() / 40.0;
        assert!(mse < 0.5, "mse = {}", mse);
    }

    #[test]
    fn test_weighted_median() {
        let x = Array2::from_shape_fn((3, 1), |(i, _)| i as f64);
        let tree = |v: f64| Tree::from_nodes(vec![crate::models::tree::Node::Leaf { value: v }]);
        let model = AdaBoost {
            estimators: vec![tree(1.0), tree(10.0), tree(100.0)],
            weights: vec![0.2, 0.2, 0.7],
            n_features: 1,
        };
        assert_eq!(model.predict(x.view()).to_vec(), vec![100.0; 3]);
    }

    #[test]
    fn test_seeded_adaboost_is_deterministic() {
        let x = Array2::from_shape_fn((30, 2), |(i, j)| ((i * 7 + j * 3) % 11) as f64);
        let y = x.column(0).mapv(|v| v * v);
        let params = AdaBoostParams {
            n_estimators: 10,
            seed: Some(5),
            ..AdaBoostParams::default()
        };
        let a = AdaBoost::fit(&params, x.view(), y.view()).unwrap();
        let b = AdaBoost::fit(&params, x.view(), y.view()).unwrap();
        assert_eq!(a, b);
    }
}
