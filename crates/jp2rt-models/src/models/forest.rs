use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::ForestParams;
use crate::error::{ModelError, Result};
use crate::models::tree::{Splitter, Tree, TreeParams};

/// Averaging ensemble of regression trees.
///
/// Covers random forests (best splits on bootstrap samples), bagging and
/// extremely randomized trees (random thresholds on the full sample).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Forest {
    trees: Vec<Tree>,
    n_features: usize,
}

/// Master generator for a fit: seeded when a seed is configured.
pub(crate) fn master_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

impl Forest {
    pub fn fit(
        params: &ForestParams,
        splitter: Splitter,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
    ) -> Result<Self> {
        if params.n_estimators == 0 {
            return Err(ModelError::Fit("n_estimators must be positive".to_string()));
        }
        let n_samples = x.nrows();
        let tree_params = TreeParams {
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
            min_samples_leaf: params.min_samples_leaf,
            max_features: params.max_features.resolve(x.ncols()),
            splitter,
        };

        // One seed per tree, drawn up front so the result does not depend on
        // how rayon schedules the trees.
        let mut rng = master_rng(params.seed);
        let seeds: Vec<u64> = (0..params.n_estimators).map(|_| rng.gen()).collect();

        let trees: Vec<Tree> = seeds
            .into_par_iter()
            .map(|seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                let samples: Vec<usize> = if params.bootstrap {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };
                Tree::fit(x, y, samples, &tree_params, &mut rng)
            })
            .collect();

        log::debug!(
            "Fitted forest of {} trees ({:?} splitter, bootstrap = {})",
            trees.len(),
            splitter,
            params.bootstrap
        );
        Ok(Self {
            trees,
            n_features: x.ncols(),
        })
    }

    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        let per_tree: Vec<Array1<f64>> = self.trees.par_iter().map(|t| t.predict(x)).collect();
        // summed in tree order so repeated calls are bit-identical
        let mut out = Array1::zeros(x.nrows());
        for p in &per_tree {
            out += p;
        }
        out / self.trees.len() as f64
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}
