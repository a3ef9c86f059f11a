//! Histogram-based least-squares gradient boosting.
//!
//! Features are discretized once into at most `max_bins` bins. Every
//! iteration grows one tree leaf-wise (best gain first) from per-bin gradient
//! histograms, then adds the shrunken leaf values to the running prediction.
//! Bin edges are stored back as raw thresholds, so fitted trees predict on
//! unbinned data.

use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::config::HistGradientBoostingParams;
use crate::error::{ModelError, Result};
use crate::models::tree::{Node, Tree};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HistGradientBoosting {
    baseline: f64,
    trees: Vec<Tree>,
    n_features: usize,
}

/// Upper bin edges of one feature: value `v` falls in bin
/// `#{t in edges : t < v}`, hence `bin(v) <= b` iff `v <= edges[b]`.
fn bin_edges(column: ArrayView1<'_, f64>, max_bins: usize) -> Vec<f64> {
    let mut values: Vec<f64> = column.to_vec();
    values.sort_by(|a, b| a.total_cmp(b));
    let mut distinct = values.clone();
    distinct.dedup();

    if distinct.len() <= max_bins {
        return distinct.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect();
    }

    let n = values.len();
    let mut edges: Vec<f64> = (1..max_bins)
        .map(|k| {
            let pos = k as f64 / max_bins as f64 * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            (values[lo] + values[hi]) / 2.0
        })
        .collect();
    edges.dedup();
    edges
}

fn bin_of(edges: &[f64], v: f64) -> u8 {
    edges.partition_point(|&t| t < v) as u8
}

#[derive(Clone, Copy)]
struct BestSplit {
    gain: f64,
    feature: usize,
    bin: usize,
}

struct GrowingLeaf {
    node: usize,
    samples: Vec<usize>,
    grad_sum: f64,
    depth: usize,
    split: Option<BestSplit>,
}

struct Grower<'a> {
    binned: &'a [Vec<u8>],
    edges: &'a [Vec<f64>],
    gradients: &'a [f64],
    params: &'a HistGradientBoostingParams,
}

impl<'a> Grower<'a> {
    fn leaf(&self, node: usize, samples: Vec<usize>, depth: usize) -> GrowingLeaf {
        let grad_sum = samples.iter().map(|&i| self.gradients[i]).sum();
        let mut leaf = GrowingLeaf {
            node,
            samples,
            grad_sum,
            depth,
            split: None,
        };
        let depth_ok = self.params.max_depth.map_or(true, |d| depth < d);
        if depth_ok && leaf.samples.len() >= 2 * self.params.min_samples_leaf.max(1) {
            leaf.split = self.find_split(&leaf);
        }
        leaf
    }

    fn score(&self, g: f64, n: usize) -> f64 {
        g * g / (n as f64 + self.params.l2_regularization)
    }

    fn find_split(&self, leaf: &GrowingLeaf) -> Option<BestSplit> {
        let n = leaf.samples.len();
        let min_leaf = self.params.min_samples_leaf.max(1);
        let parent = self.score(leaf.grad_sum, n);
        let mut best: Option<BestSplit> = None;

        for (feature, bins) in self.binned.iter().enumerate() {
            let n_bins = self.edges[feature].len() + 1;
            if n_bins < 2 {
                continue;
            }
            let mut grad_hist = vec![0.0; n_bins];
            let mut count_hist = vec![0usize; n_bins];
            for &i in &leaf.samples {
                let b = bins[i] as usize;
                grad_hist[b] += self.gradients[i];
                count_hist[b] += 1;
            }

            let (mut g_left, mut n_left) = (0.0, 0usize);
            for b in 0..n_bins - 1 {
                g_left += grad_hist[b];
                n_left += count_hist[b];
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }
                let gain = self.score(g_left, n_left) + self.score(leaf.grad_sum - g_left, n_right)
                    - parent;
                if gain > 1e-12 && best.map_or(true, |s| gain > s.gain) {
                    best = Some(BestSplit { gain, feature, bin: b });
                }
            }
        }
        best
    }

    /// Grow one tree; returns it with the leaf value assigned to every row.
    fn grow(&self, n_samples: usize) -> (Tree, Vec<f64>) {
        let mut nodes = vec![Node::Leaf { value: 0.0 }];
        let mut leaves = vec![self.leaf(0, (0..n_samples).collect(), 0)];

        while leaves.len() < self.params.max_leaf_nodes.max(2) {
            let pick = leaves
                .iter()
                .enumerate()
                .filter_map(|(i, l)| l.split.map(|s| (i, s.gain)))
                .max_by(|a, b| a.1.total_cmp(&b.1));
            let Some((idx, _)) = pick else { break };

            let leaf = leaves.swap_remove(idx);
            let Some(split) = leaf.split else { break };
            let bins = &self.binned[split.feature];
            let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = leaf
                .samples
                .iter()
                .partition(|&&i| bins[i] as usize <= split.bin);

            let left = nodes.len();
            let right = left + 1;
            nodes.push(Node::Leaf { value: 0.0 });
            nodes.push(Node::Leaf { value: 0.0 });
            nodes[leaf.node] = Node::Split {
                feature: split.feature,
                threshold: self.edges[split.feature][split.bin],
                left,
                right,
            };
            leaves.push(self.leaf(left, left_samples, leaf.depth + 1));
            leaves.push(self.leaf(right, right_samples, leaf.depth + 1));
        }

        let mut update = vec![0.0; n_samples];
        for leaf in &leaves {
            let value = -self.params.learning_rate * leaf.grad_sum
                / (leaf.samples.len() as f64 + self.params.l2_regularization);
            nodes[leaf.node] = Node::Leaf { value };
            for &i in &leaf.samples {
                update[i] = value;
            }
        }
        (Tree::from_nodes(nodes), update)
    }
}

impl HistGradientBoosting {
    pub fn fit(
        params: &HistGradientBoostingParams,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
    ) -> Result<Self> {
        if params.max_iter == 0 {
            return Err(ModelError::Fit("max_iter must be positive".to_string()));
        }
        if !(2..=255).contains(&params.max_bins) {
            return Err(ModelError::Fit(format!(
                "max_bins must lie in 2..=255, got {}",
                params.max_bins
            )));
        }
        if params.l2_regularization < 0.0 {
            return Err(ModelError::Fit(
                "l2_regularization must be non-negative".to_string(),
            ));
        }

        let n = x.nrows();
        let edges: Vec<Vec<f64>> = x
            .columns()
            .into_iter()
            .map(|c| bin_edges(c, params.max_bins))
            .collect();
        let binned: Vec<Vec<u8>> = x
            .columns()
            .into_iter()
            .zip(&edges)
            .map(|(c, e)| c.iter().map(|&v| bin_of(e, v)).collect())
            .collect();

        let baseline = y.sum() / n as f64;
        let mut raw = vec![baseline; n];
        let mut gradients = vec![0.0; n];
        let mut trees = Vec::with_capacity(params.max_iter);

        for iteration in 0..params.max_iter {
            for ((g, r), t) in gradients.iter_mut().zip(&raw).zip(y.iter()) {
                *g = r - t;
            }
            let grower = Grower {
                binned: &binned,
                edges: &edges,
                gradients: &gradients,
                params,
            };
            let (tree, update) = grower.grow(n);
            log::trace!(
                "Iteration {}: tree with {} leaves",
                iteration,
                tree.n_leaves()
            );
            for (r, u) in raw.iter_mut().zip(&update) {
                *r += u;
            }
            trees.push(tree);
        }

        log::debug!("Fitted histogram gradient boosting with {} trees", trees.len());
        Ok(Self {
            baseline,
            trees,
            n_features: x.ncols(),
        })
    }

    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        let mut out = Array1::from_elem(x.nrows(), self.baseline);
        for tree in &self.trees {
            out += &tree.predict(x);
        }
        out
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }
}
