//! Least-squares CART regression tree, the base learner of the bagged and
//! boosted ensembles.

use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Feature values closer than this are treated as equal when splitting.
const FEATURE_THRESHOLD: f64 = 1e-7;

/// How the threshold of a candidate feature is chosen.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Splitter {
    /// Exhaustive search of the midpoints between sorted values.
    Best,
    /// One uniform draw between the node's minimum and maximum.
    Random,
}

#[derive(Debug, Clone)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features examined per node, already resolved against the input width.
    pub max_features: usize,
    pub splitter: Splitter,
}

impl TreeParams {
    /// A fully-featured best-split tree limited to `max_depth`.
    pub fn shallow(max_depth: usize, n_features: usize) -> Self {
        Self {
            max_depth: Some(max_depth),
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: n_features,
            splitter: Splitter::Best,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    proxy: f64,
}

struct Pending {
    node: usize,
    samples: Vec<usize>,
    depth: usize,
}

impl Tree {
    pub(crate) fn from_nodes(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Grow a tree on the rows listed in `samples`. Rows may repeat, which is
    /// how bootstrap samples are expressed.
    pub fn fit(
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
        samples: Vec<usize>,
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let mut nodes = vec![Node::Leaf { value: 0.0 }];
        let mut stack = vec![Pending {
            node: 0,
            samples,
            depth: 0,
        }];

        while let Some(Pending {
            node,
            samples,
            depth,
        }) = stack.pop()
        {
            let value = mean_of(y, &samples);
            let depth_left = params.max_depth.map_or(true, |d| depth < d);
            let splittable = depth_left
                && samples.len() >= params.min_samples_split.max(2)
                && samples.len() >= 2 * params.min_samples_leaf.max(1)
                && !is_pure(y, &samples, value);

            let split = if splittable {
                find_split(x, y, &samples, params, rng)
            } else {
                None
            };

            match split {
                Some(split) => {
                    let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
                        .iter()
                        .partition(|&&i| x[[i, split.feature]] <= split.threshold);
                    let left = nodes.len();
                    let right = left + 1;
                    nodes.push(Node::Leaf { value: 0.0 });
                    nodes.push(Node::Leaf { value: 0.0 });
                    nodes[node] = Node::Split {
                        feature: split.feature,
                        threshold: split.threshold,
                        left,
                        right,
                    };
                    stack.push(Pending {
                        node: right,
                        samples: right_samples,
                        depth: depth + 1,
                    });
                    stack.push(Pending {
                        node: left,
                        samples: left_samples,
                        depth: depth + 1,
                    });
                }
                None => nodes[node] = Node::Leaf { value },
            }
        }

        log::trace!("Grew regression tree with {} nodes", nodes.len());
        Self { nodes }
    }

    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        x.outer_iter().map(|row| self.predict_row(row)).collect()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match &nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }
}

fn mean_of(y: ArrayView1<'_, f64>, samples: &[usize]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|&i| y[i]).sum::<f64>() / samples.len() as f64
}

fn is_pure(y: ArrayView1<'_, f64>, samples: &[usize], mean: f64) -> bool {
    samples.iter().all(|&i| (y[i] - mean).abs() <= f64::EPSILON * mean.abs().max(1.0))
}

/// Draw `k` distinct feature indices, or all of them in order when `k` covers
/// the full width.
fn candidate_features(n_features: usize, k: usize, rng: &mut StdRng) -> Vec<usize> {
    if k >= n_features {
        (0..n_features).collect()
    } else {
        rand::seq::index::sample(rng, n_features, k).into_vec()
    }
}

fn find_split(
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
    samples: &[usize],
    params: &TreeParams,
    rng: &mut StdRng,
) -> Option<SplitCandidate> {
    let features = candidate_features(x.ncols(), params.max_features, rng);
    let mut best: Option<SplitCandidate> = None;
    for feature in features {
        let candidate = match params.splitter {
            Splitter::Best => best_threshold(x, y, samples, feature, params.min_samples_leaf),
            Splitter::Random => {
                random_threshold(x, y, samples, feature, params.min_samples_leaf, rng)
            }
        };
        if let Some(c) = candidate {
            if best.as_ref().map_or(true, |b| c.proxy > b.proxy) {
                best = Some(c);
            }
        }
    }
    best
}

/// Maximizes `sum_l^2 / n_l + sum_r^2 / n_r`, which is equivalent to
/// minimizing the weighted child variance.
fn best_threshold(
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
    samples: &[usize],
    feature: usize,
    min_leaf: usize,
) -> Option<SplitCandidate> {
    let mut pairs: Vec<(f64, f64)> = samples.iter().map(|&i| (x[[i, feature]], y[i])).collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    let n = pairs.len();
    let total: f64 = pairs.iter().map(|p| p.1).sum();
    let min_leaf = min_leaf.max(1);
    let mut left_sum = 0.0;
    let mut best: Option<SplitCandidate> = None;

    for i in 0..n - 1 {
        left_sum += pairs[i].1;
        let n_left = i + 1;
        let n_right = n - n_left;
        if pairs[i + 1].0 <= pairs[i].0 + FEATURE_THRESHOLD {
            continue;
        }
        if n_left < min_leaf || n_right < min_leaf {
            continue;
        }
        let right_sum = total - left_sum;
        let proxy = left_sum * left_sum / n_left as f64 + right_sum * right_sum / n_right as f64;
        if best.as_ref().map_or(true, |b| proxy > b.proxy) {
            let mut threshold = (pairs[i].0 + pairs[i + 1].0) / 2.0;
            if threshold >= pairs[i + 1].0 {
                threshold = pairs[i].0;
            }
            best = Some(SplitCandidate {
                feature,
                threshold,
                proxy,
            });
        }
    }
    best
}

fn random_threshold(
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
    samples: &[usize],
    feature: usize,
    min_leaf: usize,
    rng: &mut StdRng,
) -> Option<SplitCandidate> {
    let (lo, hi) = samples
        .iter()
        .map(|&i| x[[i, feature]])
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if hi <= lo + FEATURE_THRESHOLD {
        return None;
    }
    let threshold = rng.gen_range(lo..hi);

    let (mut n_left, mut left_sum, mut right_sum) = (0usize, 0.0, 0.0);
    for &i in samples {
        if x[[i, feature]] <= threshold {
            n_left += 1;
            left_sum += y[i];
        } else {
            right_sum += y[i];
        }
    }
    let n_right = samples.len() - n_left;
    let min_leaf = min_leaf.max(1);
    if n_left < min_leaf || n_right < min_leaf {
        return None;
    }
    let proxy = left_sum * left_sum / n_left as f64 + right_sum * right_sum / n_right as f64;
    Some(SplitCandidate {
        feature,
        threshold,
        proxy,
    })
}
