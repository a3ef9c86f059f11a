use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ModelError;

/// Number of features considered when looking for the best split of a node.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub enum MaxFeatures {
    All,
    Sqrt,
    Log2,
    Fraction(f64),
}

impl MaxFeatures {
    /// Resolve to a concrete count in `1..=n_features`.
    pub fn resolve(&self, n_features: usize) -> usize {
        let n = n_features as f64;
        let k = match self {
            MaxFeatures::All => n_features,
            MaxFeatures::Sqrt => n.sqrt() as usize,
            MaxFeatures::Log2 => n.log2() as usize,
            MaxFeatures::Fraction(f) => (f.clamp(0.0, 1.0) * n) as usize,
        };
        k.clamp(1, n_features.max(1))
    }
}

/// Hyper-parameters shared by the bagged tree ensembles
/// (RandomForest, ExtraTrees and Bagging).
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
    pub seed: Option<u64>,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
            bootstrap: true,
            seed: None,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdaBoostLoss {
    Linear,
    Square,
    Exponential,
}

/// AdaBoost.R2 hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AdaBoostParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub loss: AdaBoostLoss,
    pub seed: Option<u64>,
}

impl Default for AdaBoostParams {
    fn default() -> Self {
        Self {
            n_estimators: 50,
            learning_rate: 1.0,
            max_depth: 3,
            loss: AdaBoostLoss::Linear,
            seed: None,
        }
    }
}

/// Least-squares gradient boosting, trained by the `gbdt` crate.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GradientBoostingParams {
    pub n_estimators: usize,
    pub learning_rate: f32,
    pub max_depth: u32,
    pub min_samples_leaf: usize,
    /// Fraction of rows sampled per iteration. Values below 1.0 make
    /// training non-deterministic.
    pub subsample: f64,
}

impl Default for GradientBoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_leaf: 1,
            subsample: 1.0,
        }
    }
}

/// Histogram-based gradient boosting hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct HistGradientBoostingParams {
    pub max_iter: usize,
    pub learning_rate: f64,
    pub max_leaf_nodes: usize,
    pub max_depth: Option<usize>,
    pub min_samples_leaf: usize,
    pub l2_regularization: f64,
    pub max_bins: usize,
}

impl Default for HistGradientBoostingParams {
    fn default() -> Self {
        Self {
            max_iter: 100,
            learning_rate: 0.1,
            max_leaf_nodes: 31,
            max_depth: None,
            min_samples_leaf: 20,
            l2_regularization: 0.0,
            max_bins: 255,
        }
    }
}

/// An unfitted ensemble regressor: family plus hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum RegressorConfig {
    AdaBoost(AdaBoostParams),
    Bagging(ForestParams),
    ExtraTrees(ForestParams),
    GradientBoosting(GradientBoostingParams),
    HistGradientBoosting(HistGradientBoostingParams),
    RandomForest(ForestParams),
}

impl RegressorConfig {
    pub fn ada_boost() -> Self {
        RegressorConfig::AdaBoost(AdaBoostParams::default())
    }

    pub fn bagging() -> Self {
        RegressorConfig::Bagging(ForestParams {
            n_estimators: 10,
            ..ForestParams::default()
        })
    }

    pub fn extra_trees() -> Self {
        RegressorConfig::ExtraTrees(ForestParams {
            bootstrap: false,
            ..ForestParams::default()
        })
    }

    pub fn gradient_boosting() -> Self {
        RegressorConfig::GradientBoosting(GradientBoostingParams::default())
    }

    pub fn hist_gradient_boosting() -> Self {
        RegressorConfig::HistGradientBoosting(HistGradientBoostingParams::default())
    }

    pub fn random_forest() -> Self {
        RegressorConfig::RandomForest(ForestParams::default())
    }

    /// Family name as listed by the model registry.
    pub fn family(&self) -> &'static str {
        match self {
            RegressorConfig::AdaBoost(_) => "AdaBoost",
            RegressorConfig::Bagging(_) => "Bagging",
            RegressorConfig::ExtraTrees(_) => "ExtraTrees",
            RegressorConfig::GradientBoosting(_) => "GradientBoosting",
            RegressorConfig::HistGradientBoosting(_) => "HistGradientBoosting",
            RegressorConfig::RandomForest(_) => "RandomForest",
        }
    }

    /// Fix the random seed of randomized families. Deterministic families are
    /// returned unchanged.
    pub fn with_seed(mut self, seed: u64) -> Self {
        match &mut self {
            RegressorConfig::AdaBoost(p) => p.seed = Some(seed),
            RegressorConfig::Bagging(p)
            | RegressorConfig::ExtraTrees(p)
            | RegressorConfig::RandomForest(p) => p.seed = Some(seed),
            RegressorConfig::GradientBoosting(_) | RegressorConfig::HistGradientBoosting(_) => {}
        }
        self
    }
}

impl FromStr for RegressorConfig {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::registry::lookup(s)
    }
}

/// Cross-validation settings.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EvaluationConfig {
    pub folds: usize,
    pub confidence: f64,
    /// Shuffle rows with this seed before partitioning. `None` keeps the
    /// contiguous, unshuffled partition.
    pub seed: Option<u64>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            folds: 5,
            confidence: 0.95,
            seed: None,
        }
    }
}
