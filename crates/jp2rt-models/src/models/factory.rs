use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::config::RegressorConfig;
use crate::error::Result;
use crate::models::adaboost::AdaBoost;
use crate::models::forest::Forest;
use crate::models::gradient_boosting::GradientBoosting;
use crate::models::hist_gradient_boosting::HistGradientBoosting;
use crate::models::regressor_trait::RegressorModel;
use crate::models::tree::Splitter;

/// A fitted ensemble regressor of any registered family.
#[derive(Serialize, Deserialize, Debug)]
pub enum Regressor {
    AdaBoost(AdaBoost),
    Bagging(Forest),
    ExtraTrees(Forest),
    GradientBoosting(GradientBoosting),
    HistGradientBoosting(HistGradientBoosting),
    RandomForest(Forest),
}

/// Fit the regressor described by `config` on `x`/`y`.
/// Inputs are expected to be validated (finite, matching row counts).
pub fn fit_regressor(
    config: &RegressorConfig,
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
) -> Result<Regressor> {
    let regressor = match config {
        RegressorConfig::AdaBoost(p) => Regressor::AdaBoost(AdaBoost::fit(p, x, y)?),
        RegressorConfig::Bagging(p) => Regressor::Bagging(Forest::fit(p, Splitter::Best, x, y)?),
        RegressorConfig::ExtraTrees(p) => {
            Regressor::ExtraTrees(Forest::fit(p, Splitter::Random, x, y)?)
        }
        RegressorConfig::GradientBoosting(p) => {
            Regressor::GradientBoosting(GradientBoosting::fit(p, x, y)?)
        }
        RegressorConfig::HistGradientBoosting(p) => {
            Regressor::HistGradientBoosting(HistGradientBoosting::fit(p, x, y)?)
        }
        RegressorConfig::RandomForest(p) => {
            Regressor::RandomForest(Forest::fit(p, Splitter::Best, x, y)?)
        }
    };
    Ok(regressor)
}

impl RegressorModel for Regressor {
    fn n_features(&self) -> usize {
        match self {
            Regressor::AdaBoost(m) => m.n_features(),
            Regressor::Bagging(m) | Regressor::ExtraTrees(m) | Regressor::RandomForest(m) => {
                m.n_features()
            }
            Regressor::GradientBoosting(m) => m.n_features(),
            Regressor::HistGradientBoosting(m) => m.n_features(),
        }
    }

    fn predict_unchecked(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        match self {
            Regressor::AdaBoost(m) => m.predict(x),
            Regressor::Bagging(m) | Regressor::ExtraTrees(m) | Regressor::RandomForest(m) => {
                m.predict(x)
            }
            Regressor::GradientBoosting(m) => m.predict(x),
            Regressor::HistGradientBoosting(m) => m.predict(x),
        }
    }

    fn name(&self) -> &str {
        match self {
            Regressor::AdaBoost(_) => "AdaBoost",
            Regressor::Bagging(_) => "Bagging",
            Regressor::ExtraTrees(_) => "ExtraTrees",
            Regressor::GradientBoosting(_) => "GradientBoosting",
            Regressor::HistGradientBoosting(_) => "HistGradientBoosting",
            Regressor::RandomForest(_) => "RandomForest",
        }
    }
}
