use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::config::RegressorConfig;
use crate::error::{ModelError, Result};
use crate::models::{fit_regressor, Regressor, RegressorModel};
use crate::preprocessing::{ColumnDrop, MeanImputer, StandardScaler, Transformer};
use crate::registry;

/// Unfitted description of a pipeline: the regressor to train behind the
/// fixed column-drop, imputation and scaling stages.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PipelineSpec {
    pub regressor: RegressorConfig,
}

impl PipelineSpec {
    pub fn new(regressor: RegressorConfig) -> Self {
        Self { regressor }
    }

    /// Spec with the default configuration of a listed family.
    pub fn from_name(name: &str) -> Result<Self> {
        Ok(Self::new(registry::lookup(name)?))
    }

    /// Fit every stage in order on `x` and `y`.
    pub fn fit(&self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<Pipeline> {
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(ModelError::Fit("no training data".to_string()));
        }
        if x.nrows() != y.len() {
            return Err(ModelError::Fit(format!(
                "{} feature rows but {} targets",
                x.nrows(),
                y.len()
            )));
        }
        if let Some(row) = y.iter().position(|v| !v.is_finite()) {
            return Err(ModelError::Fit(format!(
                "target value on row {} is not finite",
                row
            )));
        }

        let (drop, x) = ColumnDrop::fit_transform(x)?;
        let (imputer, x) = MeanImputer::fit_transform(x.view())?;
        let (scaler, x) = StandardScaler::fit_transform(x.view())?;
        let regressor = fit_regressor(&self.regressor, x.view(), y)?;

        Ok(Pipeline {
            spec: self.clone(),
            drop,
            imputer,
            scaler,
            regressor,
        })
    }
}

/// A fitted pipeline. Every stage is frozen; predicting replays them in
/// order and never refits anything.
#[derive(Serialize, Deserialize, Debug)]
pub struct Pipeline {
    spec: PipelineSpec,
    drop: ColumnDrop,
    imputer: MeanImputer,
    scaler: StandardScaler,
    regressor: Regressor,
}

impl Pipeline {
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        let x = self.drop.transform(x)?;
        let x = self.imputer.transform(x.view())?;
        let x = self.scaler.transform(x.view())?;
        self.regressor.predict(x.view())
    }

    /// Width of the matrices accepted by [`Pipeline::predict`].
    pub fn n_features_in(&self) -> usize {
        self.drop.n_features_in()
    }

    pub fn regressor_name(&self) -> &str {
        self.regressor.name()
    }

    /// The spec this pipeline was fitted from; fitting it again yields a
    /// fresh, independent pipeline.
    pub fn spec(&self) -> &PipelineSpec {
        &self.spec
    }

    /// Columns discarded at fit time because they held no observed value.
    pub fn dropped_columns(&self) -> &[usize] {
        self.drop.dropped()
    }
}

/// Train the named regressor family with its default configuration.
pub fn train(name: &str, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<Pipeline> {
    let spec = PipelineSpec::from_name(name)?;
    train_with_config(&spec, x, y)
}

pub fn train_with_config(
    spec: &PipelineSpec,
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
) -> Result<Pipeline> {
    log::info!(
        "Training {} on {} samples with {} descriptors",
        spec.regressor.family(),
        x.nrows(),
        x.ncols()
    );
    let pipeline = spec.fit(x, y)?;
    if !pipeline.dropped_columns().is_empty() {
        log::info!(
            "Ignoring {} descriptor columns without values",
            pipeline.dropped_columns().len()
        );
    }
    Ok(pipeline)
}
