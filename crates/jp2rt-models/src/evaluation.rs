//! K-fold cross-validation of a pipeline spec.
//!
//! Each fold fits an independent pipeline on the remaining rows and predicts
//! the held-out ones, so every sample receives exactly one out-of-fold
//! prediction. The same partition feeds both the per-fold scores and the
//! residual statistics.

use ndarray::{ArrayView1, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::Serialize;

use crate::config::EvaluationConfig;
use crate::error::{ModelError, Result};
use crate::pipeline::{Pipeline, PipelineSpec};
use crate::report::table::outline_table;
use crate::stats::{mean_std, mquantiles, r2_score, rmse};

/// Plotting positions used for the residual quantiles.
const QUANTILE_ALPHAP: f64 = 0.4;
const QUANTILE_BETAP: f64 = 0.4;

/// Everything a diagnostics renderer gets to see.
#[derive(Debug, Clone, Copy)]
pub struct Diagnostics<'a> {
    pub y_true: &'a [f64],
    pub y_pred: &'a [f64],
    pub residuals: &'a [f64],
    /// Residual quantile band `(q0, q1)`.
    pub band: (f64, f64),
}

/// A rendered diagnostics figure.
#[derive(Debug, Clone)]
pub struct Figure {
    pub title: String,
    /// Self-contained HTML fragment (no `<html>` wrapper).
    pub html: String,
}

/// Turns evaluation results into a figure. Only consulted when a renderer
/// is passed to [`evaluate`].
pub trait DiagnosticsRenderer {
    fn render(&self, diagnostics: &Diagnostics<'_>) -> Result<Figure>;
}

/// Summary statistics over folds and residuals.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct SummaryMetrics {
    pub r2_mean: f64,
    pub r2_std: f64,
    pub rmse_mean: f64,
    pub rmse_std: f64,
    pub q0: f64,
    pub q1: f64,
}

impl SummaryMetrics {
    /// Metrics keyed the way they are printed.
    pub fn rows(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("r2 mean", self.r2_mean),
            ("r2 std", self.r2_std),
            ("rmse mean", self.rmse_mean),
            ("rmse std", self.rmse_std),
            ("q0", self.q0),
            ("q1", self.q1),
        ]
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.rows()
            .into_iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }
}

#[derive(Debug, Clone)]
pub struct EvaluationReport {
    pub config: EvaluationConfig,
    pub regressor: String,
    pub n_samples: usize,
    /// Per-fold R², in fold order.
    pub r2: Vec<f64>,
    /// Per-fold RMSE, in fold order.
    pub rmse: Vec<f64>,
    pub metrics: SummaryMetrics,
    /// Out-of-fold prediction of every sample, in input order.
    pub predictions: Vec<f64>,
    pub residuals: Vec<f64>,
    pub table: String,
    pub figure: Option<Figure>,
}

/// Row indices of each fold. Folds are contiguous blocks of the (optionally
/// shuffled) row order; the first `n % folds` folds hold one extra row.
pub fn kfold_indices(n_samples: usize, folds: usize, seed: Option<u64>) -> Vec<Vec<usize>> {
    let mut order: Vec<usize> = (0..n_samples).collect();
    if let Some(seed) = seed {
        order.shuffle(&mut StdRng::seed_from_u64(seed));
    }
    let base = n_samples / folds;
    let extra = n_samples % folds;
    let mut start = 0;
    (0..folds)
        .map(|k| {
            let size = base + usize::from(k < extra);
            let fold = order[start..start + size].to_vec();
            start += size;
            fold
        })
        .collect()
}

fn validate(config: &EvaluationConfig, n_samples: usize, n_targets: usize) -> Result<()> {
    if n_samples != n_targets {
        return Err(ModelError::InvalidArgument(format!(
            "{} feature rows but {} targets",
            n_samples, n_targets
        )));
    }
    if config.folds < 2 {
        return Err(ModelError::InvalidArgument(format!(
            "at least 2 folds are required, got {}",
            config.folds
        )));
    }
    if config.folds > n_samples {
        return Err(ModelError::InvalidArgument(format!(
            "cannot split {} samples into {} folds",
            n_samples, config.folds
        )));
    }
    if !(config.confidence > 0.5 && config.confidence < 1.0) {
        return Err(ModelError::InvalidArgument(format!(
            "confidence must lie in (0.5, 1), got {}",
            config.confidence
        )));
    }
    Ok(())
}

struct FoldResult {
    test: Vec<usize>,
    predictions: Vec<f64>,
    r2: f64,
    rmse: f64,
}

fn run_fold(
    spec: &PipelineSpec,
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
    folds: &[Vec<usize>],
    k: usize,
) -> Result<FoldResult> {
    let test = folds[k].clone();
    let train: Vec<usize> = folds
        .iter()
        .enumerate()
        .filter(|(j, _)| *j != k)
        .flat_map(|(_, f)| f.iter().copied())
        .collect();

    let x_train = x.select(Axis(0), &train);
    let y_train = y.select(Axis(0), &train);
    let x_test = x.select(Axis(0), &test);
    let y_test: Vec<f64> = test.iter().map(|&i| y[i]).collect();

    let pipeline = spec.fit(x_train.view(), y_train.view())?;
    let predictions = pipeline.predict(x_test.view())?.to_vec();
    let r2 = r2_score(&y_test, &predictions);
    let rmse = rmse(&y_test, &predictions);
    log::debug!(
        "Fold {}: {} train / {} test rows, r2 = {:.4}, rmse = {:.4}",
        k,
        train.len(),
        test.len(),
        r2,
        rmse
    );
    Ok(FoldResult {
        test,
        predictions,
        r2,
        rmse,
    })
}

/// Cross-validate `spec` on `x`/`y`.
pub fn evaluate(
    spec: &PipelineSpec,
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
    config: &EvaluationConfig,
    renderer: Option<&dyn DiagnosticsRenderer>,
) -> Result<EvaluationReport> {
    let n = x.nrows();
    validate(config, n, y.len())?;
    log::info!(
        "Evaluating {} with {}-fold cross validation on {} samples",
        spec.regressor.family(),
        config.folds,
        n
    );

    let folds = kfold_indices(n, config.folds, config.seed);
    let results: Vec<FoldResult> = (0..config.folds)
        .into_par_iter()
        .map(|k| run_fold(spec, x, y, &folds, k))
        .collect::<Result<Vec<_>>>()?;

    let mut predictions = vec![f64::NAN; n];
    for fold in &results {
        for (&i, &p) in fold.test.iter().zip(&fold.predictions) {
            predictions[i] = p;
        }
    }
    let residuals: Vec<f64> = y
        .iter()
        .zip(&predictions)
        .map(|(t, p)| t - p)
        .collect();

    let r2: Vec<f64> = results.iter().map(|f| f.r2).collect();
    let rmse: Vec<f64> = results.iter().map(|f| f.rmse).collect();
    let (r2_mean, r2_std) = mean_std(&r2);
    let (rmse_mean, rmse_std) = mean_std(&rmse);
    let band = mquantiles(
        &residuals,
        &[1.0 - config.confidence, config.confidence],
        QUANTILE_ALPHAP,
        QUANTILE_BETAP,
    );
    let metrics = SummaryMetrics {
        r2_mean,
        r2_std,
        rmse_mean,
        rmse_std,
        q0: band[0],
        q1: band[1],
    };

    let table = outline_table(
        &metrics
            .rows()
            .into_iter()
            .map(|(k, v)| (k.to_string(), format!("{:.4}", v)))
            .collect::<Vec<_>>(),
    );

    let figure = match renderer {
        Some(renderer) => {
            let y_true = y.to_vec();
            Some(renderer.render(&Diagnostics {
                y_true: &y_true,
                y_pred: &predictions,
                residuals: &residuals,
                band: (metrics.q0, metrics.q1),
            })?)
        }
        None => None,
    };

    log::info!(
        "Cross validation: r2 = {:.4} ± {:.4}, rmse = {:.4} ± {:.4}",
        r2_mean,
        r2_std,
        rmse_mean,
        rmse_std
    );

    Ok(EvaluationReport {
        config: config.clone(),
        regressor: spec.regressor.family().to_string(),
        n_samples: n,
        r2,
        rmse,
        metrics,
        predictions,
        residuals,
        table,
        figure,
    })
}

/// Cross-validate the configuration an already fitted pipeline was built
/// from. The pipeline itself is left untouched.
pub fn evaluate_model(
    pipeline: &Pipeline,
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
    config: &EvaluationConfig,
    renderer: Option<&dyn DiagnosticsRenderer>,
) -> Result<EvaluationReport> {
    evaluate(pipeline.spec(), x, y, config, renderer)
}
